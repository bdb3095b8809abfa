//! Writes each report as one JSON object per line.
//!
//! ```text
//! {"seq":0,"modifiers":2,"keycodes":[4,0,0,0,0,0],"bytes":[2,0,4,0,0,0,0,0]}
//! ```

use std::io::Write;

use keyforge_core::KeyboardReport;
use serde::Serialize;

use crate::application::controller::{ReportTransmitter, TransmitError};

#[derive(Serialize)]
struct ReportLine<'a> {
    seq: u64,
    #[serde(flatten)]
    report: &'a KeyboardReport,
    bytes: [u8; 8],
}

/// A [`ReportTransmitter`] that serialises reports to a writer.
#[derive(Debug)]
pub struct JsonLinesTransmitter<W: Write> {
    writer: W,
    seq: u64,
}

impl<W: Write> JsonLinesTransmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, seq: 0 }
    }

    /// Number of reports written so far.
    pub fn sent(&self) -> u64 {
        self.seq
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportTransmitter for JsonLinesTransmitter<W> {
    fn send(&mut self, report: &KeyboardReport) -> Result<(), TransmitError> {
        let line = ReportLine {
            seq: self.seq,
            report,
            bytes: report.as_bytes(),
        };
        let mut buf =
            serde_json::to_vec(&line).map_err(|e| TransmitError::Encode(e.to_string()))?;
        buf.push(b'\n');
        self.writer.write_all(&buf)?;
        self.writer.flush()?;
        self.seq += 1;
        Ok(())
    }
}
