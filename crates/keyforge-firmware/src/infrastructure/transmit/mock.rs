//! Recording transmitter for unit testing.

use keyforge_core::KeyboardReport;

use crate::application::controller::{ReportTransmitter, TransmitError};

/// A [`ReportTransmitter`] that keeps every report in memory.
///
/// Tests can switch it into a failing mode to exercise error paths.
#[derive(Debug, Default, Clone)]
pub struct RecordingTransmitter {
    reports: Vec<KeyboardReport>,
    failing: bool,
}

impl RecordingTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports sent so far, oldest first.
    pub fn reports(&self) -> &[KeyboardReport] {
        &self.reports
    }

    pub fn last(&self) -> Option<&KeyboardReport> {
        self.reports.last()
    }

    /// While `true`, every send fails and nothing is recorded.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn clear(&mut self) {
        self.reports.clear();
    }
}

impl ReportTransmitter for RecordingTransmitter {
    fn send(&mut self, report: &KeyboardReport) -> Result<(), TransmitError> {
        if self.failing {
            return Err(TransmitError::Rejected("recording transmitter set to fail".into()));
        }
        self.reports.push(*report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_transmitter_keeps_reports_in_order() {
        // Arrange
        let mut tx = RecordingTransmitter::new();
        let mut second = KeyboardReport::new();
        second.set_modifiers(keyforge_core::ModifierFlags::LEFT_CTRL);

        // Act
        tx.send(&KeyboardReport::new()).unwrap();
        tx.send(&second).unwrap();

        // Assert
        assert_eq!(tx.reports().len(), 2);
        assert_eq!(tx.last(), Some(&second));
    }

    #[test]
    fn test_failing_mode_records_nothing() {
        let mut tx = RecordingTransmitter::new();
        tx.set_failing(true);

        assert!(matches!(
            tx.send(&KeyboardReport::new()),
            Err(TransmitError::Rejected(_))
        ));
        assert!(tx.reports().is_empty());
    }
}
