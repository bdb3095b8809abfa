//! Scripted scan source for unit testing.
//!
//! Lets tests hand the controller exact event batches, including states a
//! real matrix never produces (held, idle, injected, pre-resolved keys).

use std::collections::VecDeque;

use keyforge_core::KeyEvent;

use super::ScanSource;

/// A [`ScanSource`] that replays queued per-cycle batches.
///
/// Each [`scan_matrix`](ScanSource::scan_matrix) call moves the next batch
/// into the drain queue.  Once the script runs out, scans are empty.
#[derive(Debug, Default, Clone)]
pub struct ScriptedScanner {
    cycles: VecDeque<Vec<KeyEvent>>,
    current: VecDeque<KeyEvent>,
    scans: usize,
}

impl ScriptedScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the events one future scan will report.
    pub fn push_cycle(&mut self, events: Vec<KeyEvent>) {
        self.cycles.push_back(events);
    }

    /// Number of times the matrix was scanned.
    pub fn scan_count(&self) -> usize {
        self.scans
    }

    /// Batches not yet scanned.
    pub fn remaining_cycles(&self) -> usize {
        self.cycles.len()
    }
}

impl ScanSource for ScriptedScanner {
    fn scan_matrix(&mut self) {
        self.scans += 1;
        self.current = self.cycles.pop_front().unwrap_or_default().into();
    }

    fn next_event(&mut self) -> Option<KeyEvent> {
        self.current.pop_front()
    }
}
