//! Snapshot-diffing scan source.

use std::collections::VecDeque;

use keyforge_core::{KeyAddr, KeyEvent, KeyState};
use tracing::trace;

use super::{ScanError, ScanSource};

/// Turns "which switches are down now" into per-cycle transitions.
///
/// Callers flip switches with [`press`](Self::press) and
/// [`release`](Self::release) between scans.  Each scan compares the live
/// state with the state at the previous scan and queues one event per
/// changed switch, in address order.  Switches that stayed down produce
/// nothing.
#[derive(Debug, Clone)]
pub struct SnapshotScanner {
    previous: Vec<bool>,
    live: Vec<bool>,
    pending: VecDeque<KeyEvent>,
}

impl SnapshotScanner {
    pub fn new(total_keys: u16) -> Self {
        let total = usize::from(total_keys);
        Self {
            previous: vec![false; total],
            live: vec![false; total],
            pending: VecDeque::new(),
        }
    }

    pub fn press(&mut self, addr: KeyAddr) -> Result<(), ScanError> {
        self.set(addr, true)
    }

    pub fn release(&mut self, addr: KeyAddr) -> Result<(), ScanError> {
        self.set(addr, false)
    }

    /// Returns `true` if `addr` is down in the live state.
    pub fn is_pressed(&self, addr: KeyAddr) -> bool {
        self.live.get(addr.index()).copied().unwrap_or(false)
    }

    fn set(&mut self, addr: KeyAddr, pressed: bool) -> Result<(), ScanError> {
        let total = self.live.len();
        let slot = self
            .live
            .get_mut(addr.index())
            .ok_or(ScanError::AddressOutOfRange {
                addr,
                total: total as u16,
            })?;
        *slot = pressed;
        Ok(())
    }
}

impl ScanSource for SnapshotScanner {
    fn scan_matrix(&mut self) {
        self.pending.clear();
        for (idx, (&was, &is)) in self.previous.iter().zip(&self.live).enumerate() {
            let state = KeyState::from_samples(was, is);
            if state.toggled_on() || state.toggled_off() {
                self.pending.push_back(KeyEvent::new(KeyAddr(idx as u16), state));
            }
        }
        self.previous.copy_from_slice(&self.live);
        if !self.pending.is_empty() {
            trace!("scan found {} transition(s)", self.pending.len());
        }
    }

    fn next_event(&mut self) -> Option<KeyEvent> {
        self.pending.pop_front()
    }
}
