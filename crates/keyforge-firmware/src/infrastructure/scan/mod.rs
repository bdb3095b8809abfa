//! Scan sources: where keyswitch transitions come from.
//!
//! Real firmware reads a debounced switch matrix.  On the host the same role
//! is played by [`snapshot::SnapshotScanner`], which diffs pressed-address
//! snapshots, and by [`mock::ScriptedScanner`] in tests.
//!
//! # Contract
//!
//! [`ScanSource::scan_matrix`] is called once per cycle; the controller then
//! drains [`ScanSource::next_event`] until it returns `None`.  Each physical
//! press yields exactly one `ToggledOn` and each release one `ToggledOff`.

use keyforge_core::{KeyAddr, KeyEvent};

pub mod mock;
pub mod snapshot;

pub use snapshot::SnapshotScanner;

/// Error type for scan sources.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("switch {addr} is outside the matrix of {total} keys")]
    AddressOutOfRange { addr: KeyAddr, total: u16 },
}

/// Trait abstracting the switch matrix.
pub trait ScanSource {
    /// Samples the switches and queues this cycle's events.
    fn scan_matrix(&mut self);

    /// Next queued event, in scan order.
    fn next_event(&mut self) -> Option<KeyEvent>;
}
