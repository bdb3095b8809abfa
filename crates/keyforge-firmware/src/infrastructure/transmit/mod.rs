//! Report transmitters.
//!
//! On hardware the report goes to the USB or BLE stack.  On the host it is
//! written out as JSON lines ([`json_lines::JsonLinesTransmitter`]) or kept
//! in memory for tests ([`mock::RecordingTransmitter`]).

pub mod json_lines;
pub mod mock;

pub use json_lines::JsonLinesTransmitter;
