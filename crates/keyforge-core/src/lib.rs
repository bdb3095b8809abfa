//! # keyforge-core
//!
//! Shared value types for the keyforge key-event pipeline.
//!
//! This crate has no I/O and no knowledge of plugins or transports.  It is
//! used by `keyforge-firmware`, which owns the controller that moves events
//! through the pipeline, and by anything that wants to describe keys or
//! inspect reports (tests, simulators, keymap tooling).
//!
//! - **`domain`** – keys, switch addresses and states, events and the
//!   active-key table.
//! - **`hid`** – HID keyboard usages, modifier bits and the 8-byte
//!   boot-protocol keyboard report.

pub mod domain;
pub mod hid;

pub use domain::active_keys::ActiveKeys;
pub use domain::key::{Key, KeyParseError, KeyboardKey, LayerId, LayerKey};
pub use domain::key_addr::KeyAddr;
pub use domain::key_event::KeyEvent;
pub use domain::key_state::{KeyState, Transition};
pub use hid::{HidKeyCode, KeyboardReport, ModifierFlags};
