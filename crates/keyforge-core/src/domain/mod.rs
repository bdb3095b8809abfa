//! Domain entities of the key-event pipeline.
//!
//! Nothing in here performs I/O or knows about plugins, keymaps or
//! transports.  These are the values that flow between them:
//!
//! - **`key`** – logical key values ([`Key`](key::Key)) and the keyboard and
//!   layer payloads they carry.
//! - **`key_addr`** – the stable index of a physical switch.
//! - **`key_state`** – what a switch did this scan cycle.
//! - **`key_event`** – address + state + key, the unit of work.
//! - **`active_keys`** – the per-address table of what is logically pressed.

pub mod active_keys;
pub mod key;
pub mod key_addr;
pub mod key_event;
pub mod key_state;
