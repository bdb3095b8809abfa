//! Infrastructure layer for the firmware.
//!
//! Contains host-side adapters: scan sources, the layered keymap, report
//! transmitters, the clock and TOML configuration.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keyforge_core`.  The application layer only reaches in here for the
//! [`scan::ScanSource`] trait it drains.

pub mod clock;
pub mod keymap;
pub mod scan;
pub mod storage;
pub mod transmit;
