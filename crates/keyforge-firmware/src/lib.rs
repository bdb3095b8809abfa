//! keyforge-firmware library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`,
//! the benchmark and the `keyforge-sim` binary share the same module tree.

pub mod application;
pub mod infrastructure;
