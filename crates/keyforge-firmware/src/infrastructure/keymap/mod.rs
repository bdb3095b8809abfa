//! Keymap storage.
//!
//! The controller only needs the [`Keymap`](crate::application::controller::Keymap)
//! trait; this module provides the host-side layered implementation built
//! from configuration.

pub mod layered;

pub use layered::{KeymapError, LayeredKeymap};
