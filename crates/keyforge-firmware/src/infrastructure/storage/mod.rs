//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML file that describes the board
//! (switch count, keymap layers, remap table) and the simulation script the
//! host binary replays.  A missing file yields the built-in defaults.

pub mod config;
