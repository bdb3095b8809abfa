//! Built-in plugins for the controller's handler table.

pub mod remap;

pub use remap::KeyRemap;
