//! Application layer: the event pipeline and its extension points.
//!
//! Nothing here touches hardware, files or the clock.  Collaborators are
//! traits injected into the [`Controller`](controller::Controller) at
//! construction.
//!
//! # Sub-modules
//!
//! - **`controller`** – Drives one scan cycle and takes every event through
//!   resolution, hooks, plugins, commit and the layer/report branch.  Runs on
//!   every key transition.
//!
//! - **`dispatch`** – The plugin fixed-point walk and its call bound.
//!
//! - **`plugin_mask`** – Per-event record of which plugins rewrote the key.
//!
//! - **`hooks`** – The plugin and global-hook traits.
//!
//! - **`plugins`** – Plugins shipped with the firmware.

pub mod controller;
pub mod dispatch;
pub mod hooks;
pub mod plugin_mask;
pub mod plugins;
