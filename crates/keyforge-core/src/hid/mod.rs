//! HID keyboard-page vocabulary: usages, modifier bits and the report built
//! from the active-key table.

pub mod keycode;
pub mod modifiers;
pub mod report;

pub use keycode::HidKeyCode;
pub use modifiers::ModifierFlags;
pub use report::{KeyboardReport, REPORT_SLOTS};
