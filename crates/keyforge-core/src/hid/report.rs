//! Boot-protocol keyboard report.
//!
//! The report is rebuilt from scratch every time one is sent: the controller
//! clears it, adds every entry of the active-key table constrained by the
//! current allowed-modifier mask, and hands it to the transmitter.  Nothing in
//! a report survives to the next one.
//!
//! Layout (8 bytes): modifier byte, reserved byte, six keycode slots.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{keycode::HidKeyCode, modifiers::ModifierFlags};
use crate::domain::{active_keys::ActiveKeys, key::Key};

/// Number of keycode slots in a boot-protocol report.
pub const REPORT_SLOTS: usize = 6;

/// One HID keyboard report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyboardReport {
    modifiers: ModifierFlags,
    keycodes: [u8; REPORT_SLOTS],
}

impl KeyboardReport {
    /// An empty report: no modifiers, every slot zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a report from every entry of `active_keys`.
    pub fn from_active_keys(active_keys: &ActiveKeys, allowed: ModifierFlags) -> Self {
        let mut report = Self::new();
        for key in active_keys.keys() {
            report.add(key, allowed);
        }
        report
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Adds `key` to the report.
    ///
    /// Only keyboard keys contribute.  Modifier bits, both a modifier usage's
    /// own bit and any flags a key declares, are ANDed with `allowed` first.
    pub fn add(&mut self, key: Key, allowed: ModifierFlags) {
        let Key::Keyboard(kb) = key else {
            return;
        };
        self.modifiers |= (kb.keycode().modifier_flag() | kb.modifier_flags()) & allowed;
        if !kb.is_modifier() {
            self.press(kb.keycode());
        }
    }

    /// Places `code` in the first free slot.
    fn press(&mut self, code: HidKeyCode) {
        let raw = code.as_u8();
        if code == HidKeyCode::None || self.is_rolled_over() || self.keycodes.contains(&raw) {
            return;
        }
        match self.keycodes.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => *slot = raw,
            None => {
                trace!("keyboard report overflow, reporting rollover");
                self.keycodes = [HidKeyCode::ErrorRollOver.as_u8(); REPORT_SLOTS];
            }
        }
    }

    pub fn modifiers(&self) -> ModifierFlags {
        self.modifiers
    }

    /// Replaces the modifier byte.  Pre-report hooks use this.
    pub fn set_modifiers(&mut self, modifiers: ModifierFlags) {
        self.modifiers = modifiers;
    }

    /// Non-empty keycode slots, in slot order.
    pub fn keycodes(&self) -> impl Iterator<Item = HidKeyCode> + '_ {
        self.keycodes
            .iter()
            .filter(|&&raw| raw != 0)
            .map(|&raw| HidKeyCode::from_u8(raw))
    }

    pub fn contains(&self, code: HidKeyCode) -> bool {
        code != HidKeyCode::None && self.keycodes.contains(&code.as_u8())
    }

    /// `true` once more keys were added than the report has slots.
    pub fn is_rolled_over(&self) -> bool {
        self.keycodes[0] == HidKeyCode::ErrorRollOver.as_u8()
    }

    /// `true` if no modifier and no keycode is reported.
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty() && self.keycodes.iter().all(|&raw| raw == 0)
    }

    /// The 8-byte wire form.
    pub fn as_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[0] = self.modifiers.0;
        bytes[2..].copy_from_slice(&self.keycodes);
        bytes
    }
}
