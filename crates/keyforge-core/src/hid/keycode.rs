//! USB HID Usage IDs for the Keyboard/Keypad page (0x07).
//!
//! Every [`KeyboardKey`](crate::KeyboardKey) carries one of these codes.  The
//! numeric value of a variant is the byte that lands in a keycode slot of the
//! boot-protocol keyboard report, so `as_u8` is all the report builder needs.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! # Modifier usages
//!
//! Usages 0xE0–0xE7 are the eight modifier keys.  They never occupy a keycode
//! slot in a report; instead each one maps onto a single bit of the report's
//! modifier byte (see [`HidKeyCode::modifier_flag`]).
//!
//! # The `None` sentinel
//!
//! Usage 0x00 means "no event" and is what an empty keycode slot contains.
//! [`HidKeyCode::None`] is also returned by [`HidKeyCode::from_u8`] for any
//! value that has no variant here.

use serde::{Deserialize, Serialize};

use super::modifiers::ModifierFlags;

/// USB HID Usage ID for keyboard keys (page 0x07).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum HidKeyCode {
    /// Empty slot / unmapped usage.
    None = 0x00,
    /// Reported in every slot when more keys are held than the report can carry.
    ErrorRollOver = 0x01,

    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control and punctuation (HID 0x28–0x38)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,

    // Function row (HID 0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation cluster (HID 0x46–0x52)
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    // Modifiers (HID 0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,
}

/// Every variant in usage order, used by [`HidKeyCode::from_u8`].
const ALL_CODES: &[HidKeyCode] = &[
    HidKeyCode::None,
    HidKeyCode::ErrorRollOver,
    HidKeyCode::KeyA,
    HidKeyCode::KeyB,
    HidKeyCode::KeyC,
    HidKeyCode::KeyD,
    HidKeyCode::KeyE,
    HidKeyCode::KeyF,
    HidKeyCode::KeyG,
    HidKeyCode::KeyH,
    HidKeyCode::KeyI,
    HidKeyCode::KeyJ,
    HidKeyCode::KeyK,
    HidKeyCode::KeyL,
    HidKeyCode::KeyM,
    HidKeyCode::KeyN,
    HidKeyCode::KeyO,
    HidKeyCode::KeyP,
    HidKeyCode::KeyQ,
    HidKeyCode::KeyR,
    HidKeyCode::KeyS,
    HidKeyCode::KeyT,
    HidKeyCode::KeyU,
    HidKeyCode::KeyV,
    HidKeyCode::KeyW,
    HidKeyCode::KeyX,
    HidKeyCode::KeyY,
    HidKeyCode::KeyZ,
    HidKeyCode::Digit1,
    HidKeyCode::Digit2,
    HidKeyCode::Digit3,
    HidKeyCode::Digit4,
    HidKeyCode::Digit5,
    HidKeyCode::Digit6,
    HidKeyCode::Digit7,
    HidKeyCode::Digit8,
    HidKeyCode::Digit9,
    HidKeyCode::Digit0,
    HidKeyCode::Enter,
    HidKeyCode::Escape,
    HidKeyCode::Backspace,
    HidKeyCode::Tab,
    HidKeyCode::Space,
    HidKeyCode::Minus,
    HidKeyCode::Equal,
    HidKeyCode::BracketLeft,
    HidKeyCode::BracketRight,
    HidKeyCode::Backslash,
    HidKeyCode::Semicolon,
    HidKeyCode::Quote,
    HidKeyCode::Backquote,
    HidKeyCode::Comma,
    HidKeyCode::Period,
    HidKeyCode::Slash,
    HidKeyCode::CapsLock,
    HidKeyCode::F1,
    HidKeyCode::F2,
    HidKeyCode::F3,
    HidKeyCode::F4,
    HidKeyCode::F5,
    HidKeyCode::F6,
    HidKeyCode::F7,
    HidKeyCode::F8,
    HidKeyCode::F9,
    HidKeyCode::F10,
    HidKeyCode::F11,
    HidKeyCode::F12,
    HidKeyCode::PrintScreen,
    HidKeyCode::ScrollLock,
    HidKeyCode::Pause,
    HidKeyCode::Insert,
    HidKeyCode::Home,
    HidKeyCode::PageUp,
    HidKeyCode::Delete,
    HidKeyCode::End,
    HidKeyCode::PageDown,
    HidKeyCode::ArrowRight,
    HidKeyCode::ArrowLeft,
    HidKeyCode::ArrowDown,
    HidKeyCode::ArrowUp,
    HidKeyCode::ControlLeft,
    HidKeyCode::ShiftLeft,
    HidKeyCode::AltLeft,
    HidKeyCode::MetaLeft,
    HidKeyCode::ControlRight,
    HidKeyCode::ShiftRight,
    HidKeyCode::AltRight,
    HidKeyCode::MetaRight,
];

impl HidKeyCode {
    /// Converts a raw usage byte to a [`HidKeyCode`].
    ///
    /// Returns [`HidKeyCode::None`] if the value has no variant.
    pub fn from_u8(value: u8) -> Self {
        ALL_CODES
            .binary_search_by_key(&value, |code| code.as_u8())
            .map(|idx| ALL_CODES[idx])
            .unwrap_or(Self::None)
    }

    /// Returns the raw usage byte for this key code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the eight modifier usages (0xE0–0xE7).
    pub fn is_modifier(self) -> bool {
        (0xE0..=0xE7).contains(&self.as_u8())
    }

    /// Returns the modifier-byte bit for a modifier usage, or
    /// [`ModifierFlags::NONE`] for every other usage.
    ///
    /// The HID boot report orders the modifier byte exactly like the usages,
    /// so usage `0xE0 + n` is bit `n`.
    pub fn modifier_flag(self) -> ModifierFlags {
        if self.is_modifier() {
            ModifierFlags(1 << (self.as_u8() - 0xE0))
        } else {
            ModifierFlags::NONE
        }
    }

    /// Looks a key code up by its keymap name (case-insensitive).
    ///
    /// Letters and digits use their bare character (`"A"`, `"7"`); everything
    /// else uses a short upper-case name such as `"ENTER"` or `"LSHIFT"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        let bytes = upper.as_bytes();
        if bytes.len() == 1 {
            let c = bytes[0];
            return match c {
                b'A'..=b'Z' => Some(Self::from_u8(Self::KeyA.as_u8() + (c - b'A'))),
                b'1'..=b'9' => Some(Self::from_u8(Self::Digit1.as_u8() + (c - b'1'))),
                b'0' => Some(Self::Digit0),
                b'-' => Some(Self::Minus),
                b'=' => Some(Self::Equal),
                b'[' => Some(Self::BracketLeft),
                b']' => Some(Self::BracketRight),
                b'\\' => Some(Self::Backslash),
                b';' => Some(Self::Semicolon),
                b'\'' => Some(Self::Quote),
                b'`' => Some(Self::Backquote),
                b',' => Some(Self::Comma),
                b'.' => Some(Self::Period),
                b'/' => Some(Self::Slash),
                _ => None,
            };
        }
        if let Some(n) = upper.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
            return (1..=12)
                .contains(&n)
                .then(|| Self::from_u8(Self::F1.as_u8() + n - 1));
        }
        let code = match upper.as_str() {
            "ENTER" => Self::Enter,
            "ESC" | "ESCAPE" => Self::Escape,
            "BSPC" | "BACKSPACE" => Self::Backspace,
            "TAB" => Self::Tab,
            "SPC" | "SPACE" => Self::Space,
            "CAPS" | "CAPSLOCK" => Self::CapsLock,
            "PSCR" | "PRINTSCREEN" => Self::PrintScreen,
            "SCROLLLOCK" => Self::ScrollLock,
            "PAUSE" => Self::Pause,
            "INS" | "INSERT" => Self::Insert,
            "HOME" => Self::Home,
            "PGUP" | "PAGEUP" => Self::PageUp,
            "DEL" | "DELETE" => Self::Delete,
            "END" => Self::End,
            "PGDN" | "PAGEDOWN" => Self::PageDown,
            "RIGHT" => Self::ArrowRight,
            "LEFT" => Self::ArrowLeft,
            "DOWN" => Self::ArrowDown,
            "UP" => Self::ArrowUp,
            "LCTRL" => Self::ControlLeft,
            "LSHIFT" => Self::ShiftLeft,
            "LALT" => Self::AltLeft,
            "LGUI" => Self::MetaLeft,
            "RCTRL" => Self::ControlRight,
            "RSHIFT" => Self::ShiftRight,
            "RALT" => Self::AltRight,
            "RGUI" => Self::MetaRight,
            _ => return None,
        };
        Some(code)
    }
}
