//! Logical key values.
//!
//! A [`Key`] is what a physical switch *means* at the moment it is pressed:
//! a HID keyboard usage, a layer control, or one of the sentinels the
//! controller uses for bookkeeping.  Keys are resolved from the keymap on
//! press, rewritten by plugins, and stored in the
//! [`ActiveKeys`](super::active_keys::ActiveKeys) table while held.

use std::str::FromStr;

use thiserror::Error;

use crate::hid::{HidKeyCode, ModifierFlags};

/// Error returned when a key name cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("unknown key name: {0:?}")]
    UnknownName(String),
    #[error("invalid layer number in {0:?}")]
    InvalidLayer(String),
    #[error("modifier wrapper {0:?} must wrap a keyboard key")]
    NotAKeyboardKey(String),
}

/// A layer index in the keymap's layer stack.
pub type LayerId = u8;

/// A key that changes which keymap layers are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKey {
    /// Layer is active while the key is held.
    Shift(LayerId),
    /// Layer toggles each time the key is pressed.
    Lock(LayerId),
}

impl LayerKey {
    /// The layer this key controls.
    pub fn layer(self) -> LayerId {
        match self {
            Self::Shift(layer) | Self::Lock(layer) => layer,
        }
    }
}

/// A HID keyboard usage plus the modifiers it requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyboardKey {
    keycode: HidKeyCode,
    modifiers: ModifierFlags,
}

impl KeyboardKey {
    pub const fn new(keycode: HidKeyCode) -> Self {
        Self {
            keycode,
            modifiers: ModifierFlags::NONE,
        }
    }

    /// Same usage, additionally requiring `modifiers` when sent.
    pub const fn with_modifiers(self, modifiers: ModifierFlags) -> Self {
        Self {
            keycode: self.keycode,
            modifiers: ModifierFlags(self.modifiers.0 | modifiers.0),
        }
    }

    pub fn keycode(self) -> HidKeyCode {
        self.keycode
    }

    /// Modifiers this key declares it needs (not counting itself).
    pub fn modifier_flags(self) -> ModifierFlags {
        self.modifiers
    }

    /// Returns `true` if the usage itself is a modifier key.
    pub fn is_modifier(self) -> bool {
        self.keycode.is_modifier()
    }
}

impl From<HidKeyCode> for KeyboardKey {
    fn from(keycode: HidKeyCode) -> Self {
        Self::new(keycode)
    }
}

/// A logical key value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Key {
    /// No key: an idle table entry, an unresolved event, or a keymap hole.
    #[default]
    Blank,
    /// Falls through to the next lower active layer during keymap lookup.
    Transparent,
    /// The switch is owned by a plugin; every event from it is discarded
    /// until it is released.
    Masked,
    Keyboard(KeyboardKey),
    Layer(LayerKey),
}

impl Key {
    /// Returns `true` for [`Key::Blank`].
    pub fn is_empty(self) -> bool {
        matches!(self, Self::Blank)
    }

    pub fn is_transparent(self) -> bool {
        matches!(self, Self::Transparent)
    }

    pub fn is_masked(self) -> bool {
        matches!(self, Self::Masked)
    }

    pub fn as_keyboard(self) -> Option<KeyboardKey> {
        match self {
            Self::Keyboard(key) => Some(key),
            _ => None,
        }
    }

    pub fn as_layer(self) -> Option<LayerKey> {
        match self {
            Self::Layer(key) => Some(key),
            _ => None,
        }
    }
}

impl From<HidKeyCode> for Key {
    fn from(keycode: HidKeyCode) -> Self {
        Self::Keyboard(KeyboardKey::new(keycode))
    }
}

impl From<KeyboardKey> for Key {
    fn from(key: KeyboardKey) -> Self {
        Self::Keyboard(key)
    }
}

impl From<LayerKey> for Key {
    fn from(key: LayerKey) -> Self {
        Self::Layer(key)
    }
}

/// Splits `NAME(inner)` into `("NAME", "inner")`.
fn split_call(s: &str) -> Option<(&str, &str)> {
    let open = s.find('(')?;
    let inner = s[open + 1..].strip_suffix(')')?;
    Some((&s[..open], inner))
}

/// Parses keymap notation.
///
/// | Text            | Key                                   |
/// |-----------------|---------------------------------------|
/// | `XXX`           | [`Key::Blank`]                        |
/// | `___`           | [`Key::Transparent`]                  |
/// | `A`, `ENTER`    | keyboard usage (see [`HidKeyCode::from_name`]) |
/// | `S(1)`          | `1` requiring Left Shift (`C`, `A`, `G` for Ctrl, Alt, Gui) |
/// | `SHIFT(2)`      | [`LayerKey::Shift`]                   |
/// | `LOCK(2)`       | [`LayerKey::Lock`]                    |
impl FromStr for Key {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "XXX" => return Ok(Self::Blank),
            "___" => return Ok(Self::Transparent),
            _ => {}
        }

        if let Some((name, inner)) = split_call(s) {
            let upper = name.to_ascii_uppercase();
            let layer = || {
                inner
                    .trim()
                    .parse::<LayerId>()
                    .map_err(|_| KeyParseError::InvalidLayer(s.to_string()))
            };
            let modifier = match upper.as_str() {
                "SHIFT" => return Ok(Self::Layer(LayerKey::Shift(layer()?))),
                "LOCK" => return Ok(Self::Layer(LayerKey::Lock(layer()?))),
                "S" => ModifierFlags::LEFT_SHIFT,
                "C" => ModifierFlags::LEFT_CTRL,
                "A" => ModifierFlags::LEFT_ALT,
                "G" => ModifierFlags::LEFT_GUI,
                _ => return Err(KeyParseError::UnknownName(s.to_string())),
            };
            return match inner.parse::<Key>()? {
                Self::Keyboard(key) => Ok(Self::Keyboard(key.with_modifiers(modifier))),
                _ => Err(KeyParseError::NotAKeyboardKey(s.to_string())),
            };
        }

        HidKeyCode::from_name(s)
            .map(Self::from)
            .ok_or_else(|| KeyParseError::UnknownName(s.to_string()))
    }
}
