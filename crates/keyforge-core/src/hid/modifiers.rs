//! The modifier byte of a HID keyboard report.

use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Modifier bit set in USB HID boot-report order.
///
/// Used both as the modifier byte of a [`KeyboardReport`](super::KeyboardReport)
/// and as the set of modifiers a [`KeyboardKey`](crate::KeyboardKey) declares
/// (e.g. `!` is `Digit1` with [`ModifierFlags::LEFT_SHIFT`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierFlags(pub u8);

impl ModifierFlags {
    pub const NONE: Self = Self(0);
    pub const LEFT_CTRL: Self = Self(1 << 0);
    pub const LEFT_SHIFT: Self = Self(1 << 1);
    pub const LEFT_ALT: Self = Self(1 << 2);
    pub const LEFT_GUI: Self = Self(1 << 3);
    pub const RIGHT_CTRL: Self = Self(1 << 4);
    pub const RIGHT_SHIFT: Self = Self(1 << 5);
    pub const RIGHT_ALT: Self = Self(1 << 6);
    pub const RIGHT_GUI: Self = Self(1 << 7);
    /// Every modifier permitted.
    pub const ALL: Self = Self(0xFF);

    /// Returns `true` if no bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is also set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if either Shift modifier is set.
    pub fn shift(self) -> bool {
        self.0 & (Self::LEFT_SHIFT.0 | Self::RIGHT_SHIFT.0) != 0
    }

    /// Returns `true` if either Ctrl modifier is set.
    pub fn ctrl(self) -> bool {
        self.0 & (Self::LEFT_CTRL.0 | Self::RIGHT_CTRL.0) != 0
    }
}

impl BitOr for ModifierFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ModifierFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ModifierFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}
