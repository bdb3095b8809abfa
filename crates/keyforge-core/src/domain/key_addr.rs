//! Physical switch addresses.

use std::fmt;

/// Stable index of one physical keyswitch, in `[0, total_keys)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyAddr(pub u16);

impl KeyAddr {
    /// The address as an array index.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl From<u16> for KeyAddr {
    fn from(index: u16) -> Self {
        Self(index)
    }
}

impl fmt::Display for KeyAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
