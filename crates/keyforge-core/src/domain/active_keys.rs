//! The table of logically pressed keys.

use std::ops::{Index, IndexMut};

use super::{key::Key, key_addr::KeyAddr};

/// One [`Key`] per physical address: what each switch currently means.
///
/// An entry holds the key committed when its switch last toggled on, until
/// that switch toggles off.  Idle entries are [`Key::Blank`].  The table is
/// owned by the controller; everything else sees it read-only, except the
/// keymap's layer-change handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveKeys {
    keys: Vec<Key>,
}

impl ActiveKeys {
    /// A table for `total_keys` switches, all blank.
    pub fn new(total_keys: u16) -> Self {
        Self {
            keys: vec![Key::Blank; usize::from(total_keys)],
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns `true` if `addr` indexes into this table.
    pub fn contains(&self, addr: KeyAddr) -> bool {
        addr.index() < self.keys.len()
    }

    pub fn get(&self, addr: KeyAddr) -> Option<Key> {
        self.keys.get(addr.index()).copied()
    }

    /// Resets every entry to [`Key::Blank`].
    pub fn clear(&mut self) {
        self.keys.fill(Key::Blank);
    }

    /// Iterates over `(address, key)` for every entry.
    pub fn iter(&self) -> impl Iterator<Item = (KeyAddr, Key)> + '_ {
        self.keys
            .iter()
            .enumerate()
            .map(|(idx, key)| (KeyAddr(idx as u16), *key))
    }

    /// Iterates over the keys alone, in address order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.keys.iter().copied()
    }

    /// Addresses whose entry is not blank.
    pub fn pressed(&self) -> impl Iterator<Item = KeyAddr> + '_ {
        self.iter()
            .filter(|(_, key)| !key.is_empty())
            .map(|(addr, _)| addr)
    }
}

impl Index<KeyAddr> for ActiveKeys {
    type Output = Key;

    fn index(&self, addr: KeyAddr) -> &Key {
        &self.keys[addr.index()]
    }
}

impl IndexMut<KeyAddr> for ActiveKeys {
    fn index_mut(&mut self, addr: KeyAddr) -> &mut Key {
        &mut self.keys[addr.index()]
    }
}
