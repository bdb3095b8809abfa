//! The unit of work handed through the event pipeline.

use super::{key::Key, key_addr::KeyAddr, key_state::KeyState};

/// One switch transition and the key it resolved to.
///
/// Scan sources create events with [`Key::Blank`]; the controller fills the
/// key in from the keymap (press) or the active-key table (release).  An
/// event lives for a single dispatch and is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub addr: KeyAddr,
    pub state: KeyState,
    pub key: Key,
}

impl KeyEvent {
    /// An unresolved event as produced by a scan.
    pub fn new(addr: KeyAddr, state: KeyState) -> Self {
        Self {
            addr,
            state,
            key: Key::Blank,
        }
    }

    /// An event that already carries its key.
    pub fn with_key(addr: KeyAddr, state: KeyState, key: Key) -> Self {
        Self { addr, state, key }
    }
}
