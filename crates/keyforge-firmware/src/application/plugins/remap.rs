//! Table-driven key substitution.
//!
//! Rewrites the key of a press according to a fixed table.  Releases need no
//! handling: they resolve from the active-key table, which already holds the
//! substituted key.

use std::collections::HashMap;

use keyforge_core::{Key, KeyEvent, KeyParseError};

use crate::application::hooks::{EventHandlerResult, HandlerContext, KeyEventHandler};

/// Replaces keys on press according to a lookup table.
#[derive(Debug, Clone, Default)]
pub struct KeyRemap {
    table: HashMap<Key, Key>,
}

impl KeyRemap {
    pub fn new(table: HashMap<Key, Key>) -> Self {
        Self { table }
    }

    /// Builds the table from `(from, to)` key names.
    pub fn from_names<S: AsRef<str>>(pairs: &[(S, S)]) -> Result<Self, KeyParseError> {
        let table = pairs
            .iter()
            .map(|(from, to)| -> Result<(Key, Key), KeyParseError> {
                Ok((from.as_ref().parse()?, to.as_ref().parse()?))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { table })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl KeyEventHandler for KeyRemap {
    fn on_key_event(
        &mut self,
        event: &mut KeyEvent,
        _ctx: &mut HandlerContext<'_>,
    ) -> EventHandlerResult {
        if event.state.toggled_on() {
            if let Some(&to) = self.table.get(&event.key) {
                event.key = to;
            }
        }
        EventHandlerResult::Proceed
    }

    fn name(&self) -> &str {
        "remap"
    }
}
