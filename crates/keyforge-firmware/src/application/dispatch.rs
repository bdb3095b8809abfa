//! Fixed-point iteration over the plugin table for a single event.
//!
//! Plugins are visited in table order.  When a plugin rewrites the event's
//! key it is masked for the rest of the event and the walk restarts from the
//! first plugin, so handlers earlier in the table get to react to the new
//! key.  The walk ends after a full pass in which no plugin rewrote the key.
//!
//! Every restart sets one new mask bit, so there are at most `N` restarts and
//! `N + 1` passes of at most `N` calls each.  [`call_limit`] is that bound;
//! [`DispatchPass`] refuses to hand out a handler beyond it.

use keyforge_core::Key;
use tracing::{trace, warn};

use super::{hooks::EventHandlerResult, plugin_mask::PluginMask};

/// Upper bound on handler invocations for one event with `handlers` plugins.
pub fn call_limit(handlers: usize) -> usize {
    handlers.saturating_mul(handlers.saturating_add(1))
}

/// What the caller should do after a handler returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStep {
    /// Go on with the next handler.
    Continue,
    /// The key changed; the walk starts again from the first handler.
    Restart,
    /// The handler aborted the event.
    Abort,
}

/// Iteration state for one event's trip through the plugin table.
#[derive(Debug)]
pub struct DispatchPass {
    mask: PluginMask,
    prev_key: Key,
    cursor: usize,
    calls: usize,
    restarts: usize,
    limit: usize,
}

impl DispatchPass {
    /// Starts a pass over `handlers` plugins for an event carrying `key`.
    pub fn new(handlers: usize, key: Key) -> Self {
        Self {
            mask: PluginMask::new(handlers),
            prev_key: key,
            cursor: 0,
            calls: 0,
            restarts: 0,
            limit: call_limit(handlers),
        }
    }

    /// Index of the next handler to invoke, or `None` once the walk is done.
    ///
    /// Masked handlers are skipped.  Each returned index counts as one call.
    pub fn next_handler(&mut self) -> Option<usize> {
        while self.cursor < self.mask.len() {
            let id = self.cursor;
            self.cursor += 1;
            if self.mask.is_masked(id) {
                continue;
            }
            debug_assert!(
                self.calls < self.limit,
                "plugin dispatch exceeded {} calls",
                self.limit
            );
            if self.calls >= self.limit {
                warn!(
                    "plugin dispatch hit its call limit ({}); stopping with key {:?}",
                    self.limit, self.prev_key
                );
                return None;
            }
            self.calls += 1;
            return Some(id);
        }
        None
    }

    /// Records the result of handler `id`, which left the event holding `key`.
    pub fn observe(&mut self, id: usize, result: EventHandlerResult, key: Key) -> PassStep {
        if result == EventHandlerResult::Abort {
            return PassStep::Abort;
        }
        if key == self.prev_key {
            return PassStep::Continue;
        }
        self.mask.mask(id);
        trace!(
            "plugin {id} rewrote {:?} -> {:?}; restarting dispatch",
            self.prev_key,
            key
        );
        self.prev_key = key;
        self.cursor = 0;
        self.restarts += 1;
        PassStep::Restart
    }

    /// Handler invocations handed out so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn restarts(&self) -> usize {
        self.restarts
    }

    pub fn mask(&self) -> &PluginMask {
        &self.mask
    }
}
