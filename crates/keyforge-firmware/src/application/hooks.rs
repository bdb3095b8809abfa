//! Extension points the controller calls while it processes an event.
//!
//! Two kinds of extension exist:
//!
//! - **Plugins** ([`KeyEventHandler`]) form an ordered table fixed at startup.
//!   Each one sees every event that passes the global gate and may rewrite
//!   `event.key`; the controller re-runs the table whenever a plugin does so
//!   (see [`dispatch`](super::dispatch)).
//! - **Global hooks** ([`GlobalHooks`]) are single callbacks at fixed points of
//!   the pipeline: before a scan, before the plugin table, before and after a
//!   keyboard report.

use keyforge_core::{ActiveKeys, KeyEvent, KeyboardReport};

/// What a hook or plugin wants to happen to the event it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventHandlerResult {
    /// Keep processing.
    Proceed,
    /// Stop processing this event now: no commit, no report.
    Abort,
}

/// Per-call view of the controller handed to a plugin.
///
/// Plugins may read the active-key table but never write it; the only way to
/// influence state is rewriting the event's key or injecting new events.
#[derive(Debug)]
pub struct HandlerContext<'a> {
    active_keys: &'a ActiveKeys,
    scan_start_ms: u32,
    injected: Vec<KeyEvent>,
}

impl<'a> HandlerContext<'a> {
    pub fn new(active_keys: &'a ActiveKeys, scan_start_ms: u32) -> Self {
        Self {
            active_keys,
            scan_start_ms,
            injected: Vec::new(),
        }
    }

    pub fn active_keys(&self) -> &ActiveKeys {
        self.active_keys
    }

    /// Time the current scan cycle started, in milliseconds.
    pub fn scan_start_ms(&self) -> u32 {
        self.scan_start_ms
    }

    /// Queues a synthetic event.
    ///
    /// The event is marked injected and processed to completion right after
    /// the calling plugin returns, before the interrupted plugin pass resumes.
    pub fn inject(&mut self, mut event: KeyEvent) {
        event.state = event.state.injected();
        self.injected.push(event);
    }

    pub(crate) fn into_injected(self) -> Vec<KeyEvent> {
        self.injected
    }
}

/// A plugin in the ordered key-event handler table.
pub trait KeyEventHandler {
    /// Observes one event and optionally rewrites `event.key`.
    ///
    /// Only the key is honoured; changes to `addr` or `state` are ignored.
    /// A plugin that rewrites the key is not called again for this event.
    fn on_key_event(
        &mut self,
        event: &mut KeyEvent,
        ctx: &mut HandlerContext<'_>,
    ) -> EventHandlerResult;

    /// Name used in log output.
    fn name(&self) -> &str {
        "plugin"
    }
}

/// Callbacks at fixed points of the pipeline.
///
/// Every method has a pass-through default, so implementors override only
/// what they need.
pub trait GlobalHooks {
    /// Called once per scan cycle, before the scan source is read.
    fn pre_scan(&mut self, _now_ms: u32) {}

    /// Gate run once for every non-injected event before the plugin table.
    fn on_keyswitch_event(&mut self, _event: &KeyEvent) -> EventHandlerResult {
        EventHandlerResult::Proceed
    }

    /// Last look at a report; returning `false` vetoes transmission.
    fn pre_keyboard_report(&mut self, _report: &mut KeyboardReport) -> bool {
        true
    }

    /// Called after a keyboard-key event has produced its report.
    fn post_keyboard_report(&mut self, _event: &KeyEvent) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl GlobalHooks for NoHooks {}
