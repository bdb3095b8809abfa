//! Controller: turns keyswitch transitions into committed keys and reports.
//!
//! Each event goes through the same pipeline, start to finish, before the
//! next one is looked at:
//!
//! 1. Masked addresses swallow everything until released.
//! 2. Events without a key are resolved: releases from the active-key table,
//!    presses from the keymap.
//! 3. The global keyswitch hook may abort (non-injected events only).
//! 4. The plugin table runs to a fixed point (see [`dispatch`](super::dispatch)).
//! 5. The key is committed to the active-key table.
//! 6. Layer keys go to the keymap; keyboard keys produce a report.
//!
//! # Architecture
//!
//! The controller depends only on traits ([`Keymap`], [`ReportTransmitter`],
//! [`GlobalHooks`], [`KeyEventHandler`]) and core types.  Infrastructure is
//! injected at construction, so the whole pipeline is unit-testable.

use keyforge_core::{
    ActiveKeys, Key, KeyAddr, KeyEvent, KeyboardKey, KeyboardReport, ModifierFlags, Transition,
};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use super::{
    dispatch::{DispatchPass, PassStep},
    hooks::{EventHandlerResult, GlobalHooks, HandlerContext, KeyEventHandler, NoHooks},
};
use crate::infrastructure::scan::ScanSource;

/// Default cap on nested plugin injections.
pub const DEFAULT_MAX_INJECTION_DEPTH: u8 = 8;

/// Error returned by a [`ReportTransmitter`].
#[derive(Debug, Error)]
pub enum TransmitError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode report: {0}")]
    Encode(String),
    #[error("report rejected: {0}")]
    Rejected(String),
}

/// Error type for event processing.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("transmit error: {0}")]
    Transmit(#[from] TransmitError),
}

/// Answers "what key is at this address" and reacts to layer keys.
#[cfg_attr(test, mockall::automock)]
pub trait Keymap {
    /// The key at `addr` on the current layer stack.
    fn lookup(&self, addr: KeyAddr) -> Key;

    /// Applies a committed layer key.
    ///
    /// This is the only place outside the controller allowed to write the
    /// active-key table.
    fn handle_layer_change(&mut self, event: &KeyEvent, active_keys: &mut ActiveKeys);
}

/// Accepts finished keyboard reports for transmission to the host.
#[cfg_attr(test, mockall::automock)]
pub trait ReportTransmitter {
    fn send(&mut self, report: &KeyboardReport) -> Result<(), TransmitError>;
}

/// Static controller parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Number of physical switches; valid addresses are `0..total_keys`.
    pub total_keys: u16,
    /// How deep injected events may nest before further injections are dropped.
    pub max_injection_depth: u8,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            total_keys: 64,
            max_injection_depth: DEFAULT_MAX_INJECTION_DEPTH,
        }
    }
}

/// Terminal state of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Dropped before the hooks: masked, out of range, or unresolvable.
    Discarded,
    /// A hook or plugin aborted; nothing was committed.
    Aborted,
    /// A layer key was committed and handed to the keymap.
    LayerChanged,
    /// Committed, but the key does not produce a report.
    NoReport,
    ReportSent,
    /// The pre-report hook refused transmission.
    ReportVetoed,
}

/// Counters for one scan cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Events read from the scan source.
    pub events: usize,
    /// Reports transmitted, including ones caused by injected events.
    pub reports_sent: usize,
    /// Events that ended in an error.
    pub errors: usize,
}

/// The key-event controller.
pub struct Controller<K, T, H = NoHooks> {
    settings: ControllerSettings,
    active_keys: ActiveKeys,
    allowed_modifiers: ModifierFlags,
    keymap: K,
    transmitter: T,
    hooks: H,
    plugins: Vec<Box<dyn KeyEventHandler>>,
    scan_start_ms: u32,
    reports_sent: usize,
}

impl<K: Keymap, T: ReportTransmitter> Controller<K, T, NoHooks> {
    /// Creates a controller with no plugins and no global hooks.
    pub fn new(settings: ControllerSettings, keymap: K, transmitter: T) -> Self {
        Self {
            settings,
            active_keys: ActiveKeys::new(settings.total_keys),
            allowed_modifiers: ModifierFlags::ALL,
            keymap,
            transmitter,
            hooks: NoHooks,
            plugins: Vec::new(),
            scan_start_ms: 0,
            reports_sent: 0,
        }
    }
}

impl<K: Keymap, T: ReportTransmitter, H: GlobalHooks> Controller<K, T, H> {
    /// Replaces the global hooks.
    pub fn with_hooks<G: GlobalHooks>(self, hooks: G) -> Controller<K, T, G> {
        Controller {
            settings: self.settings,
            active_keys: self.active_keys,
            allowed_modifiers: self.allowed_modifiers,
            keymap: self.keymap,
            transmitter: self.transmitter,
            hooks,
            plugins: self.plugins,
            scan_start_ms: self.scan_start_ms,
            reports_sent: self.reports_sent,
        }
    }

    /// Appends a plugin to the end of the handler table.
    pub fn with_plugin(mut self, plugin: impl KeyEventHandler + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Runs one scan cycle: pre-scan hook, scan, then every event in order.
    ///
    /// Per-event errors are logged and counted; they do not stop the cycle.
    pub fn run_cycle<S: ScanSource + ?Sized>(
        &mut self,
        scanner: &mut S,
        now_ms: u32,
    ) -> CycleSummary {
        self.scan_start_ms = now_ms;
        self.hooks.pre_scan(now_ms);
        scanner.scan_matrix();

        let reports_before = self.reports_sent;
        let mut summary = CycleSummary::default();
        while let Some(event) = scanner.next_event() {
            summary.events += 1;
            if let Err(e) = self.handle_key_event(event) {
                error!("event at {} failed: {e}", event.addr);
                summary.errors += 1;
            }
        }
        summary.reports_sent = self.reports_sent - reports_before;
        summary
    }

    /// Processes one top-level event to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Transmit`] if the report could not be sent.
    /// The key is committed regardless.
    pub fn handle_key_event(&mut self, event: KeyEvent) -> Result<EventOutcome, ControllerError> {
        self.process(event, 0)
    }

    /// Clears every active key and re-permits all modifiers.
    pub fn reset(&mut self) {
        self.active_keys.clear();
        self.allowed_modifiers = ModifierFlags::ALL;
    }

    pub fn active_keys(&self) -> &ActiveKeys {
        &self.active_keys
    }

    /// The mask applied to modifiers in the most recent report.
    pub fn allowed_modifiers(&self) -> ModifierFlags {
        self.allowed_modifiers
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn keymap(&self) -> &K {
        &self.keymap
    }

    pub fn keymap_mut(&mut self) -> &mut K {
        &mut self.keymap
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    pub fn transmitter_mut(&mut self) -> &mut T {
        &mut self.transmitter
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    // ── Pipeline ──────────────────────────────────────────────────────────────

    fn process(&mut self, event: KeyEvent, depth: u8) -> Result<EventOutcome, ControllerError> {
        let KeyEvent { addr, state, .. } = event;

        let Some(current) = self.active_keys.get(addr) else {
            warn!(
                "discarding event at {addr}: outside 0..{}",
                self.settings.total_keys
            );
            return Ok(EventOutcome::Discarded);
        };

        if current.is_masked() {
            if state.toggled_off() {
                self.active_keys[addr] = Key::Blank;
            }
            trace!("discarding {:?} at masked {addr}", state.transition());
            return Ok(EventOutcome::Discarded);
        }

        let mut event = event;
        if event.key.is_empty() {
            match self.resolve(addr, state.transition()) {
                Some(key) => event.key = key,
                None => return Ok(EventOutcome::Discarded),
            }
        }
        debug!(
            "event at {addr}: {:?}{} -> {:?}",
            state.transition(),
            if state.is_injected() { " (injected)" } else { "" },
            event.key
        );

        if !state.is_injected()
            && self.hooks.on_keyswitch_event(&event) == EventHandlerResult::Abort
        {
            debug!("keyswitch hook aborted event at {addr}");
            return Ok(EventOutcome::Aborted);
        }

        if !self.plugins.is_empty() {
            match self.run_plugins(event, depth) {
                Some(rewritten) => event = rewritten,
                None => return Ok(EventOutcome::Aborted),
            }
        }

        self.commit(&event);

        match event.key {
            Key::Layer(_) => {
                self.keymap
                    .handle_layer_change(&event, &mut self.active_keys);
                Ok(EventOutcome::LayerChanged)
            }
            Key::Keyboard(key) => self.send_keyboard_report(&event, key),
            Key::Blank | Key::Transparent | Key::Masked => Ok(EventOutcome::NoReport),
        }
    }

    /// Key for an event that arrived without one.
    ///
    /// A held or idle event without a key panics in debug builds; release
    /// builds log it and discard the event.
    fn resolve(&self, addr: KeyAddr, transition: Transition) -> Option<Key> {
        match transition {
            Transition::ToggledOff => Some(self.active_keys[addr]),
            Transition::ToggledOn => Some(self.keymap.lookup(addr)),
            Transition::Held | Transition::Idle => {
                if cfg!(debug_assertions) {
                    panic!("{transition:?} event at {addr} carries no key");
                }
                warn!("discarding {transition:?} event at {addr}: no key was resolved on press");
                None
            }
        }
    }

    /// Runs the plugin table to a fixed point.  Returns `None` on abort.
    ///
    /// Plugins may only change the key; address and state are restored after
    /// every call.
    fn run_plugins(&mut self, mut event: KeyEvent, depth: u8) -> Option<KeyEvent> {
        let KeyEvent { addr, state, .. } = event;
        let mut pass = DispatchPass::new(self.plugins.len(), event.key);

        while let Some(id) = pass.next_handler() {
            let mut ctx = HandlerContext::new(&self.active_keys, self.scan_start_ms);
            let result = self.plugins[id].on_key_event(&mut event, &mut ctx);
            let injected = ctx.into_injected();
            event = KeyEvent::with_key(addr, state, event.key);

            if !injected.is_empty() {
                self.process_injected(injected, depth);
            }

            if pass.observe(id, result, event.key) == PassStep::Abort {
                debug!(
                    "plugin {} aborted event at {addr}",
                    self.plugins[id].name()
                );
                return None;
            }
        }

        trace!(
            "dispatch at {addr} finished after {} calls, {} restarts",
            pass.calls(),
            pass.restarts()
        );
        Some(event)
    }

    /// Processes events a plugin injected, each as a new top-level event.
    fn process_injected(&mut self, events: Vec<KeyEvent>, depth: u8) {
        let next = depth.saturating_add(1);
        if next > self.settings.max_injection_depth {
            warn!(
                "dropping {} injected event(s): nesting depth {next} exceeds {}",
                events.len(),
                self.settings.max_injection_depth
            );
            return;
        }
        for event in events {
            if let Err(e) = self.process(event, next) {
                error!("injected event at {} failed: {e}", event.addr);
            }
        }
    }

    fn commit(&mut self, event: &KeyEvent) {
        match event.state.transition() {
            Transition::ToggledOff => self.active_keys[event.addr] = Key::Blank,
            Transition::ToggledOn => self.active_keys[event.addr] = event.key,
            Transition::Held | Transition::Idle => {}
        }
    }

    fn send_keyboard_report(
        &mut self,
        event: &KeyEvent,
        key: KeyboardKey,
    ) -> Result<EventOutcome, ControllerError> {
        // A fresh non-modifier press decides which modifiers may apply.
        self.allowed_modifiers = if event.state.toggled_on() && !key.is_modifier() {
            key.modifier_flags()
        } else {
            ModifierFlags::ALL
        };

        let mut report = KeyboardReport::from_active_keys(&self.active_keys, self.allowed_modifiers);
        let outcome = if self.hooks.pre_keyboard_report(&mut report) {
            self.transmitter.send(&report)?;
            self.reports_sent += 1;
            trace!("sent report {:02x?}", report.as_bytes());
            EventOutcome::ReportSent
        } else {
            debug!("pre-report hook vetoed report for {}", event.addr);
            EventOutcome::ReportVetoed
        };

        self.hooks.post_keyboard_report(event);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use super::*;
    use crate::infrastructure::{scan::mock::ScriptedScanner, transmit::mock::RecordingTransmitter};
    use keyforge_core::{HidKeyCode, KeyState, LayerKey};

    // ── Test doubles ──────────────────────────────────────────────────────────

    /// Single-layer keymap backed by a vector; records layer changes.
    #[derive(Default)]
    struct TableKeymap {
        keys: Vec<Key>,
        layer_changes: Vec<KeyEvent>,
    }

    impl TableKeymap {
        fn with(entries: &[(u16, Key)]) -> Self {
            let mut keys = vec![Key::Blank; 16];
            for &(addr, key) in entries {
                keys[usize::from(addr)] = key;
            }
            Self {
                keys,
                layer_changes: Vec::new(),
            }
        }
    }

    impl Keymap for TableKeymap {
        fn lookup(&self, addr: KeyAddr) -> Key {
            self.keys.get(addr.index()).copied().unwrap_or_default()
        }

        fn handle_layer_change(&mut self, event: &KeyEvent, _active_keys: &mut ActiveKeys) {
            self.layer_changes.push(*event);
        }
    }

    #[derive(Default)]
    struct RecordingHooks {
        pre_scans: Vec<u32>,
        keyswitch_events: Vec<KeyEvent>,
        post_events: Vec<KeyEvent>,
        abort_keyswitch: bool,
        veto_reports: bool,
    }

    impl GlobalHooks for RecordingHooks {
        fn pre_scan(&mut self, now_ms: u32) {
            self.pre_scans.push(now_ms);
        }

        fn on_keyswitch_event(&mut self, event: &KeyEvent) -> EventHandlerResult {
            self.keyswitch_events.push(*event);
            if self.abort_keyswitch {
                EventHandlerResult::Abort
            } else {
                EventHandlerResult::Proceed
            }
        }

        fn pre_keyboard_report(&mut self, _report: &mut KeyboardReport) -> bool {
            !self.veto_reports
        }

        fn post_keyboard_report(&mut self, event: &KeyEvent) {
            self.post_events.push(*event);
        }
    }

    /// Rewrites every keyboard usage to the next usage code.
    struct NextKeycode {
        calls: Rc<Cell<usize>>,
    }

    impl KeyEventHandler for NextKeycode {
        fn on_key_event(
            &mut self,
            event: &mut KeyEvent,
            _ctx: &mut HandlerContext<'_>,
        ) -> EventHandlerResult {
            self.calls.set(self.calls.get() + 1);
            if let Key::Keyboard(kb) = event.key {
                let next = HidKeyCode::from_u8(kb.keycode().as_u8() + 1);
                event.key = Key::from(next);
            }
            EventHandlerResult::Proceed
        }
    }

    /// Counts calls, changes nothing.
    struct Observer {
        calls: Rc<Cell<usize>>,
    }

    impl KeyEventHandler for Observer {
        fn on_key_event(
            &mut self,
            _event: &mut KeyEvent,
            _ctx: &mut HandlerContext<'_>,
        ) -> EventHandlerResult {
            self.calls.set(self.calls.get() + 1);
            EventHandlerResult::Proceed
        }
    }

    /// Takes ownership of presses at one address by masking them.
    struct Swallow {
        addr: KeyAddr,
        calls: Rc<Cell<usize>>,
    }

    impl KeyEventHandler for Swallow {
        fn on_key_event(
            &mut self,
            event: &mut KeyEvent,
            _ctx: &mut HandlerContext<'_>,
        ) -> EventHandlerResult {
            self.calls.set(self.calls.get() + 1);
            if event.addr == self.addr && event.state.toggled_on() {
                event.key = Key::Masked;
            }
            EventHandlerResult::Proceed
        }
    }

    /// Records what the context exposes on every call.
    struct ContextRecorder {
        seen: Rc<RefCell<Vec<(u32, usize)>>>,
    }

    impl KeyEventHandler for ContextRecorder {
        fn on_key_event(
            &mut self,
            _event: &mut KeyEvent,
            ctx: &mut HandlerContext<'_>,
        ) -> EventHandlerResult {
            let pressed = ctx.active_keys().pressed().count();
            self.seen.borrow_mut().push((ctx.scan_start_ms(), pressed));
            EventHandlerResult::Proceed
        }
    }

    struct AbortAll;

    impl KeyEventHandler for AbortAll {
        fn on_key_event(
            &mut self,
            _event: &mut KeyEvent,
            _ctx: &mut HandlerContext<'_>,
        ) -> EventHandlerResult {
            EventHandlerResult::Abort
        }
    }

    /// Injects a press at `target` carrying `key`.
    struct Injector {
        target: KeyAddr,
        key: Key,
        only_physical: bool,
        calls: Rc<Cell<usize>>,
    }

    impl KeyEventHandler for Injector {
        fn on_key_event(
            &mut self,
            event: &mut KeyEvent,
            ctx: &mut HandlerContext<'_>,
        ) -> EventHandlerResult {
            self.calls.set(self.calls.get() + 1);
            if !(self.only_physical && event.state.is_injected()) {
                ctx.inject(KeyEvent::with_key(self.target, KeyState::TOGGLED_ON, self.key));
            }
            EventHandlerResult::Proceed
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn key(code: HidKeyCode) -> Key {
        Key::from(code)
    }

    fn settings() -> ControllerSettings {
        ControllerSettings {
            total_keys: 16,
            max_injection_depth: DEFAULT_MAX_INJECTION_DEPTH,
        }
    }

    fn make_controller(
        keymap: TableKeymap,
    ) -> Controller<TableKeymap, RecordingTransmitter, RecordingHooks> {
        Controller::new(settings(), keymap, RecordingTransmitter::new())
            .with_hooks(RecordingHooks::default())
    }

    fn press(addr: u16) -> KeyEvent {
        KeyEvent::new(KeyAddr(addr), KeyState::TOGGLED_ON)
    }

    fn release(addr: u16) -> KeyEvent {
        KeyEvent::new(KeyAddr(addr), KeyState::TOGGLED_OFF)
    }

    fn counter() -> Rc<Cell<usize>> {
        Rc::new(Cell::new(0))
    }

    // ── Resolution and commit ─────────────────────────────────────────────────

    #[test]
    fn test_press_commits_keymap_key_and_sends_report() {
        // Arrange
        let mut ctl = make_controller(TableKeymap::with(&[(2, key(HidKeyCode::KeyA))]));

        // Act
        let outcome = ctl.handle_key_event(press(2)).unwrap();

        // Assert
        assert_eq!(outcome, EventOutcome::ReportSent);
        assert_eq!(ctl.active_keys()[KeyAddr(2)], key(HidKeyCode::KeyA));
        let reports = ctl.transmitter().reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains(HidKeyCode::KeyA));
    }

    #[test]
    fn test_release_resolves_to_pressed_key_after_keymap_change() {
        // Arrange
        let mut ctl = make_controller(TableKeymap::with(&[(2, key(HidKeyCode::KeyA))]));
        ctl.handle_key_event(press(2)).unwrap();
        ctl.keymap_mut().keys[2] = key(HidKeyCode::KeyB);

        // Act
        let outcome = ctl.handle_key_event(release(2)).unwrap();

        // Assert
        assert_eq!(outcome, EventOutcome::ReportSent);
        assert_eq!(ctl.hooks().post_events.last().unwrap().key, key(HidKeyCode::KeyA));
        assert_eq!(ctl.active_keys()[KeyAddr(2)], Key::Blank);
        assert!(ctl.transmitter().reports().last().unwrap().is_empty());
    }

    #[test]
    fn test_event_with_key_skips_keymap_lookup() {
        // Arrange
        let mut keymap = MockKeymap::new();
        keymap.expect_lookup().times(0);
        let mut tx = MockReportTransmitter::new();
        tx.expect_send().times(1).returning(|_| Ok(()));
        let mut ctl = Controller::new(settings(), keymap, tx);

        // Act
        let outcome = ctl
            .handle_key_event(KeyEvent::with_key(
                KeyAddr(4),
                KeyState::TOGGLED_ON,
                key(HidKeyCode::KeyZ),
            ))
            .unwrap();

        // Assert
        assert_eq!(outcome, EventOutcome::ReportSent);
        assert_eq!(ctl.active_keys()[KeyAddr(4)], key(HidKeyCode::KeyZ));
    }

    #[test]
    fn test_out_of_range_address_is_discarded() {
        let mut ctl = make_controller(TableKeymap::default());
        let outcome = ctl.handle_key_event(press(16)).unwrap();
        assert_eq!(outcome, EventOutcome::Discarded);
        assert!(ctl.hooks().keyswitch_events.is_empty());
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "carries no key"))]
    fn test_held_event_without_key_is_a_contract_violation() {
        let mut ctl = make_controller(TableKeymap::default());
        let outcome = ctl
            .handle_key_event(KeyEvent::new(KeyAddr(1), KeyState::HELD))
            .unwrap();
        assert_eq!(outcome, EventOutcome::Discarded);
    }

    #[test]
    fn test_blank_key_commits_without_report() {
        let mut ctl = make_controller(TableKeymap::default());
        let outcome = ctl.handle_key_event(press(3)).unwrap();
        assert_eq!(outcome, EventOutcome::NoReport);
        assert!(ctl.transmitter().reports().is_empty());
    }

    #[test]
    fn test_transparent_key_produces_no_report() {
        let mut ctl = make_controller(TableKeymap::with(&[(3, Key::Transparent)]));
        assert_eq!(
            ctl.handle_key_event(press(3)).unwrap(),
            EventOutcome::NoReport
        );
        assert!(ctl.transmitter().reports().is_empty());
    }

    // ── Global hooks ──────────────────────────────────────────────────────────

    #[test]
    fn test_keyswitch_hook_abort_leaves_state_untouched() {
        // Arrange
        let mut ctl = make_controller(TableKeymap::with(&[(1, key(HidKeyCode::KeyA))]));
        ctl.hooks_mut().abort_keyswitch = true;

        // Act
        let outcome = ctl.handle_key_event(press(1)).unwrap();

        // Assert
        assert_eq!(outcome, EventOutcome::Aborted);
        assert_eq!(ctl.active_keys()[KeyAddr(1)], Key::Blank);
        assert!(ctl.transmitter().reports().is_empty());
    }

    #[test]
    fn test_pre_report_veto_skips_transmission_but_runs_post_hook() {
        // Arrange
        let mut ctl = make_controller(TableKeymap::with(&[(1, key(HidKeyCode::KeyA))]));
        ctl.hooks_mut().veto_reports = true;

        // Act
        let outcome = ctl.handle_key_event(press(1)).unwrap();

        // Assert
        assert_eq!(outcome, EventOutcome::ReportVetoed);
        assert!(ctl.transmitter().reports().is_empty());
        assert_eq!(ctl.hooks().post_events.len(), 1);
        assert_eq!(ctl.active_keys()[KeyAddr(1)], key(HidKeyCode::KeyA));
    }

    #[test]
    fn test_transmit_failure_is_returned_and_post_hook_skipped() {
        // Arrange
        let mut ctl = make_controller(TableKeymap::with(&[(1, key(HidKeyCode::KeyA))]));
        ctl.transmitter_mut().set_failing(true);

        // Act
        let result = ctl.handle_key_event(press(1));

        // Assert
        assert!(matches!(result, Err(ControllerError::Transmit(_))));
        assert!(ctl.hooks().post_events.is_empty());
        assert_eq!(ctl.active_keys()[KeyAddr(1)], key(HidKeyCode::KeyA));
    }

    // ── Plugin dispatch ───────────────────────────────────────────────────────

    #[test]
    fn test_next_keycode_plugin_rewrites_once_and_commits_result() {
        // Arrange
        let rewrites = counter();
        let observed = counter();
        let mut ctl = make_controller(TableKeymap::with(&[(5, key(HidKeyCode::KeyA))]))
            .with_plugin(NextKeycode {
                calls: Rc::clone(&rewrites),
            })
            .with_plugin(Observer {
                calls: Rc::clone(&observed),
            });

        // Act
        let outcome = ctl.handle_key_event(press(5)).unwrap();

        // Assert
        assert_eq!(outcome, EventOutcome::ReportSent);
        assert_eq!(rewrites.get(), 1);
        assert_eq!(observed.get(), 1);
        assert_eq!(ctl.active_keys()[KeyAddr(5)], key(HidKeyCode::KeyB));
        let report = ctl.transmitter().reports()[0];
        assert!(report.contains(HidKeyCode::KeyB));
        assert!(!report.contains(HidKeyCode::KeyA));
    }

    #[test]
    fn test_plugins_before_a_rewriter_see_the_new_key() {
        // Arrange – observer first, rewriter second: observer runs again after the restart
        let rewrites = counter();
        let observed = counter();
        let mut ctl = make_controller(TableKeymap::with(&[(5, key(HidKeyCode::KeyA))]))
            .with_plugin(Observer {
                calls: Rc::clone(&observed),
            })
            .with_plugin(NextKeycode {
                calls: Rc::clone(&rewrites),
            });

        // Act
        ctl.handle_key_event(press(5)).unwrap();

        // Assert
        assert_eq!(observed.get(), 2);
        assert_eq!(rewrites.get(), 1);
        assert_eq!(ctl.plugin_count(), 2);
    }

    #[test]
    fn test_plugin_abort_prevents_commit_and_report() {
        let mut ctl =
            make_controller(TableKeymap::with(&[(1, key(HidKeyCode::KeyA))])).with_plugin(AbortAll);

        let outcome = ctl.handle_key_event(press(1)).unwrap();

        assert_eq!(outcome, EventOutcome::Aborted);
        assert_eq!(ctl.active_keys()[KeyAddr(1)], Key::Blank);
        assert!(ctl.transmitter().reports().is_empty());
    }

    #[test]
    fn test_masked_address_discards_until_release() {
        // Arrange
        let calls = counter();
        let mut ctl = make_controller(TableKeymap::with(&[(3, key(HidKeyCode::KeyA))])).with_plugin(
            Swallow {
                addr: KeyAddr(3),
                calls: Rc::clone(&calls),
            },
        );

        // Act
        let pressed = ctl.handle_key_event(press(3)).unwrap();
        let held = ctl
            .handle_key_event(KeyEvent::new(KeyAddr(3), KeyState::HELD))
            .unwrap();
        let released = ctl.handle_key_event(release(3)).unwrap();

        // Assert
        assert_eq!(pressed, EventOutcome::NoReport);
        assert_eq!(held, EventOutcome::Discarded);
        assert_eq!(released, EventOutcome::Discarded);
        assert_eq!(calls.get(), 1, "masked events never reach plugins");
        assert_eq!(ctl.active_keys()[KeyAddr(3)], Key::Blank);
        assert!(ctl.transmitter().reports().is_empty());
        assert_eq!(ctl.hooks().keyswitch_events.len(), 1);
    }

    // ── Injection ─────────────────────────────────────────────────────────────

    #[test]
    fn test_injected_event_completes_before_interrupted_event() {
        // Arrange
        let calls = counter();
        let mut ctl = make_controller(TableKeymap::with(&[(0, key(HidKeyCode::KeyA))])).with_plugin(
            Injector {
                target: KeyAddr(7),
                key: key(HidKeyCode::KeyC),
                only_physical: true,
                calls: Rc::clone(&calls),
            },
        );

        // Act
        let outcome = ctl.handle_key_event(press(0)).unwrap();

        // Assert
        assert_eq!(outcome, EventOutcome::ReportSent);
        let reports = ctl.transmitter().reports();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].contains(HidKeyCode::KeyC));
        assert!(!reports[0].contains(HidKeyCode::KeyA));
        assert!(reports[1].contains(HidKeyCode::KeyA));
        assert!(reports[1].contains(HidKeyCode::KeyC));
        // the injected event bypasses the keyswitch hook but not the plugins
        assert_eq!(ctl.hooks().keyswitch_events.len(), 1);
        assert_eq!(calls.get(), 2);
        assert!(ctl.hooks().post_events[0].state.is_injected());
    }

    #[test]
    fn test_injection_beyond_max_depth_is_dropped() {
        // Arrange – the injector fires for every event, including its own
        let calls = counter();
        let mut ctl = Controller::new(
            ControllerSettings {
                total_keys: 16,
                max_injection_depth: 2,
            },
            TableKeymap::with(&[(0, key(HidKeyCode::KeyA))]),
            RecordingTransmitter::new(),
        )
        .with_plugin(Injector {
            target: KeyAddr(1),
            key: key(HidKeyCode::KeyB),
            only_physical: false,
            calls: Rc::clone(&calls),
        });

        // Act
        ctl.handle_key_event(press(0)).unwrap();

        // Assert – depth 0, 1 and 2 ran; the injection from depth 2 was dropped
        assert_eq!(calls.get(), 3);
        assert_eq!(ctl.transmitter().reports().len(), 3);
    }

    // ── Layer and report branches ─────────────────────────────────────────────

    #[test]
    fn test_layer_key_goes_to_keymap_and_sends_nothing() {
        // Arrange
        let layer_key = Key::Layer(LayerKey::Shift(1));
        let mut keymap = MockKeymap::new();
        keymap.expect_lookup().return_const(layer_key);
        keymap
            .expect_handle_layer_change()
            .withf(move |event, _| event.key == layer_key && event.addr == KeyAddr(9))
            .times(1)
            .return_const(());
        let mut tx = MockReportTransmitter::new();
        tx.expect_send().times(0);
        let mut ctl = Controller::new(settings(), keymap, tx);

        // Act
        let outcome = ctl.handle_key_event(press(9)).unwrap();

        // Assert
        assert_eq!(outcome, EventOutcome::LayerChanged);
        assert_eq!(ctl.active_keys()[KeyAddr(9)], layer_key);
    }

    #[test]
    fn test_new_plain_press_overrides_held_modifier() {
        // Arrange
        let mut ctl = make_controller(TableKeymap::with(&[
            (0, key(HidKeyCode::ShiftLeft)),
            (1, key(HidKeyCode::KeyA)),
        ]));

        // Act
        ctl.handle_key_event(press(0)).unwrap();
        ctl.handle_key_event(press(1)).unwrap();

        // Assert
        let reports = ctl.transmitter().reports();
        assert_eq!(reports[0].modifiers(), ModifierFlags::LEFT_SHIFT);
        assert!(reports[1].modifiers().is_empty());
        assert!(reports[1].contains(HidKeyCode::KeyA));
        assert_eq!(ctl.allowed_modifiers(), ModifierFlags::NONE);
    }

    #[test]
    fn test_release_restores_all_modifiers() {
        // Arrange
        let mut ctl = make_controller(TableKeymap::with(&[
            (0, key(HidKeyCode::ShiftLeft)),
            (1, key(HidKeyCode::KeyA)),
        ]));
        ctl.handle_key_event(press(0)).unwrap();
        ctl.handle_key_event(press(1)).unwrap();

        // Act
        ctl.handle_key_event(release(1)).unwrap();

        // Assert
        let last = *ctl.transmitter().reports().last().unwrap();
        assert_eq!(last.modifiers(), ModifierFlags::LEFT_SHIFT);
        assert!(!last.contains(HidKeyCode::KeyA));
        assert_eq!(ctl.allowed_modifiers(), ModifierFlags::ALL);
    }

    #[test]
    fn test_key_declaring_shift_keeps_held_shift() {
        // Arrange
        let shifted_one: Key = "S(1)".parse().unwrap();
        let mut ctl = make_controller(TableKeymap::with(&[
            (0, key(HidKeyCode::ShiftLeft)),
            (2, shifted_one),
        ]));

        // Act
        ctl.handle_key_event(press(0)).unwrap();
        ctl.handle_key_event(press(2)).unwrap();

        // Assert
        let last = *ctl.transmitter().reports().last().unwrap();
        assert_eq!(last.modifiers(), ModifierFlags::LEFT_SHIFT);
        assert!(last.contains(HidKeyCode::Digit1));
    }

    #[test]
    fn test_reset_clears_active_keys() {
        let mut ctl = make_controller(TableKeymap::with(&[(1, key(HidKeyCode::KeyA))]));
        ctl.handle_key_event(press(1)).unwrap();

        ctl.reset();

        assert_eq!(ctl.active_keys().pressed().count(), 0);
        assert_eq!(ctl.allowed_modifiers(), ModifierFlags::ALL);
    }

    // ── Scan cycle ────────────────────────────────────────────────────────────

    #[test]
    fn test_run_cycle_drains_scanner_in_order() {
        // Arrange
        let mut ctl = make_controller(TableKeymap::with(&[
            (0, key(HidKeyCode::KeyA)),
            (1, key(HidKeyCode::KeyB)),
        ]));
        let mut scanner = ScriptedScanner::new();
        scanner.push_cycle(vec![press(0), press(1)]);
        scanner.push_cycle(vec![release(0)]);

        // Act
        let first = ctl.run_cycle(&mut scanner, 10);
        let second = ctl.run_cycle(&mut scanner, 20);
        let idle = ctl.run_cycle(&mut scanner, 30);

        // Assert
        assert_eq!(
            first,
            CycleSummary {
                events: 2,
                reports_sent: 2,
                errors: 0
            }
        );
        assert_eq!(second.events, 1);
        assert_eq!(idle, CycleSummary::default());
        assert_eq!(ctl.hooks().pre_scans, vec![10, 20, 30]);
        assert_eq!(ctl.active_keys().pressed().collect::<Vec<_>>(), vec![KeyAddr(1)]);
    }

    #[test]
    fn test_plugins_see_scan_start_time_and_committed_keys() {
        // Arrange
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut ctl = make_controller(TableKeymap::with(&[
            (0, key(HidKeyCode::KeyA)),
            (1, key(HidKeyCode::KeyB)),
        ]))
        .with_plugin(ContextRecorder { seen: seen.clone() });
        let mut scanner = ScriptedScanner::new();
        scanner.push_cycle(vec![press(0)]);
        scanner.push_cycle(vec![press(1)]);

        // Act
        ctl.run_cycle(&mut scanner, 1234);
        ctl.run_cycle(&mut scanner, 5678);

        // Assert – the second press sees the first one already committed
        assert_eq!(*seen.borrow(), vec![(1234, 0), (5678, 1)]);
    }

    #[test]
    fn test_run_cycle_counts_errors_and_keeps_going() {
        // Arrange
        let mut ctl = make_controller(TableKeymap::with(&[
            (0, key(HidKeyCode::KeyA)),
            (1, key(HidKeyCode::KeyB)),
        ]));
        ctl.transmitter_mut().set_failing(true);
        let mut scanner = ScriptedScanner::new();
        scanner.push_cycle(vec![press(0), press(1)]);

        // Act
        let summary = ctl.run_cycle(&mut scanner, 0);

        // Assert
        assert_eq!(summary.events, 2);
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.reports_sent, 0);
    }
}
