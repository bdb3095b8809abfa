//! Per-cycle switch transitions.

/// What a debounced switch did during the current scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Released before and after.
    Idle,
    /// Released last cycle, pressed now.
    ToggledOn,
    /// Pressed last cycle, released now.
    ToggledOff,
    /// Pressed before and after.
    Held,
}

/// The transition of one switch plus whether the event is synthetic.
///
/// Scan sources emit each `ToggledOn` and `ToggledOff` exactly once per
/// physical press/release pair.  Events created by plugins carry
/// `injected = true` and skip the global keyswitch hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyState {
    transition: Transition,
    injected: bool,
}

impl KeyState {
    pub const IDLE: Self = Self::new(Transition::Idle);
    pub const TOGGLED_ON: Self = Self::new(Transition::ToggledOn);
    pub const TOGGLED_OFF: Self = Self::new(Transition::ToggledOff);
    pub const HELD: Self = Self::new(Transition::Held);

    pub const fn new(transition: Transition) -> Self {
        Self {
            transition,
            injected: false,
        }
    }

    /// Derives the transition from the previous and current debounced samples.
    pub fn from_samples(was_pressed: bool, is_pressed: bool) -> Self {
        let transition = match (was_pressed, is_pressed) {
            (false, false) => Transition::Idle,
            (false, true) => Transition::ToggledOn,
            (true, false) => Transition::ToggledOff,
            (true, true) => Transition::Held,
        };
        Self::new(transition)
    }

    /// The same transition, marked as synthetic.
    pub fn injected(self) -> Self {
        Self {
            injected: true,
            ..self
        }
    }

    pub fn transition(self) -> Transition {
        self.transition
    }

    pub fn toggled_on(self) -> bool {
        self.transition == Transition::ToggledOn
    }

    pub fn toggled_off(self) -> bool {
        self.transition == Transition::ToggledOff
    }

    /// `true` for `ToggledOn` and `Held`.
    pub fn is_pressed(self) -> bool {
        matches!(self.transition, Transition::ToggledOn | Transition::Held)
    }

    pub fn is_injected(self) -> bool {
        self.injected
    }
}
