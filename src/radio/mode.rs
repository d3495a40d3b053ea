//! Mode State Machine
//!
//! Cycles Inactive → ScanOnly → ModeA → ModeB → Inactive on each accepted
//! press of the mode button.
//!
//! The button edge is captured by [`TriggerSlot::notify`], which only stores
//! a timestamp and raises a flag. The main loop drains the slot once per
//! tick and feeds the timestamp to [`ModeStateMachine::on_trigger`], where
//! debouncing and the transition happen. All radio reconfiguration is
//! therefore done from the main loop, never from the edge handler.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::jammer::JamProfile;
use crate::config::BUTTON_DEBOUNCE_MS;
use crate::types::{Millis, OperationMode};

/// Single-slot, lock-free trigger notification
///
/// One producer (the edge handler) and one consumer (the main loop). If
/// several edges arrive between two drains only the latest timestamp is
/// kept; they would be rejected by the debouncer anyway.
pub struct TriggerSlot {
    pending: AtomicBool,
    at: AtomicU32,
}

impl TriggerSlot {
    /// Create an empty slot (usable in a `static`)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            at: AtomicU32::new(0),
        }
    }

    /// Record an edge. No I/O, no allocation, never blocks.
    pub fn notify(&self, at: Millis) {
        self.at.store(at.as_u32(), Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
    }

    /// Take the pending edge, if any
    pub fn take(&self) -> Option<Millis> {
        if self.pending.swap(false, Ordering::Acquire) {
            Some(Millis::new(self.at.load(Ordering::Relaxed)))
        } else {
            None
        }
    }

    /// Check for a pending edge without consuming it
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for TriggerSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects triggers closer than a fixed window to the last accepted one
#[derive(Clone, Copy, Debug)]
pub struct Debouncer {
    window_ms: u32,
    last_accepted: Option<Millis>,
}

impl Debouncer {
    /// Create a debouncer with the given window
    #[must_use]
    pub const fn new(window_ms: u32) -> Self {
        Self {
            window_ms,
            last_accepted: None,
        }
    }

    /// Decide whether a trigger at `at` counts; accepted triggers restart the window
    pub fn accept(&mut self, at: Millis) -> bool {
        let accepted = match self.last_accepted {
            None => true,
            Some(last) => at.since(last) >= self.window_ms,
        };
        if accepted {
            self.last_accepted = Some(at);
        }
        accepted
    }

    /// Debounce window in milliseconds
    #[must_use]
    pub const fn window_ms(&self) -> u32 {
        self.window_ms
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(BUTTON_DEBOUNCE_MS)
    }
}

/// Input to the transition table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeEvent {
    /// Debounced button press
    Trigger,
}

/// Which jam profile slot a mode uses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JamSlot {
    /// Profile for [`OperationMode::ModeA`]
    A,
    /// Profile for [`OperationMode::ModeB`]
    B,
}

/// Work the controller must do when entering a mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provision {
    /// Stop all radios and park them on the neutral channel
    Neutral,
    /// Prepare the first radio for sweeping
    Scanner,
    /// Re-provision the jam coordinator with the slot's profile
    Jammer(JamSlot),
}

#[cfg(feature = "embedded")]
impl defmt::Format for Provision {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Neutral => defmt::write!(f, "neutral"),
            Self::Scanner => defmt::write!(f, "scanner"),
            Self::Jammer(JamSlot::A) => defmt::write!(f, "jammer A"),
            Self::Jammer(JamSlot::B) => defmt::write!(f, "jammer B"),
        }
    }
}

/// The transition table: (current mode, event) → (next mode, provisioning)
#[must_use]
pub const fn transition(mode: OperationMode, event: ModeEvent) -> (OperationMode, Provision) {
    match (mode, event) {
        (OperationMode::Inactive, ModeEvent::Trigger) => (OperationMode::ScanOnly, Provision::Scanner),
        (OperationMode::ScanOnly, ModeEvent::Trigger) => (OperationMode::ModeA, Provision::Jammer(JamSlot::A)),
        (OperationMode::ModeA, ModeEvent::Trigger) => (OperationMode::ModeB, Provision::Jammer(JamSlot::B)),
        (OperationMode::ModeB, ModeEvent::Trigger) => (OperationMode::Inactive, Provision::Neutral),
    }
}

/// Provisioning that puts the radios into `mode` from scratch
#[must_use]
pub const fn entry_provision(mode: OperationMode) -> Provision {
    match mode {
        OperationMode::Inactive => Provision::Neutral,
        OperationMode::ScanOnly => Provision::Scanner,
        OperationMode::ModeA => Provision::Jammer(JamSlot::A),
        OperationMode::ModeB => Provision::Jammer(JamSlot::B),
    }
}

/// An accepted mode change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Mode before the trigger
    pub from: OperationMode,
    /// Mode after the trigger
    pub to: OperationMode,
    /// Work needed to enter `to`
    pub provision: Provision,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Transition {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} -> {} ({})", self.from, self.to, self.provision);
    }
}

/// Current mode, debounce state and the jam profiles bound to modes A and B
pub struct ModeStateMachine {
    mode: OperationMode,
    debouncer: Debouncer,
    profiles: [JamProfile; 2],
}

impl ModeStateMachine {
    /// Start in [`OperationMode::Inactive`] with the built-in profiles
    #[must_use]
    pub const fn new() -> Self {
        Self::with_profiles(JamProfile::ADVERTISING, JamProfile::CLASSIC_SWEEP)
    }

    /// Start in [`OperationMode::Inactive`] with custom profiles for modes A and B
    #[must_use]
    pub const fn with_profiles(mode_a: JamProfile, mode_b: JamProfile) -> Self {
        Self {
            mode: OperationMode::Inactive,
            debouncer: Debouncer::new(BUTTON_DEBOUNCE_MS),
            profiles: [mode_a, mode_b],
        }
    }

    /// Replace the debounce window
    #[must_use]
    pub const fn with_debounce(self, window_ms: u32) -> Self {
        Self {
            debouncer: Debouncer::new(window_ms),
            ..self
        }
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> OperationMode {
        self.mode
    }

    /// Profile bound to a jam slot
    #[must_use]
    pub const fn profile(&self, slot: JamSlot) -> JamProfile {
        match slot {
            JamSlot::A => self.profiles[0],
            JamSlot::B => self.profiles[1],
        }
    }

    /// Handle a trigger timestamp; returns the transition if it was accepted
    pub fn on_trigger(&mut self, at: Millis) -> Option<Transition> {
        if !self.debouncer.accept(at) {
            debug!("trigger at {} bounced", at);
            return None;
        }
        Some(self.apply(ModeEvent::Trigger))
    }

    /// Apply an event through the transition table (no debouncing)
    pub fn apply(&mut self, event: ModeEvent) -> Transition {
        let from = self.mode;
        let (to, provision) = transition(from, event);
        self.mode = to;
        let step = Transition { from, to, provision };
        info!("mode {}", step);
        step
    }
}

impl Default for ModeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
