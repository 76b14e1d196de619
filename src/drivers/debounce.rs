//! Interrupt-fed debounced input with deferred confirmation.
//!
//! ## Flow
//!
//! The GPIO driver calls [`DebouncedInput::on_raw_transition`] from its
//! interrupt thread with the level the pin just moved to.  Nothing is
//! reported at that point: a confirmation job is scheduled one bounce window
//! later, which re-reads the pin.
//!
//! | Re-read vs candidate | Re-read vs stable | Result                       |
//! |----------------------|-------------------|------------------------------|
//! | differs              | n/a               | noise, discarded             |
//! | equal                | equal             | nothing to report            |
//! | equal                | differs           | stable updated, edge fired¹  |
//!
//! ¹ only when the direction matches the configured [`EdgeMode`].
//!
//! At most one confirmation per pin is in flight.  Candidates that arrive
//! while one is pending are dropped, which also serialises edge callbacks
//! for the pin.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use embedded_hal::digital::PinState;
use log::trace;

use crate::app::ports::{GpioPort, TaskPort};

/// Which confirmed transitions are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    Rising,
    Falling,
    Both,
}

impl EdgeMode {
    fn matches(self, from: PinState, to: PinState) -> bool {
        match (self, from, to) {
            (Self::Both, a, b) => a != b,
            (Self::Rising, PinState::Low, PinState::High) => true,
            (Self::Falling, PinState::High, PinState::Low) => true,
            _ => false,
        }
    }
}

/// A confirmed, stable transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub pin: u8,
    pub from: PinState,
    pub to: PinState,
}

/// Receives the input that confirmed the edge, so handlers can keep a
/// handle to it (e.g. to check later whether the button is still held).
pub type EdgeHandler = Arc<dyn Fn(&Arc<DebouncedInput>, Edge) + Send + Sync + 'static>;

pub struct DebouncedInput {
    pin: u8,
    mode: EdgeMode,
    window: Duration,
    gpio: Arc<dyn GpioPort>,
    tasks: Arc<dyn TaskPort>,
    /// Last confirmed level (`true` = High).
    stable_high: AtomicBool,
    /// Set while a confirmation job is scheduled.
    pending: AtomicBool,
    on_edge: EdgeHandler,
}

/// Clears the pending flag when the confirmation finishes, even if the
/// edge handler panics.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DebouncedInput {
    /// Wrap `pin`, seeding the stable level from a read of the pin.
    pub fn new(
        pin: u8,
        mode: EdgeMode,
        window: Duration,
        gpio: Arc<dyn GpioPort>,
        tasks: Arc<dyn TaskPort>,
        on_edge: EdgeHandler,
    ) -> Arc<Self> {
        let initial = gpio.read(pin);
        Arc::new(Self {
            pin,
            mode,
            window,
            gpio,
            tasks,
            stable_high: AtomicBool::new(initial == PinState::High),
            pending: AtomicBool::new(false),
            on_edge,
        })
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Last confirmed level.
    pub fn stable_level(&self) -> PinState {
        PinState::from(self.stable_high.load(Ordering::Acquire))
    }

    /// `true` if a confirmation job is scheduled.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Both the filtered level and a fresh read report High.
    pub fn is_held(&self) -> bool {
        self.stable_level() == PinState::High && self.gpio.read(self.pin) == PinState::High
    }

    /// Candidate transition from the interrupt path.  Never blocks.
    pub fn on_raw_transition(self: &Arc<Self>, candidate: PinState) {
        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!("GPIO{}: candidate {:?} ignored, confirmation pending", self.pin, candidate);
            return;
        }
        let this = Arc::clone(self);
        self.tasks.spawn_after(
            "debounce",
            self.window,
            Box::new(move || this.confirm(candidate)),
        );
    }

    fn confirm(self: &Arc<Self>, candidate: PinState) {
        let _guard = PendingGuard(&self.pending);

        let level = self.gpio.read(self.pin);
        if level != candidate {
            trace!("GPIO{}: bounce discarded ({:?} -> {:?})", self.pin, candidate, level);
            return;
        }

        let from = self.stable_level();
        if from == level {
            return;
        }
        self.stable_high.store(level == PinState::High, Ordering::Release);

        if self.mode.matches(from, level) {
            let edge = Edge {
                pin: self.pin,
                from,
                to: level,
            };
            (self.on_edge)(self, edge);
        }
    }
}
