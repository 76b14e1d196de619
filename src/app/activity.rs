//! Idle/active power state.
//!
//! [`ActivityState`] is a plain value; the shared copy lives inside the
//! [`ConsoleService`](super::service::ConsoleService) lock together with the
//! scoreboard, so check-and-set and the reset that accompanies power-off
//! happen in one critical section.

use std::time::{Duration, Instant};

/// Result of feeding an observation into [`ActivityState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed state.
    None,
    /// Idle → active.  The caller owes exactly one "turn on" side effect.
    PoweredOn,
    /// Active → idle.  The caller owes one "turn off" side effect and a reset.
    PoweredOff,
}

#[derive(Debug, Clone)]
pub struct ActivityState {
    active: bool,
    last_active_at: Instant,
    idle_timeout: Duration,
}

impl ActivityState {
    /// Start in the active state, as if the console had just been used.
    pub fn new(idle_timeout: Duration, now: Instant) -> Self {
        Self {
            active: true,
            last_active_at: now,
            idle_timeout,
        }
    }

    /// Record activity at `now`.
    pub fn mark_active(&mut self, now: Instant) -> Transition {
        // A stale `now` from a slow worker must not move the clock backwards.
        if now > self.last_active_at {
            self.last_active_at = now;
        }
        if self.active {
            Transition::None
        } else {
            self.active = true;
            Transition::PoweredOn
        }
    }

    /// Power down once `now - last_active_at` exceeds the idle timeout.
    pub fn check_idle(&mut self, now: Instant) -> Transition {
        if self.active && now.saturating_duration_since(self.last_active_at) > self.idle_timeout {
            self.active = false;
            Transition::PoweredOff
        } else {
            Transition::None
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_active_at(&self) -> Instant {
        self.last_active_at
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}
