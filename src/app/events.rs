//! Outbound application events.
//!
//! The [`ConsoleService`](super::service::ConsoleService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.

use super::scoring::{Player, Scores};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The runtime finished setup and entered its loop.
    Started,

    /// Idle → active.  Fired once per transition.
    PoweredOn,

    /// Active → idle after the idle timeout.
    PoweredOff,

    /// A player's button registered a point.
    Scored { player: Player, scores: Scores },

    /// Both counters were zeroed.
    ScoresReset,

    /// A distance sample came in under the presence threshold.
    Presence { distance_cm: f32 },

    /// The ultrasonic echo never arrived within the bound.
    SensorTimeout,

    /// A button was still held when its re-arm delay expired.
    StuckButton { player: Player },
}
