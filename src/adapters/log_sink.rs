//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stderr through `env_logger` in production).  Each line
//! starts with a fixed tag so the output can be grepped per concern.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | console running"),
            AppEvent::PoweredOn => info!("POWER | on"),
            AppEvent::PoweredOff => info!("POWER | off"),
            AppEvent::Scored { player, scores } => {
                info!(
                    "SCORE | player={:?} | {}:{}",
                    player, scores.player_one, scores.player_two
                );
            }
            AppEvent::ScoresReset => info!("SCORE | reset"),
            AppEvent::Presence { distance_cm } => {
                debug!("SONAR | presence at {:.1}cm", distance_cm);
            }
            AppEvent::SensorTimeout => debug!("SONAR | no echo"),
            AppEvent::StuckButton { player } => {
                warn!("BUTTON | player={:?} held past re-arm, scores cleared", player);
            }
        }
    }
}
