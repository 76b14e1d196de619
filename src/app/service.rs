//! Console service: the hexagonal core.
//!
//! [`ConsoleService`] owns the activity state and the scoreboard behind a
//! single lock and turns their transitions into port calls.  It is shared
//! by `Arc` between the GPIO interrupt threads, the debounce / re-arm
//! timers, the sampling workers, and the scheduler loop.
//!
//! ```text
//!  button edge ──▶ ┌──────────────────────────┐ ──▶ ScoreboardPort
//!  distance    ──▶ │      ConsoleService      │ ──▶ LightingPort
//!  idle check  ──▶ │ ActivityState·ScoreBoard │ ──▶ GpioPort (lamps)
//!                  └──────────────────────────┘ ──▶ EventSink
//! ```
//!
//! Outbound notifications never run on the caller's thread: each one is a
//! fire-and-forget job on the [`TaskPort`].  Failures are logged there.
//! Scoreboard calls go to the serial lane and are submitted while the state
//! lock is held, so the display sees `/on`, `/off`, `/reset` and `/set` in
//! the order the transitions happened.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use embedded_hal::digital::PinState;
use log::{info, warn};

use crate::config::{PlayerPins, SystemConfig};
use crate::drivers::debounce::{DebouncedInput, Edge};
use crate::sensors::DistanceReading;

use super::activity::{ActivityState, Transition};
use super::events::AppEvent;
use super::ports::{
    Argb, EventSink, GpioPort, LightingPort, NotifyError, ScoreboardPort, TaskPort,
};
use super::scoring::{Player, ScoreBoard, Scores};

/// Adapters the service drives.
#[derive(Clone)]
pub struct Ports {
    pub gpio: Arc<dyn GpioPort>,
    pub scoreboard: Arc<dyn ScoreboardPort>,
    pub lighting: Arc<dyn LightingPort>,
    pub tasks: Arc<dyn TaskPort>,
    pub sink: Arc<dyn EventSink>,
}

/// Everything that must change together.
struct ConsoleState {
    activity: ActivityState,
    board: ScoreBoard,
}

pub struct ConsoleService {
    state: Mutex<ConsoleState>,
    ports: Ports,
    config: SystemConfig,
}

impl ConsoleService {
    /// Start active with zero scores, as if the console was just used.
    pub fn new(config: SystemConfig, ports: Ports) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ConsoleState {
                activity: ActivityState::new(config.idle_timeout, Instant::now()),
                board: ScoreBoard::new(),
            }),
            ports,
            config,
        })
    }

    // ── Activity ──────────────────────────────────────────────

    pub fn mark_active(&self) {
        self.mark_active_at(Instant::now());
    }

    /// Refresh the activity timestamp; powers on from idle exactly once.
    pub fn mark_active_at(&self, now: Instant) {
        let mut state = self.state();
        if state.activity.mark_active(now) == Transition::PoweredOn {
            self.powered_on();
        }
    }

    /// Power down if the idle timeout has elapsed.  Returns `true` on the
    /// active → idle transition.
    pub fn check_idle(&self, now: Instant) -> bool {
        let mut state = self.state();
        if state.activity.check_idle(now) != Transition::PoweredOff {
            return false;
        }
        state.board.reset();

        info!("Console idle, powering down");
        self.ports.sink.emit(&AppEvent::PoweredOff);
        self.notify_scoreboard("scoreboard-off", |sb| sb.power_off());
        self.scores_reset();
        true
    }

    /// Feed one distance measurement.  Only close readings count; a far
    /// reading never powers anything down.
    pub fn on_distance(&self, reading: DistanceReading) {
        match reading {
            DistanceReading::Reading(sample) if sample.distance_cm < self.config.distance_threshold_cm => {
                self.ports.sink.emit(&AppEvent::Presence {
                    distance_cm: sample.distance_cm,
                });
                self.mark_active_at(sample.at);
            }
            DistanceReading::Reading(_) => {}
            DistanceReading::Timeout => self.ports.sink.emit(&AppEvent::SensorTimeout),
        }
    }

    // ── Scoring ───────────────────────────────────────────────

    /// One point for `player`, then push the totals and flash the strip.
    pub fn apply_score(&self, player: Player) -> Scores {
        let scores = {
            let mut state = self.state();
            let transition = state.activity.mark_active(Instant::now());
            let scores = state.board.apply(player);
            if transition == Transition::PoweredOn {
                self.powered_on();
            }
            info!("Player {:?} scored -> {}:{}", player, scores.player_one, scores.player_two);
            self.ports.sink.emit(&AppEvent::Scored { player, scores });
            self.notify_scoreboard("scoreboard-set", move |sb| sb.set_scores(scores));
            scores
        };
        self.flash();
        scores
    }

    /// Zero both counters and tell the scoreboard.
    pub fn reset(&self) {
        let mut state = self.state();
        state.board.reset();
        self.scores_reset();
    }

    /// Debounced edge from a player's button.
    ///
    /// A press lights both lamps, scores, and arms the re-arm check; a
    /// release turns the lamps off.
    pub fn on_button_edge(self: &Arc<Self>, player: Player, edge: Edge, button: &Arc<DebouncedInput>) {
        match edge.to {
            PinState::High => {
                self.set_lamps(PinState::High);
                self.apply_score(player);

                let this = Arc::clone(self);
                let button = Arc::clone(button);
                self.ports.tasks.spawn_after(
                    "rearm",
                    self.config.rearm_delay,
                    Box::new(move || this.rearm_check(player, &button)),
                );
            }
            PinState::Low => self.set_lamps(PinState::Low),
        }
    }

    /// A button still held after the re-arm delay is treated as stuck: force
    /// the console on and clear the scores.
    pub fn rearm_check(&self, player: Player, button: &DebouncedInput) {
        if !button.is_held() {
            return;
        }
        warn!("Player {:?} button held past re-arm delay, resetting", player);
        self.ports.sink.emit(&AppEvent::StuckButton { player });
        self.mark_active();
        self.reset();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn scores(&self) -> Scores {
        self.state().board.scores()
    }

    pub fn is_active(&self) -> bool {
        self.state().activity.is_active()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn player_pins(&self, player: Player) -> PlayerPins {
        match player {
            Player::One => self.config.player_one,
            Player::Two => self.config.player_two,
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn state(&self) -> MutexGuard<'_, ConsoleState> {
        // Field writes finish before any port call in a critical section,
        // so a panicking port leaves the state consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn powered_on(&self) {
        info!("Console active, powering up");
        self.ports.sink.emit(&AppEvent::PoweredOn);
        self.notify_scoreboard("scoreboard-on", |sb| sb.power_on());
    }

    fn scores_reset(&self) {
        self.ports.sink.emit(&AppEvent::ScoresReset);
        self.notify_scoreboard("scoreboard-reset", |sb| sb.reset());
    }

    fn set_lamps(&self, level: PinState) {
        for player in Player::ALL {
            self.ports.gpio.write(self.player_pins(player).light, level);
        }
    }

    /// Flash colour now; the hold only starts once the strip has taken it,
    /// so the rest colour can never arrive first.
    fn flash(&self) {
        let flash = Argb(self.config.flash_colour);
        let rest = Argb(self.config.rest_colour);
        let hold = self.config.flash_hold;
        let lighting = Arc::clone(&self.ports.lighting);
        let tasks = Arc::clone(&self.ports.tasks);
        self.ports.tasks.spawn(
            "flash-on",
            Box::new(move || {
                if let Err(e) = lighting.set_colour(flash) {
                    warn!("flash-on: {}", e);
                }
                tasks.spawn_after(
                    "flash-off",
                    hold,
                    Box::new(move || {
                        if let Err(e) = lighting.set_colour(rest) {
                            warn!("flash-off: {}", e);
                        }
                    }),
                );
            }),
        );
    }

    /// Queue a scoreboard call on the serial lane.  Callers that report a
    /// state transition hold the state lock while calling this.
    fn notify_scoreboard<F>(&self, label: &'static str, call: F)
    where
        F: FnOnce(&dyn ScoreboardPort) -> Result<(), NotifyError> + Send + 'static,
    {
        let scoreboard = Arc::clone(&self.ports.scoreboard);
        self.ports.tasks.spawn_serial(
            label,
            Box::new(move || {
                if let Err(e) = call(scoreboard.as_ref()) {
                    warn!("{}: {}", label, e);
                }
            }),
        );
    }
}
