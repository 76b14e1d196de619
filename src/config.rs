//! System configuration parameters
//!
//! All thresholds and timings for the scoring console. These are fixed at
//! build time; the binary only logs the effective values at startup.

use core::time::Duration;

use serde::Serialize;

use crate::pins;

/// Pin map for one player's button and indicator light.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlayerPins {
    pub button: u8,
    pub light: u8,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize)]
pub struct SystemConfig {
    // --- Pins ---
    pub player_one: PlayerPins,
    pub player_two: PlayerPins,
    pub sonar_trigger: u8,
    pub sonar_echo: u8,

    // --- Buttons ---
    /// Time a raw transition must hold before the confirmatory read.
    pub bounce_window: Duration,
    /// Grace period after a score during which a still-held button forces a reset.
    pub rearm_delay: Duration,

    // --- Presence sensor ---
    /// Samples closer than this (cm) count as activity.
    pub distance_threshold_cm: f32,
    /// Upper bound on one echo measurement (30 ms ≈ 5 m).
    pub echo_timeout: Duration,
    /// Width of the trigger pulse.
    pub trigger_pulse: Duration,

    // --- Activity ---
    /// Inactivity after which the console powers down and resets scores.
    pub idle_timeout: Duration,

    // --- Runtime ---
    /// Worker threads for sampling and outbound notifications.
    pub worker_count: usize,
    /// Pause between scheduler loop iterations.
    pub loop_interval: Duration,

    // --- Notifications ---
    pub scoreboard_url: &'static str,
    pub lighting_url: &'static str,
    /// Per-request timeout for scoreboard and lighting calls.
    pub http_timeout: Duration,
    /// Colour shown while a score flash is held.
    pub flash_colour: u32,
    /// Colour restored after the flash.
    pub rest_colour: u32,
    /// How long the flash colour is held.
    pub flash_hold: Duration,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Pins
            player_one: PlayerPins {
                button: pins::BUTTON_ONE_GPIO,
                light: pins::BUTTON_ONE_LIGHT_GPIO,
            },
            player_two: PlayerPins {
                button: pins::BUTTON_TWO_GPIO,
                light: pins::BUTTON_TWO_LIGHT_GPIO,
            },
            sonar_trigger: pins::SONAR_TRIGGER_GPIO,
            sonar_echo: pins::SONAR_ECHO_GPIO,

            // Buttons
            bounce_window: Duration::from_millis(5),
            rearm_delay: Duration::from_millis(2500),

            // Presence sensor
            distance_threshold_cm: 100.0,
            echo_timeout: Duration::from_millis(30),
            trigger_pulse: Duration::from_micros(10),

            // Activity
            idle_timeout: Duration::from_secs(5),

            // Runtime
            worker_count: 5,
            loop_interval: Duration::from_millis(50),

            // Notifications
            scoreboard_url: "http://localhost:5000/api",
            lighting_url: "http://192.168.43.64",
            http_timeout: Duration::from_secs(2),
            flash_colour: 0xFFFF_FFFF,
            rest_colour: 0xFFFF_FFFF,
            flash_hold: Duration::from_secs(1),
        }
    }
}

impl SystemConfig {
    /// Reject combinations the runtime cannot honour.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.worker_count == 0 {
            return Err("worker_count must be at least 1");
        }
        if self.distance_threshold_cm <= 0.0 {
            return Err("distance_threshold_cm must be positive");
        }
        if self.echo_timeout.is_zero() {
            return Err("echo_timeout must be non-zero");
        }
        if self.bounce_window >= self.rearm_delay {
            return Err("bounce_window must be shorter than rearm_delay");
        }
        let pins = [
            self.player_one.button,
            self.player_one.light,
            self.player_two.button,
            self.player_two.light,
            self.sonar_trigger,
            self.sonar_echo,
        ];
        for (i, a) in pins.iter().enumerate() {
            if pins[i + 1..].contains(a) {
                return Err("pin assigned twice");
            }
        }
        Ok(())
    }
}
