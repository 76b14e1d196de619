//! GPIO pin assignments for the scoring console (BCM numbering).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Player buttons (input, internal pull-up; HIGH = pressed)
// ---------------------------------------------------------------------------

/// Player one push-button.
pub const BUTTON_ONE_GPIO: u8 = 17;
/// Player two push-button.
pub const BUTTON_TWO_GPIO: u8 = 20;

// ---------------------------------------------------------------------------
// Button indicator lights (output)
// ---------------------------------------------------------------------------

pub const BUTTON_ONE_LIGHT_GPIO: u8 = 27;
pub const BUTTON_TWO_LIGHT_GPIO: u8 = 21;

// ---------------------------------------------------------------------------
// HC-SR04 ultrasonic presence sensor
// ---------------------------------------------------------------------------

/// Digital output: 10 µs HIGH pulse starts a measurement.
pub const SONAR_TRIGGER_GPIO: u8 = 18;
/// Digital input: HIGH for the round-trip time of the ultrasonic burst.
pub const SONAR_ECHO_GPIO: u8 = 24;
