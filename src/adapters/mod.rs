//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                     |
//! |------------|-----------------|---------------------------------|
//! | `gpio`     | GpioPort        | rppal (`rpi`) / in-memory pins  |
//! | `http`     | ScoreboardPort  | Scoreboard HTTP API             |
//! |            | LightingPort    | Light strip HTTP console        |
//! | `log_sink` | EventSink       | `log` facade                    |
//!
//! The [`TaskPort`](crate::app::ports::TaskPort) implementation lives in
//! [`drivers::worker_pool`](crate::drivers::worker_pool).

pub mod gpio;
pub mod http;
pub mod log_sink;

/// GPIO backend selected at build time.
#[cfg(feature = "rpi")]
pub type PlatformGpio = gpio::RpiGpio;
#[cfg(not(feature = "rpi"))]
pub type PlatformGpio = gpio::SimGpio;
