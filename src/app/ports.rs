//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ConsoleService (domain)
//! ```
//!
//! Driven adapters (GPIO, HTTP notifiers, event sinks, task executors)
//! implement these traits.  Every port is shared across the interrupt,
//! timer, and worker threads, so all of them are `Send + Sync` and take
//! `&self`.

use core::fmt;
use core::time::Duration;

use embedded_hal::digital::PinState;

use super::events::AppEvent;
use super::scoring::Scores;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain ↔ pins)
// ───────────────────────────────────────────────────────────────

/// Input bias resistor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Off,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input(Pull),
    Output,
}

/// Which hardware edges invoke a watch callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTrigger {
    Rising,
    Falling,
    Both,
}

/// Invoked from the driver's interrupt thread with the level the edge moved to.
pub type EdgeCallback = Box<dyn Fn(PinState) + Send + Sync + 'static>;

/// Digital pin capability.  The runtime never touches a hardware library
/// directly; the Raspberry Pi and simulated backends both sit behind this.
pub trait GpioPort: Send + Sync {
    /// Claim `pin` and set its direction / bias.
    fn configure(&self, pin: u8, mode: PinMode) -> Result<(), GpioError>;

    /// Current logical level.  Unconfigured pins read `Low`.
    fn read(&self, pin: u8) -> PinState;

    /// Drive an output pin.  Writes to non-output pins are ignored.
    fn write(&self, pin: u8, level: PinState);

    /// Register an edge callback on a configured input pin.
    fn watch(&self, pin: u8, trigger: EdgeTrigger, callback: EdgeCallback)
        -> Result<(), GpioError>;

    /// Stop all watches and return every claimed pin to its reset state.
    fn release_all(&self);
}

// ───────────────────────────────────────────────────────────────
// Notification ports (driven adapters: domain → HTTP)
// ───────────────────────────────────────────────────────────────

/// Local scoreboard display API.
pub trait ScoreboardPort: Send + Sync {
    fn set_scores(&self, scores: Scores) -> Result<(), NotifyError>;
    fn reset(&self) -> Result<(), NotifyError>;
    fn power_on(&self) -> Result<(), NotifyError>;
    fn power_off(&self) -> Result<(), NotifyError>;
}

/// Externally controlled light strip.
pub trait LightingPort: Send + Sync {
    fn set_colour(&self, colour: Argb) -> Result<(), NotifyError>;
    fn set_white(&self, level: u8) -> Result<(), NotifyError>;
    fn set_dimmer(&self, level: u8) -> Result<(), NotifyError>;
}

/// 32-bit colour, rendered for the lighting controller as `#AARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argb(pub u32);

impl Argb {
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    /// Render as the 9-character `#AARRGGBB` form.
    pub fn to_hex(self) -> heapless::String<9> {
        let mut s = heapless::String::new();
        // Nine bytes always fit.
        let _ = fmt::write(&mut s, format_args!("#{:08X}", self.0));
        s
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Task port (driven adapter: domain → worker threads / timers)
// ───────────────────────────────────────────────────────────────

/// A unit of fire-and-forget work.  No result is reported back.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Executes side effects off the calling thread.
///
/// Callers never wait on a job.  Implementations must contain panics so a
/// failing job cannot take down the thread that submitted it.
pub trait TaskPort: Send + Sync {
    /// Run `job` as soon as a worker is free.
    fn spawn(&self, label: &'static str, job: Job);

    /// Run `job` after every job previously submitted here has finished.
    /// Jobs on this lane run one at a time, in submission order.
    fn spawn_serial(&self, label: &'static str, job: Job);

    /// Run `job` once, after `delay` has elapsed, on the same workers as
    /// [`spawn`](Self::spawn).
    fn spawn_after(&self, label: &'static str, delay: Duration, job: Job);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`GpioPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpioError {
    /// The pin does not exist or is claimed by another process.
    PinUnavailable(u8),
    /// `watch` was called on a pin that is not a configured input.
    NotAnInput(u8),
    /// The underlying driver reported an error.
    Driver(String),
}

/// Errors from the notification ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The endpoint answered with a non-2xx status.
    Status(u16),
    /// Connection, DNS, or timeout failure.
    Transport(String),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinUnavailable(pin) => write!(f, "pin {} unavailable", pin),
            Self::NotAnInput(pin) => write!(f, "pin {} is not an input", pin),
            Self::Driver(msg) => write!(f, "driver error: {}", msg),
        }
    }
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP status {}", code),
            Self::Transport(msg) => write!(f, "transport: {}", msg),
        }
    }
}

impl std::error::Error for GpioError {}

impl std::error::Error for NotifyError {}
