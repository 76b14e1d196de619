//! Unified error types for the scoring console.
//!
//! Port-level errors ([`GpioError`], [`NotifyError`]) live next to their
//! traits in [`crate::app::ports`].  Startup failures fold into one `Error`
//! that propagates with `?`; a [`NotifyError`] never leaves the worker job
//! that logged it.
//!
//! [`NotifyError`]: crate::app::ports::NotifyError

use core::fmt;

use crate::app::ports::GpioError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The configuration failed validation.
    Config(&'static str),
    /// A pin could not be configured or watched.
    Gpio(GpioError),
    /// A runtime resource (worker thread, timer) could not be created.
    Setup(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Setup(msg) => write!(f, "setup: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
