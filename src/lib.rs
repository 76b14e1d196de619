//! Two-player scoring console library.
//!
//! Exposes the domain core, drivers, and adapters so the binary and the
//! host integration tests share one build.  Raspberry Pi GPIO is behind the
//! `rpi` feature; every other module compiles on any host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod scheduler;
pub mod sensors;
