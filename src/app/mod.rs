//! Application core: domain logic behind port traits.
//!
//! Activity tracking, scoring, and the service that ties them to the
//! outside world.  All interaction with pins, HTTP, and threads happens
//! through the traits in [`ports`], keeping this layer testable with mock
//! adapters.

pub mod activity;
pub mod events;
pub mod ports;
pub mod scoring;
pub mod service;
