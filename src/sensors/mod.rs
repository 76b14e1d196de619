//! Sensor drivers.

pub mod ultrasonic;

pub use ultrasonic::{DistanceReading, DistanceSample, UltrasonicSensor};
