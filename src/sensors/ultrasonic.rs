//! HC-SR04 ultrasonic distance sensor.
//!
//! A 10 µs HIGH pulse on TRIG starts a burst; ECHO then stays HIGH for the
//! round-trip time of the sound.  Both waits spin on the echo pin against a
//! single deadline, so [`UltrasonicSensor::measure`] never blocks longer than
//! the pulse plus `echo_timeout`, even with the sensor unplugged.
//!
//! The spin occupies its thread for the whole echo, so measurements belong on
//! a worker, never on the button path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use embedded_hal::digital::PinState;

use crate::app::ports::GpioPort;

/// Speed of sound at ~20 °C, in cm/s.
pub const SPEED_OF_SOUND_CM_S: f32 = 34_300.0;

/// One distance measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSample {
    pub distance_cm: f32,
    pub at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceReading {
    Reading(DistanceSample),
    /// The echo did not start or finish before the deadline.
    Timeout,
}

/// Convert an echo pulse width into a one-way distance.
pub fn echo_to_cm(echo: Duration) -> f32 {
    echo.as_secs_f32() * SPEED_OF_SOUND_CM_S / 2.0
}

pub struct UltrasonicSensor {
    gpio: Arc<dyn GpioPort>,
    trigger_pin: u8,
    echo_pin: u8,
    trigger_pulse: Duration,
    echo_timeout: Duration,
}

impl UltrasonicSensor {
    pub fn new(
        gpio: Arc<dyn GpioPort>,
        trigger_pin: u8,
        echo_pin: u8,
        trigger_pulse: Duration,
        echo_timeout: Duration,
    ) -> Self {
        Self {
            gpio,
            trigger_pin,
            echo_pin,
            trigger_pulse,
            echo_timeout,
        }
    }

    /// Fire one ping and time the echo.
    pub fn measure(&self) -> DistanceReading {
        self.gpio.write(self.trigger_pin, PinState::High);
        spin_for(self.trigger_pulse);
        self.gpio.write(self.trigger_pin, PinState::Low);

        let deadline = Instant::now() + self.echo_timeout;

        let Some(start) = self.wait_for(PinState::High, deadline) else {
            return DistanceReading::Timeout;
        };
        let Some(stop) = self.wait_for(PinState::Low, deadline) else {
            return DistanceReading::Timeout;
        };

        DistanceReading::Reading(DistanceSample {
            distance_cm: echo_to_cm(stop - start),
            at: stop,
        })
    }

    /// Spin until the echo pin reads `level`; returns when it did.
    fn wait_for(&self, level: PinState, deadline: Instant) -> Option<Instant> {
        loop {
            let now = Instant::now();
            if self.gpio.read(self.echo_pin) == level {
                return Some(now);
            }
            if now >= deadline {
                return None;
            }
            std::hint::spin_loop();
        }
    }
}

/// `thread::sleep` overshoots by tens of µs on Linux, so short pulses spin.
fn spin_for(d: Duration) {
    let end = Instant::now() + d;
    while Instant::now() < end {
        std::hint::spin_loop();
    }
}
