//! GPIO adapters.
//!
//! - With `feature = "rpi"`, [`RpiGpio`] drives the Raspberry Pi header
//!   through `rppal`; edge callbacks run on rppal's interrupt thread.
//! - Always available, [`SimGpio`] keeps pin levels in memory.  Inputs are driven
//!   with [`SimGpio::set_input`], which fires watch callbacks like a real
//!   edge would.  Used on development hosts and in tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::PinState;
use log::info;

use crate::app::ports::{EdgeCallback, EdgeTrigger, GpioError, GpioPort, PinMode};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn trigger_fires(trigger: EdgeTrigger, from: PinState, to: PinState) -> bool {
    match trigger {
        EdgeTrigger::Both => from != to,
        EdgeTrigger::Rising => from == PinState::Low && to == PinState::High,
        EdgeTrigger::Falling => from == PinState::High && to == PinState::Low,
    }
}

// ── Simulation ────────────────────────────────────────────────

struct SimPin {
    mode: PinMode,
    level: PinState,
    watch: Option<(EdgeTrigger, Arc<EdgeCallback>)>,
}

/// In-memory GPIO.  Every pin starts `Low`: buttons released, echo silent.
#[derive(Default)]
pub struct SimGpio {
    pins: Mutex<HashMap<u8, SimPin>>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive an input pin from outside, as the wiring would.  Fires the
    /// watch callback (outside the pin lock) when the trigger matches.
    pub fn set_input(&self, pin: u8, level: PinState) {
        let callback = {
            let mut pins = lock(&self.pins);
            let Some(p) = pins.get_mut(&pin) else {
                return;
            };
            if !matches!(p.mode, PinMode::Input(_)) {
                return;
            }
            let from = p.level;
            p.level = level;
            match &p.watch {
                Some((trigger, cb)) if trigger_fires(*trigger, from, level) => Some(Arc::clone(cb)),
                _ => None,
            }
        };
        if let Some(cb) = callback {
            cb(level);
        }
    }

    /// Mode the pin was claimed with, if any.
    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        lock(&self.pins).get(&pin).map(|p| p.mode)
    }

    pub fn is_watched(&self, pin: u8) -> bool {
        lock(&self.pins).get(&pin).is_some_and(|p| p.watch.is_some())
    }
}

impl GpioPort for SimGpio {
    fn configure(&self, pin: u8, mode: PinMode) -> Result<(), GpioError> {
        // BCM numbering on the 40-pin header stops at 27.
        if pin > 27 {
            return Err(GpioError::PinUnavailable(pin));
        }
        lock(&self.pins).insert(
            pin,
            SimPin {
                mode,
                level: PinState::Low,
                watch: None,
            },
        );
        Ok(())
    }

    fn read(&self, pin: u8) -> PinState {
        lock(&self.pins).get(&pin).map_or(PinState::Low, |p| p.level)
    }

    fn write(&self, pin: u8, level: PinState) {
        if let Some(p) = lock(&self.pins).get_mut(&pin) {
            if p.mode == PinMode::Output {
                p.level = level;
            }
        }
    }

    fn watch(&self, pin: u8, trigger: EdgeTrigger, callback: EdgeCallback) -> Result<(), GpioError> {
        let mut pins = lock(&self.pins);
        match pins.get_mut(&pin) {
            Some(p) if matches!(p.mode, PinMode::Input(_)) => {
                p.watch = Some((trigger, Arc::new(callback)));
                Ok(())
            }
            _ => Err(GpioError::NotAnInput(pin)),
        }
    }

    fn release_all(&self) {
        let mut pins = lock(&self.pins);
        info!("gpio(sim): releasing {} pins", pins.len());
        pins.clear();
    }
}

// ── Raspberry Pi ──────────────────────────────────────────────

#[cfg(feature = "rpi")]
pub use rpi::RpiGpio;

#[cfg(feature = "rpi")]
mod rpi {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use embedded_hal::digital::PinState;
    use log::{info, warn};
    use rppal::gpio::{Event, Gpio, InputPin, Level, OutputPin, Trigger};

    use super::lock;
    use crate::app::ports::{EdgeCallback, EdgeTrigger, GpioError, GpioPort, PinMode, Pull};

    enum Claimed {
        Input(InputPin),
        Output(OutputPin),
    }

    fn to_state(level: Level) -> PinState {
        match level {
            Level::High => PinState::High,
            Level::Low => PinState::Low,
        }
    }

    fn to_level(state: PinState) -> Level {
        match state {
            PinState::High => Level::High,
            PinState::Low => Level::Low,
        }
    }

    /// BCM GPIO through `/dev/gpiomem`.  Dropping a claimed pin resets it.
    pub struct RpiGpio {
        gpio: Gpio,
        pins: Mutex<HashMap<u8, Claimed>>,
    }

    impl RpiGpio {
        pub fn new() -> Result<Self, GpioError> {
            let gpio = Gpio::new().map_err(|e| GpioError::Driver(e.to_string()))?;
            info!("gpio(rpi): opened");
            Ok(Self {
                gpio,
                pins: Mutex::new(HashMap::new()),
            })
        }
    }

    impl GpioPort for RpiGpio {
        fn configure(&self, pin: u8, mode: PinMode) -> Result<(), GpioError> {
            let raw = self.gpio.get(pin).map_err(|e| {
                warn!("gpio(rpi): GPIO{}: {}", pin, e);
                GpioError::PinUnavailable(pin)
            })?;
            let claimed = match mode {
                PinMode::Input(Pull::Up) => Claimed::Input(raw.into_input_pullup()),
                PinMode::Input(Pull::Down) => Claimed::Input(raw.into_input_pulldown()),
                PinMode::Input(Pull::Off) => Claimed::Input(raw.into_input()),
                PinMode::Output => Claimed::Output(raw.into_output_low()),
            };
            lock(&self.pins).insert(pin, claimed);
            Ok(())
        }

        fn read(&self, pin: u8) -> PinState {
            match lock(&self.pins).get(&pin) {
                Some(Claimed::Input(p)) => to_state(p.read()),
                Some(Claimed::Output(p)) => PinState::from(p.is_set_high()),
                None => PinState::Low,
            }
        }

        fn write(&self, pin: u8, level: PinState) {
            if let Some(Claimed::Output(p)) = lock(&self.pins).get_mut(&pin) {
                p.write(to_level(level));
            }
        }

        fn watch(
            &self,
            pin: u8,
            trigger: EdgeTrigger,
            callback: EdgeCallback,
        ) -> Result<(), GpioError> {
            let mut pins = lock(&self.pins);
            let Some(Claimed::Input(p)) = pins.get_mut(&pin) else {
                return Err(GpioError::NotAnInput(pin));
            };
            let trigger = match trigger {
                EdgeTrigger::Rising => Trigger::RisingEdge,
                EdgeTrigger::Falling => Trigger::FallingEdge,
                EdgeTrigger::Both => Trigger::Both,
            };
            // Debouncing happens in the domain, so the driver gets none.
            p.set_async_interrupt(trigger, None, move |event: Event| {
                let level = match event.trigger {
                    Trigger::RisingEdge => PinState::High,
                    _ => PinState::Low,
                };
                callback(level);
            })
            .map_err(|e| GpioError::Driver(e.to_string()))
        }

        fn release_all(&self) {
            let mut pins = lock(&self.pins);
            for claimed in pins.values_mut() {
                if let Claimed::Input(p) = claimed {
                    if let Err(e) = p.clear_async_interrupt() {
                        warn!("gpio(rpi): clear interrupt failed: {}", e);
                    }
                }
            }
            info!("gpio(rpi): releasing {} pins", pins.len());
            pins.clear();
        }
    }
}
