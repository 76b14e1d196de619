//! Runtime scheduler: pin setup and the coordinating loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Trigger Sources                       │
//! │                                                              │
//! │  ┌────────────┐  ┌────────────┐  ┌──────────────────────┐    │
//! │  │ Button 1   │  │ Button 2   │  │ Scheduler loop       │    │
//! │  │ (GPIO IRQ) │  │ (GPIO IRQ) │  │ every loop_interval  │    │
//! │  └─────┬──────┘  └─────┬──────┘  └───┬──────────────┬───┘    │
//! │        ▼               ▼             ▼              │        │
//! │  ┌───────────────────────────┐  ┌─────────────┐     │        │
//! │  │ DebouncedInput (per pin)  │  │ WorkerPool  │     │        │
//! │  │ confirm after window      │  │ measure()   │     │        │
//! │  └─────────────┬─────────────┘  └──────┬──────┘     │        │
//! │                ▼                       ▼            ▼        │
//! │        on_button_edge()          on_distance()  check_idle() │
//! │                └───────────────┬───────┴────────────┘        │
//! │                                ▼                             │
//! │                         ConsoleService                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use embedded_hal::digital::PinState;
use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::{EdgeTrigger, PinMode, Pull};
use crate::app::scoring::Player;
use crate::app::service::{ConsoleService, Ports};
use crate::config::SystemConfig;
use crate::drivers::debounce::{DebouncedInput, Edge, EdgeMode};
use crate::error::{Error, Result};
use crate::sensors::UltrasonicSensor;

/// Clears the in-flight flag when the sampling job finishes or is dropped
/// without running.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Scheduler {
    service: Arc<ConsoleService>,
    sensor: Arc<UltrasonicSensor>,
    buttons: Vec<(Player, Arc<DebouncedInput>)>,
    sampling: Arc<AtomicBool>,
    ports: Ports,
}

impl Scheduler {
    /// Configure every pin, wire both buttons through their debouncers, and
    /// build the service.  Any GPIO failure here is fatal to the caller.
    pub fn start(config: SystemConfig, ports: Ports) -> Result<Self> {
        config.validate().map_err(Error::Config)?;
        let gpio = &ports.gpio;

        for pins in [config.player_one, config.player_two] {
            gpio.configure(pins.button, PinMode::Input(Pull::Up))?;
            gpio.configure(pins.light, PinMode::Output)?;
            gpio.write(pins.light, PinState::Low);
        }
        gpio.configure(config.sonar_trigger, PinMode::Output)?;
        gpio.write(config.sonar_trigger, PinState::Low);
        gpio.configure(config.sonar_echo, PinMode::Input(Pull::Off))?;

        let sensor = Arc::new(UltrasonicSensor::new(
            Arc::clone(gpio),
            config.sonar_trigger,
            config.sonar_echo,
            config.trigger_pulse,
            config.echo_timeout,
        ));

        let service = ConsoleService::new(config.clone(), ports.clone());

        let mut buttons = Vec::with_capacity(Player::ALL.len());
        for player in Player::ALL {
            let pin = service.player_pins(player).button;
            let svc = Arc::clone(&service);
            let input = DebouncedInput::new(
                pin,
                EdgeMode::Both,
                config.bounce_window,
                Arc::clone(gpio),
                Arc::clone(&ports.tasks),
                Arc::new(move |input: &Arc<DebouncedInput>, edge: Edge| {
                    svc.on_button_edge(player, edge, input);
                }),
            );
            let irq = Arc::clone(&input);
            gpio.watch(
                pin,
                EdgeTrigger::Both,
                Box::new(move |level| irq.on_raw_transition(level)),
            )?;
            info!("Button {:?} on GPIO{} armed", player, input.pin());
            buttons.push((player, input));
        }

        ports.sink.emit(&AppEvent::Started);
        Ok(Self {
            service,
            sensor,
            buttons,
            sampling: Arc::new(AtomicBool::new(false)),
            ports,
        })
    }

    /// One loop iteration: queue a distance sample, then evaluate idleness.
    pub fn tick(&self, now: Instant) {
        self.submit_sample();
        self.service.check_idle(now);
    }

    /// Run forever.  Only a panic leaves this loop.
    pub fn run(&self) -> ! {
        let interval = self.service.config().loop_interval;
        info!("Scheduler loop running every {:?}", interval);
        loop {
            self.tick(Instant::now());
            std::thread::sleep(interval);
        }
    }

    /// Return every pin to its reset state.
    pub fn release(&self) {
        self.ports.gpio.release_all();
    }

    pub fn service(&self) -> &Arc<ConsoleService> {
        &self.service
    }

    pub fn button(&self, player: Player) -> Option<&Arc<DebouncedInput>> {
        self.buttons.iter().find(|(p, _)| *p == player).map(|(_, b)| b)
    }

    /// The sensor is one physical device: skip while a ping is in flight.
    fn submit_sample(&self) {
        if self.sampling.swap(true, Ordering::AcqRel) {
            debug!("Previous distance sample still running, skipping");
            return;
        }
        let guard = InFlight(Arc::clone(&self.sampling));
        let sensor = Arc::clone(&self.sensor);
        let service = Arc::clone(&self.service);
        self.ports.tasks.spawn(
            "distance",
            Box::new(move || {
                let _guard = guard;
                service.on_distance(sensor.measure());
            }),
        );
    }
}
