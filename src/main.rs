//! Scoring Console: main entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  PlatformGpio      HttpNotifier        LogEventSink            │
//! │  (GpioPort)        (Scoreboard+Light)  (EventSink)             │
//! │  WorkerPool                                                    │
//! │  (TaskPort)                                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ConsoleService (pure logic)                 │    │
//! │  │  ActivityState · ScoreBoard                            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (sampling + idle loop) · DebouncedInput per button  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{error, info};

use scoreconsole::adapters::http::HttpNotifier;
use scoreconsole::adapters::log_sink::LogEventSink;
use scoreconsole::adapters::PlatformGpio;
use scoreconsole::app::ports::GpioPort;
use scoreconsole::app::service::Ports;
use scoreconsole::config::SystemConfig;
use scoreconsole::drivers::worker_pool::WorkerPool;
use scoreconsole::scheduler::Scheduler;

#[cfg(feature = "rpi")]
fn open_gpio() -> Result<PlatformGpio> {
    PlatformGpio::new().context("opening GPIO")
}

#[cfg(not(feature = "rpi"))]
fn open_gpio() -> Result<PlatformGpio> {
    log::warn!("Built without `rpi`: using simulated GPIO");
    Ok(PlatformGpio::new())
}

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  Scoring Console v{}              ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config ─────────────────────────────────────────────
    let config = SystemConfig::default();
    info!(
        "Config: {}",
        serde_json::to_string(&config).context("serialising config")?
    );

    // ── 3. Construct adapters ─────────────────────────────────
    let gpio: Arc<dyn GpioPort> = Arc::new(open_gpio()?);
    let notifier = Arc::new(HttpNotifier::new(
        &config.scoreboard_url,
        &config.lighting_url,
        config.http_timeout,
    ));
    let pool = match WorkerPool::start(config.worker_count) {
        Ok(p) => p,
        Err(e) => {
            error!("Worker pool failed: {}", e);
            gpio.release_all();
            std::process::exit(1);
        }
    };
    info!("Worker pool: {} threads", pool.size());

    let ports = Ports {
        gpio: Arc::clone(&gpio),
        scoreboard: notifier.clone(),
        lighting: notifier,
        tasks: Arc::new(pool),
        sink: Arc::new(LogEventSink::new()),
    };

    // ── 4. Pins, debouncers, service ──────────────────────────
    let scheduler = match Scheduler::start(config, ports) {
        Ok(s) => s,
        Err(e) => {
            error!("Startup failed: {}", e);
            gpio.release_all();
            std::process::exit(1);
        }
    };
    info!("Console ready");

    // ── 5. Main loop ──────────────────────────────────────────
    // `run` never returns; only a panic gets here.
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        scheduler.run();
    }));
    if let Err(panic) = outcome {
        let msg = panic
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string panic>");
        error!("Main loop panicked: {}", msg);
    }
    scheduler.release();
    std::process::exit(1);
}
