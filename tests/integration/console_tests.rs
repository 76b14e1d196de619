//! Integration tests for the scheduler → debouncer → ConsoleService → ports
//! pipeline, run against the mock adapters in `mock_hw`.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::digital::PinState;
use scoreconsole::app::events::AppEvent;
use scoreconsole::app::ports::{Argb, GpioError, Job, PinMode, Pull, TaskPort};
use scoreconsole::app::scoring::{Player, Scores};
use scoreconsole::app::service::{ConsoleService, Ports};
use scoreconsole::config::SystemConfig;
use scoreconsole::drivers::worker_pool::WorkerPool;
use scoreconsole::error::Error;
use scoreconsole::scheduler::Scheduler;
use scoreconsole::sensors::{DistanceReading, DistanceSample};

use crate::mock_hw::{Call, Harness};

const P1_BUTTON: u8 = 17;
const P1_LIGHT: u8 = 27;
const P2_LIGHT: u8 = 21;

fn scores(a: u32, b: u32) -> Scores {
    Scores {
        player_one: a,
        player_two: b,
    }
}

fn sample(cm: f32, at: Instant) -> DistanceReading {
    DistanceReading::Reading(DistanceSample { distance_cm: cm, at })
}

fn service(h: &Harness) -> Arc<ConsoleService> {
    ConsoleService::new(SystemConfig::default(), h.ports())
}

/// Scoreboard and lighting calls, minus the colour commands.
fn scoreboard_calls(h: &Harness) -> Vec<Call> {
    h.notifier
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, Call::Colour(_)))
        .collect()
}

fn wait_until(cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while !cond() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
}

// ── Scoring ──────────────────────────────────────────────────

#[test]
fn two_scores_then_reset() {
    let h = Harness::new();
    let svc = service(&h);

    assert_eq!(svc.apply_score(Player::One), scores(1, 0));
    assert_eq!(svc.apply_score(Player::One), scores(2, 0));
    svc.reset();
    assert_eq!(svc.scores(), scores(0, 0));

    assert_eq!(
        scoreboard_calls(&h),
        vec![Call::SetScores(scores(1, 0)), Call::SetScores(scores(2, 0)), Call::Reset]
    );
}

#[test]
fn score_flashes_then_reverts_after_hold() {
    let h = Harness::new();
    let svc = service(&h);

    svc.apply_score(Player::Two);
    assert_eq!(h.notifier.count(Call::Colour(Argb::WHITE)), 1);
    assert_eq!(h.tasks.pending("flash-off"), vec![Duration::from_secs(1)]);

    assert_eq!(h.tasks.run_deferred("flash-off"), 1);
    assert_eq!(h.notifier.count(Call::Colour(Argb::WHITE)), 2);
}

#[test]
fn notification_failures_stay_contained() {
    let h = Harness::new();
    h.notifier.offline.store(true, Ordering::SeqCst);
    let svc = service(&h);

    assert_eq!(svc.apply_score(Player::Two), scores(0, 1));
    svc.reset();
    assert_eq!(svc.scores(), scores(0, 0));
    assert!(h.notifier.count(Call::Reset) == 1, "call attempted even when offline");
}

// ── Activity ─────────────────────────────────────────────────

#[test]
fn idle_check_fires_once_with_reset() {
    let h = Harness::new();
    let t0 = Instant::now();
    let svc = service(&h);
    svc.apply_score(Player::One);

    assert!(!svc.check_idle(t0 + Duration::from_secs(4)));
    assert!(svc.check_idle(t0 + Duration::from_secs(6)));
    assert!(!svc.check_idle(t0 + Duration::from_secs(7)));
    assert!(!svc.check_idle(t0 + Duration::from_secs(60)));

    assert!(!svc.is_active());
    assert_eq!(svc.scores(), scores(0, 0));
    assert_eq!(h.notifier.count(Call::Off), 1);
    assert_eq!(h.notifier.count(Call::Reset), 1);
    assert_eq!(h.sink.count(|e| *e == AppEvent::PoweredOff), 1);
}

#[test]
fn concurrent_activity_powers_on_once() {
    let h = Harness::new();
    let svc = service(&h);
    assert!(svc.check_idle(Instant::now() + Duration::from_secs(6)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let svc = Arc::clone(&svc);
            thread::spawn(move || svc.mark_active())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(svc.is_active());
    assert_eq!(h.notifier.count(Call::On), 1);
    assert_eq!(h.sink.count(|e| *e == AppEvent::PoweredOn), 1);
}

#[test]
fn both_players_scoring_from_idle_powers_on_once() {
    let h = Harness::new();
    let svc = service(&h);
    assert!(svc.check_idle(Instant::now() + Duration::from_secs(6)));

    let handles: Vec<_> = Player::ALL
        .into_iter()
        .flat_map(|p| std::iter::repeat_n(p, 4))
        .map(|player| {
            let svc = Arc::clone(&svc);
            thread::spawn(move || {
                for _ in 0..25 {
                    svc.apply_score(player);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(svc.is_active());
    assert_eq!(svc.scores(), scores(100, 100));
    assert_eq!(h.notifier.count(Call::On), 1);

    let calls = scoreboard_calls(&h);
    let sets: Vec<Scores> = calls
        .iter()
        .filter_map(|c| match c {
            Call::SetScores(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(sets.len(), 200);
    assert_eq!(sets.last(), Some(&scores(100, 100)), "last /set carries the final totals");
    assert_eq!(&calls[..3], &[Call::Off, Call::Reset, Call::On]);
}

/// Queues every job until the test runs them, and starts a competing
/// `mark_active` the moment the power-off call is queued.
#[derive(Default)]
struct RacingTasks {
    queued: Mutex<Vec<Job>>,
    service: OnceLock<Weak<ConsoleService>>,
    racer: Mutex<Option<thread::JoinHandle<()>>>,
}

impl RacingTasks {
    fn run_queued(&self) {
        let jobs: Vec<Job> = std::mem::take(&mut *self.queued.lock().unwrap());
        for job in jobs {
            job();
        }
    }
}

impl TaskPort for RacingTasks {
    fn spawn(&self, _label: &'static str, job: Job) {
        self.queued.lock().unwrap().push(job);
    }

    fn spawn_serial(&self, label: &'static str, job: Job) {
        self.queued.lock().unwrap().push(job);
        if label == "scoreboard-off" {
            let svc = self.service.get().and_then(Weak::upgrade).unwrap();
            *self.racer.lock().unwrap() = Some(thread::spawn(move || svc.mark_active()));
        }
    }

    fn spawn_after(&self, _label: &'static str, _delay: Duration, _job: Job) {}
}

#[test]
fn activity_racing_power_down_is_reported_last() {
    let h = Harness::new();
    let tasks = Arc::new(RacingTasks::default());
    let svc = ConsoleService::new(
        SystemConfig::default(),
        Ports {
            tasks: tasks.clone(),
            ..h.ports()
        },
    );
    tasks.service.set(Arc::downgrade(&svc)).unwrap();

    assert!(svc.check_idle(Instant::now() + Duration::from_secs(6)));
    let racer = tasks.racer.lock().unwrap().take().unwrap();
    racer.join().unwrap();
    tasks.run_queued();

    assert!(svc.is_active());
    assert_eq!(h.notifier.calls(), vec![Call::Off, Call::Reset, Call::On]);
}

#[test]
fn close_sample_wakes_far_sample_does_not_sleep() {
    let h = Harness::new();
    let t0 = Instant::now();
    let svc = service(&h);
    assert!(svc.check_idle(t0 + Duration::from_secs(6)));

    svc.on_distance(sample(50.0, t0 + Duration::from_secs(7)));
    assert!(svc.is_active());
    assert_eq!(h.notifier.count(Call::On), 1);

    svc.on_distance(sample(150.0, t0 + Duration::from_secs(8)));
    assert!(svc.is_active());
    assert_eq!(h.notifier.count(Call::Off), 1, "only the earlier idle power-down");
    assert_eq!(h.notifier.count(Call::On), 1);
}

#[test]
fn sensor_timeout_is_reported_not_acted_on() {
    let h = Harness::new();
    let svc = service(&h);
    svc.on_distance(DistanceReading::Timeout);
    assert!(svc.is_active());
    assert_eq!(h.sink.count(|e| *e == AppEvent::SensorTimeout), 1);
    assert!(h.notifier.calls().is_empty());
}

// ── Scheduler wiring ─────────────────────────────────────────

#[test]
fn start_configures_every_pin() {
    let h = Harness::new();
    let _s = Scheduler::start(SystemConfig::default(), h.ports()).unwrap();

    assert_eq!(h.gpio.mode(17), Some(PinMode::Input(Pull::Up)));
    assert_eq!(h.gpio.mode(20), Some(PinMode::Input(Pull::Up)));
    assert_eq!(h.gpio.mode(27), Some(PinMode::Output));
    assert_eq!(h.gpio.mode(21), Some(PinMode::Output));
    assert_eq!(h.gpio.mode(18), Some(PinMode::Output));
    assert_eq!(h.gpio.mode(24), Some(PinMode::Input(Pull::Off)));
    assert!(h.gpio.is_watched(17));
    assert!(h.gpio.is_watched(20));
    assert!(!h.gpio.is_watched(24));
    assert_eq!(h.sink.count(|e| *e == AppEvent::Started), 1);
}

#[test]
fn busy_pin_fails_startup() {
    let h = Harness::new();
    h.gpio.busy.lock().unwrap().push(18);
    let err = Scheduler::start(SystemConfig::default(), h.ports()).err();
    assert_eq!(err, Some(Error::Gpio(GpioError::PinUnavailable(18))));
}

#[test]
fn invalid_config_fails_startup() {
    let h = Harness::new();
    let config = SystemConfig {
        worker_count: 0,
        ..SystemConfig::default()
    };
    assert!(matches!(
        Scheduler::start(config, h.ports()),
        Err(Error::Config(_))
    ));
}

#[test]
fn press_scores_and_lights_lamps() {
    let h = Harness::new();
    let s = Scheduler::start(SystemConfig::default(), h.ports()).unwrap();

    h.gpio.edge(P1_BUTTON, PinState::High);
    assert_eq!(s.service().scores(), scores(0, 0), "nothing before the window");
    assert_eq!(h.tasks.run_deferred("debounce"), 1);

    assert_eq!(s.service().scores(), scores(1, 0));
    assert_eq!(h.gpio.level(P1_LIGHT), PinState::High);
    assert_eq!(h.gpio.level(P2_LIGHT), PinState::High);

    h.gpio.edge(P1_BUTTON, PinState::Low);
    h.tasks.run_deferred("debounce");
    assert_eq!(h.gpio.level(P1_LIGHT), PinState::Low);
    assert_eq!(h.gpio.level(P2_LIGHT), PinState::Low);

    // Released before the re-arm delay: score stands.
    h.tasks.run_deferred("rearm");
    assert_eq!(s.service().scores(), scores(1, 0));
}

#[test]
fn bouncing_press_scores_once() {
    let h = Harness::new();
    let s = Scheduler::start(SystemConfig::default(), h.ports()).unwrap();

    for level in [PinState::High, PinState::Low, PinState::High, PinState::Low, PinState::High] {
        h.gpio.edge(P1_BUTTON, level);
    }
    h.tasks.run_deferred("debounce");
    assert_eq!(s.service().scores(), scores(1, 0));
    assert_eq!(h.tasks.run_deferred("debounce"), 0);
}

#[test]
fn held_button_past_rearm_resets() {
    let h = Harness::new();
    let s = Scheduler::start(SystemConfig::default(), h.ports()).unwrap();

    h.gpio.edge(P1_BUTTON, PinState::High);
    h.tasks.run_deferred("debounce");
    assert_eq!(s.service().scores(), scores(1, 0));
    assert_eq!(h.tasks.pending("rearm"), vec![Duration::from_millis(2500)]);

    h.tasks.run_deferred("rearm");
    assert!(s.service().is_active());
    assert_eq!(s.service().scores(), scores(0, 0));
    assert_eq!(h.sink.count(|e| *e == AppEvent::StuckButton { player: Player::One }), 1);
    assert_eq!(h.notifier.count(Call::Reset), 1);
}

#[test]
fn held_button_after_power_down_wakes_then_resets() {
    let h = Harness::new();
    let s = Scheduler::start(SystemConfig::default(), h.ports()).unwrap();
    assert!(s.service().check_idle(Instant::now() + Duration::from_secs(6)));
    assert!(!s.service().is_active());

    h.gpio.edge(P1_BUTTON, PinState::High);
    h.tasks.run_deferred("debounce");
    assert!(s.service().is_active());
    assert_eq!(s.service().scores(), scores(1, 0));

    h.tasks.run_deferred("rearm");
    assert!(s.service().is_active());
    assert_eq!(s.service().scores(), scores(0, 0));
    assert_eq!(h.sink.count(|e| *e == AppEvent::StuckButton { player: Player::One }), 1);
    assert_eq!(
        scoreboard_calls(&h),
        vec![
            Call::Off,
            Call::Reset,
            Call::On,
            Call::SetScores(scores(1, 0)),
            Call::Reset
        ]
    );
}

#[test]
fn tick_with_silent_sensor_reports_timeout_each_time() {
    let h = Harness::new();
    let s = Scheduler::start(SystemConfig::default(), h.ports()).unwrap();

    s.tick(Instant::now());
    s.tick(Instant::now());
    assert_eq!(h.sink.count(|e| *e == AppEvent::SensorTimeout), 2);
    assert!(s.service().is_active());
}

#[test]
fn release_returns_pins() {
    let h = Harness::new();
    let s = Scheduler::start(SystemConfig::default(), h.ports()).unwrap();
    s.release();
    assert!(h.gpio.released());
    assert!(!h.gpio.is_watched(P1_BUTTON));
}

// ── Real worker pool ─────────────────────────────────────────

#[test]
fn notifications_run_on_the_worker_pool() {
    let h = Harness::new();
    let ports = Ports {
        tasks: Arc::new(WorkerPool::start(2).unwrap()),
        ..h.ports()
    };
    let svc = ConsoleService::new(SystemConfig::default(), ports);
    svc.apply_score(Player::Two);

    let deadline = Instant::now() + Duration::from_secs(2);
    while h.notifier.count(Call::SetScores(scores(0, 1))) == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(h.notifier.count(Call::SetScores(scores(0, 1))), 1);
}

#[test]
fn flash_is_never_overtaken_by_its_revert() {
    let h = Harness::new();
    let pool = Arc::new(WorkerPool::start(1).unwrap());
    // Keep the only worker busy so the flash waits in the queue.
    pool.spawn("busy", Box::new(|| thread::sleep(Duration::from_millis(300))));

    let config = SystemConfig {
        flash_colour: 0xFFFF_0000,
        rest_colour: 0xFF00_00FF,
        flash_hold: Duration::from_millis(20),
        ..SystemConfig::default()
    };
    let svc = ConsoleService::new(
        config,
        Ports {
            tasks: pool.clone(),
            ..h.ports()
        },
    );
    svc.apply_score(Player::One);

    let colours = || {
        h.notifier
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Colour(_)))
            .collect::<Vec<_>>()
    };
    wait_until(|| colours().len() == 2);
    assert_eq!(
        colours(),
        vec![Call::Colour(Argb(0xFFFF_0000)), Call::Colour(Argb(0xFF00_00FF))]
    );
}
