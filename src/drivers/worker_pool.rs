//! Named worker threads and one-shot timers behind [`TaskPort`].
//!
//! Each worker owns a bounded `embassy-sync` channel and parks on it with
//! `futures_lite::future::block_on`, so an idle worker costs no CPU.
//! Submissions round-robin across workers and spill to the next queue when
//! one is full.  One extra worker drains the serial lane, so jobs submitted
//! there finish in submission order.
//!
//! ```text
//!  spawn() ──────▶ ┌ queue 0 ┐──▶ worker-0
//!                  ├ queue 1 ┤──▶ worker-1
//!                  │   ...   │
//!                  └ queue N ┘──▶ worker-N
//!        ▲
//!        └── spawn_after() ◀── timer thread (sleep, hand over, exit)
//!
//!  spawn_serial() ──▶ serial queue ──▶ worker-serial
//! ```
//!
//! Every job runs under `catch_unwind`; a panicking job is logged and the
//! thread carries on.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::{error, info, warn};

use crate::app::ports::{Job, TaskPort};
use crate::error::Error;

/// Pending jobs per worker.
pub const QUEUE_DEPTH: usize = 8;

/// Pending jobs on the serial lane.
pub const SERIAL_DEPTH: usize = 32;

/// Stack for worker and timer threads.
const STACK_KB: usize = 64;

enum Message {
    Run(&'static str, Job),
    Stop,
}

type Queue<const N: usize> = Channel<CriticalSectionRawMutex, Message, N>;

/// Spawn a named thread with an explicit stack size.
pub fn spawn_named(
    name: String,
    stack_kb: usize,
    f: impl FnOnce() + Send + 'static,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name(name)
        .stack_size(stack_kb * 1024)
        .spawn(f)
}

/// Run a job, containing any panic it raises.
pub fn run_job(label: &'static str, job: Job) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
        error!("job '{}' panicked: {}", label, panic_message(panic.as_ref()));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic>"
    }
}

fn worker_loop<const N: usize>(queue: &Queue<N>) {
    loop {
        match futures_lite::future::block_on(queue.receive()) {
            Message::Run(label, job) => run_job(label, job),
            Message::Stop => break,
        }
    }
}

fn start_worker<const N: usize>(name: String) -> Result<Arc<Queue<N>>, Error> {
    let queue: Arc<Queue<N>> = Arc::new(Channel::new());
    let rx = Arc::clone(&queue);
    spawn_named(name, STACK_KB, move || worker_loop(&rx))
        .map_err(|_| Error::Setup("worker thread creation failed"))?;
    Ok(queue)
}

/// Queues shared between the pool handle and its timer threads.
struct Queues {
    workers: Vec<Arc<Queue<QUEUE_DEPTH>>>,
    serial: Arc<Queue<SERIAL_DEPTH>>,
    next: AtomicUsize,
}

impl Queues {
    fn submit(&self, label: &'static str, job: Job) {
        let n = self.workers.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed);
        let mut msg = Message::Run(label, job);
        for k in 0..n {
            match self.workers[(start + k) % n].try_send(msg) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => msg = back,
            }
        }
        warn!("WorkerPool: all queues full, dropping '{}'", label);
    }

    fn submit_serial(&self, label: &'static str, job: Job) {
        if self.serial.try_send(Message::Run(label, job)).is_err() {
            warn!("WorkerPool: serial queue full, dropping '{}'", label);
        }
    }
}

/// Fixed-size pool of worker threads plus one serial worker.
pub struct WorkerPool {
    queues: Arc<Queues>,
}

impl WorkerPool {
    /// Start `workers` threads named `worker-0..` and `worker-serial`.
    pub fn start(workers: usize) -> Result<Self, Error> {
        if workers == 0 {
            return Err(Error::Setup("worker pool needs at least one thread"));
        }
        let mut queues = Vec::with_capacity(workers);
        for i in 0..workers {
            queues.push(start_worker::<QUEUE_DEPTH>(format!("worker-{i}"))?);
        }
        let serial = start_worker::<SERIAL_DEPTH>("worker-serial".to_owned())?;
        info!("WorkerPool: {} workers, queue depth {}, serial depth {}", workers, QUEUE_DEPTH, SERIAL_DEPTH);
        Ok(Self {
            queues: Arc::new(Queues {
                workers: queues,
                serial,
                next: AtomicUsize::new(0),
            }),
        })
    }

    /// Number of round-robin workers.
    pub fn size(&self) -> usize {
        self.queues.workers.len()
    }
}

impl TaskPort for WorkerPool {
    fn spawn(&self, label: &'static str, job: Job) {
        self.queues.submit(label, job);
    }

    fn spawn_serial(&self, label: &'static str, job: Job) {
        self.queues.submit_serial(label, job);
    }

    fn spawn_after(&self, label: &'static str, delay: Duration, job: Job) {
        let queues = Arc::clone(&self.queues);
        let spawned = spawn_named(format!("timer-{label}"), STACK_KB, move || {
            std::thread::sleep(delay);
            queues.submit(label, job);
        });
        if let Err(e) = spawned {
            warn!("WorkerPool: timer '{}' not started: {}", label, e);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // A worker with a full queue exits once the process does.
        for queue in &self.queues.workers {
            let _ = queue.try_send(Message::Stop);
        }
        let _ = self.queues.serial.try_send(Message::Stop);
    }
}
