//! Trailing-edge debounce with a maximum wait.
//!
//! States:
//! - `Idle`: nothing scheduled
//! - `Pending`: fires at `min(quiet, hard)`; each trigger moves `quiet` to
//!   now + wait, `hard` stays at first trigger + max wait
//! - `Running`: job in flight; triggers collect into one follow-up that
//!   becomes `Pending` when the job finishes
//!
//! One worker task owns execution, so runs never overlap.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Work executed by a `Debouncer`.
#[async_trait]
pub trait DebouncedJob: Send + Sync + 'static {
    /// Name used in log lines.
    fn name(&self) -> &'static str;

    async fn run(&self);
}

/// Quiet period and hard upper bound on how long a trigger may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTiming {
    pub wait: Duration,
    pub max_wait: Duration,
}

impl DebounceTiming {
    pub fn new(wait: Duration, max_wait: Duration) -> Self {
        Self {
            wait,
            max_wait: max_wait.max(wait),
        }
    }
}

impl Default for DebounceTiming {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(60))
    }
}

/// Observable debounce state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
    Idle,
    Pending,
    Running,
}

#[derive(Debug, Clone, Copy)]
struct Deadlines {
    quiet: Instant,
    hard: Instant,
}

impl Deadlines {
    fn start(now: Instant, wait: Duration, max_wait: Duration) -> Self {
        Self {
            quiet: now + wait,
            hard: now + max_wait,
        }
    }

    fn fire_at(&self) -> Instant {
        self.quiet.min(self.hard)
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Pending(Deadlines),
    Running { follow_up: Option<Deadlines> },
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    wake: Notify,
    wait: Duration,
    max_wait: Duration,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Coalesces bursts of triggers into single job runs.
///
/// Must be created inside a tokio runtime. Dropping it stops the worker.
#[derive(Debug)]
pub struct Debouncer {
    shared: Arc<Shared>,
    worker: JoinHandle<()>,
}

impl Debouncer {
    pub fn spawn<J: DebouncedJob>(job: Arc<J>, timing: DebounceTiming) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::Idle),
            wake: Notify::new(),
            wait: timing.wait,
            max_wait: timing.max_wait,
        });

        let worker = tokio::spawn(run_worker(shared.clone(), job));

        Self { shared, worker }
    }

    /// Request a run. Cheap and non-blocking.
    pub fn trigger(&self) {
        let now = Instant::now();
        let (wait, max_wait) = (self.shared.wait, self.shared.max_wait);

        {
            let mut state = self.shared.lock();
            match &mut *state {
                State::Idle => {
                    *state = State::Pending(Deadlines::start(now, wait, max_wait));
                }
                State::Pending(deadlines) => {
                    deadlines.quiet = now + wait;
                }
                State::Running { follow_up } => match follow_up.as_mut() {
                    Some(deadlines) => deadlines.quiet = now + wait,
                    None => *follow_up = Some(Deadlines::start(now, wait, max_wait)),
                },
            }
        }

        self.shared.wake.notify_one();
    }

    pub fn phase(&self) -> DebouncePhase {
        match *self.shared.lock() {
            State::Idle => DebouncePhase::Idle,
            State::Pending(_) => DebouncePhase::Pending,
            State::Running { .. } => DebouncePhase::Running,
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker<J: DebouncedJob>(shared: Arc<Shared>, job: Arc<J>) {
    loop {
        let fire_at = match *shared.lock() {
            State::Pending(deadlines) => Some(deadlines.fire_at()),
            State::Idle | State::Running { .. } => None,
        };

        let Some(fire_at) = fire_at else {
            shared.wake.notified().await;
            continue;
        };

        if Instant::now() < fire_at {
            tokio::select! {
                _ = sleep_until(fire_at) => {}
                _ = shared.wake.notified() => {}
            }
            continue;
        }

        *shared.lock() = State::Running { follow_up: None };
        debug!("Running debounced job {}", job.name());

        job.run().await;

        let mut state = shared.lock();
        *state = match &*state {
            State::Running {
                follow_up: Some(deadlines),
            } => {
                debug!("Follow-up scheduled for debounced job {}", job.name());
                State::Pending(*deadlines)
            }
            _ => State::Idle,
        };
    }
}
