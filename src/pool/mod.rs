//! A bounded worker pool for CPU-bound algorithm execution.
//!
//! Every submission is a closure that runs [`crate::algorithms::Algorithm1D::execute`]
//! or [`crate::algorithms::Algorithm2D::execute`] off the calling task. Two
//! semaphores gate a submission: `queue` (how many tasks may be admitted at
//! all, queued or running) and `workers` (how many may run concurrently).
//! Isolation is real -- each task runs on its own `spawn_blocking` thread and
//! touches no state another task can see -- but cancellation is the one
//! place this pool can't keep every promise of the contract it implements:
//! `JoinHandle::abort()` on a `spawn_blocking` task detaches our bookkeeping
//! from it (the awaiting side sees it as cancelled) without forcibly
//! stopping the OS thread, which keeps running the closure to completion in
//! the background. That's the best cancellation story safe Rust gives you
//! for a thread already mid-computation.
//!
//! Live capacity tracks `minWorkers..=maxWorkers`: the `workers` semaphore
//! starts with only `min_workers` permits, a submission that finds none free
//! adds one (up to `max_workers`), and a background reaper forgets permits
//! back down to `min_workers` once the pool has sat idle past
//! `idle_timeout`. `WorkerPool::new` must be called from within a Tokio
//! runtime -- it spawns that reaper task.

mod stats;

pub use stats::{HealthStatus, PoolStats};

use crate::error::CoreError;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Semaphore};
use uuid::Uuid;

/// Tunables for a [`WorkerPool`]. See `Settings` for the env-overridable
/// defaults these are constructed from.
#[derive(Clone, Copy, Debug)]
pub struct PoolConfig {
    pub min_workers: usize,
    pub max_workers: usize,
    pub idle_timeout: Duration,
    pub max_queue: usize,
    pub task_timeout: Duration,
    pub drain_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            min_workers: 1,
            max_workers: 4,
            idle_timeout: Duration::from_secs(30),
            max_queue: 256,
            task_timeout: Duration::from_secs(60),
            drain_timeout: Duration::from_secs(10),
        }
    }
}

struct Counters {
    queued: AtomicUsize,
    active: AtomicUsize,
    completed: AtomicU64,
    runtime_ms_sum: AtomicU64,
    wait_ms_sum: AtomicU64,
}

impl Counters {
    fn new() -> Self {
        Counters {
            queued: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            completed: AtomicU64::new(0),
            runtime_ms_sum: AtomicU64::new(0),
            wait_ms_sum: AtomicU64::new(0),
        }
    }
}

/// A handle returned alongside a cancellable submission. Dropping it without
/// calling [`CancelHandle::cancel`] leaves the task to run normally.
pub struct CancelHandle {
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl CancelHandle {
    /// Requests cancellation. If the task is still queued (waiting for a
    /// worker permit), it is removed and its waiter resolves with
    /// `CANCELLED` without ever running. If it is already dispatched, the
    /// worker is aborted the same way a timeout aborts one.
    pub fn cancel(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A bounded, long-lived pool for CPU-bound algorithm execution.
pub struct WorkerPool {
    config: PoolConfig,
    queue: Arc<Semaphore>,
    workers: Arc<Semaphore>,
    live_workers: Arc<AtomicUsize>,
    last_activity: Arc<Mutex<Instant>>,
    counters: Arc<Counters>,
    shutting_down: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(config: PoolConfig) -> Self {
        let floor = config.min_workers.max(1);
        let workers = Arc::new(Semaphore::new(floor));
        let live_workers = Arc::new(AtomicUsize::new(floor));
        let last_activity = Arc::new(Mutex::new(Instant::now()));
        let shutting_down = Arc::new(AtomicBool::new(false));

        if config.max_workers > floor {
            tokio::spawn(idle_reaper(
                workers.clone(),
                live_workers.clone(),
                last_activity.clone(),
                shutting_down.clone(),
                config,
            ));
        }

        WorkerPool {
            queue: Arc::new(Semaphore::new(config.max_queue)),
            workers,
            live_workers,
            last_activity,
            counters: Arc::new(Counters::new()),
            shutting_down,
            config,
        }
    }

    /// Runs `job` on the pool, isolated on its own blocking thread.
    ///
    /// Returns `QUEUE_FULL` immediately (never blocks) if the queue is at
    /// capacity, `SHUTTING_DOWN` if [`WorkerPool::shutdown`] has started, and
    /// `TIMEOUT` / `WORKER_CRASH` if the run itself fails. Not cancellable
    /// once submitted; use [`WorkerPool::submit_cancellable`] for a task that
    /// might need to be aborted while still queued.
    pub async fn submit<F, T>(&self, job: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (_handle, run) = self.submit_cancellable(job);
        run.await
    }

    /// Like [`WorkerPool::submit`], but also returns a [`CancelHandle`] that
    /// can abort the task while it is queued or after it has been
    /// dispatched. The returned future must be polled (awaited) for
    /// cancellation to take effect; dropping it without awaiting simply
    /// drops the task.
    pub fn submit_cancellable<F, T>(&self, job: F) -> (CancelHandle, impl std::future::Future<Output = Result<T, CoreError>> + '_)
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let handle = CancelHandle { cancel_tx: Some(cancel_tx) };
        (handle, self.run(job, cancel_rx))
    }

    async fn run<F, T>(&self, job: F, mut cancel_rx: oneshot::Receiver<()>) -> Result<T, CoreError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(CoreError::ShuttingDown);
        }

        let queue_permit = self
            .queue
            .clone()
            .try_acquire_owned()
            .map_err(|_| CoreError::QueueFull { capacity: self.config.max_queue })?;

        let task_id = Uuid::new_v4().to_string();
        let queued_at = Instant::now();
        self.counters.queued.fetch_add(1, Ordering::SeqCst);
        log::debug!(target: "cutstock_core::pool", "task {task_id} queued");

        self.maybe_scale_up();

        let worker_permit = tokio::select! {
            permit = self.workers.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return Err(CoreError::Internal("worker semaphore closed".to_string())),
            },
            _ = &mut cancel_rx => {
                self.counters.queued.fetch_sub(1, Ordering::SeqCst);
                log::debug!(target: "cutstock_core::pool", "task {task_id} cancelled while queued");
                return Err(CoreError::Cancelled { task_id });
            }
        };
        self.mark_active();
        self.counters.queued.fetch_sub(1, Ordering::SeqCst);
        self.counters.active.fetch_add(1, Ordering::SeqCst);
        self.counters
            .wait_ms_sum
            .fetch_add(queued_at.elapsed().as_millis() as u64, Ordering::SeqCst);

        let started_at = Instant::now();
        let mut handle = tokio::task::spawn_blocking(job);
        let outcome = tokio::select! {
            result = tokio::time::timeout(self.config.task_timeout, &mut handle) => Outcome::Finished(result),
            _ = &mut cancel_rx => Outcome::Cancelled,
        };

        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        self.mark_active();
        drop(worker_permit);
        drop(queue_permit);

        match outcome {
            Outcome::Finished(Ok(Ok(value))) => {
                self.counters.completed.fetch_add(1, Ordering::SeqCst);
                self.counters
                    .runtime_ms_sum
                    .fetch_add(started_at.elapsed().as_millis() as u64, Ordering::SeqCst);
                log::debug!(target: "cutstock_core::pool", "task {task_id} completed");
                Ok(value)
            }
            Outcome::Finished(Ok(Err(_join_error))) => {
                log::error!(target: "cutstock_core::pool", "task {task_id} crashed");
                Err(CoreError::WorkerCrash { task_id })
            }
            Outcome::Finished(Err(_elapsed)) => {
                handle.abort();
                log::warn!(target: "cutstock_core::pool", "task {task_id} timed out after {:?}", self.config.task_timeout);
                Err(CoreError::Timeout {
                    task_id,
                    elapsed_ms: self.config.task_timeout.as_millis() as u64,
                })
            }
            Outcome::Cancelled => {
                handle.abort();
                log::debug!(target: "cutstock_core::pool", "task {task_id} cancelled while dispatched");
                Err(CoreError::Cancelled { task_id })
            }
        }
    }

    /// Adds one worker permit, up to `max_workers`, if none are free. Called
    /// whenever a submission finds the pool under queue pressure; corrected
    /// back down by the idle reaper, never by this call.
    fn maybe_scale_up(&self) {
        if self.workers.available_permits() > 0 {
            return;
        }
        let live = self.live_workers.load(Ordering::SeqCst);
        if live >= self.config.max_workers {
            return;
        }
        if self
            .live_workers
            .compare_exchange(live, live + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.workers.add_permits(1);
            log::debug!(target: "cutstock_core::pool", "scaled up to {} live workers", live + 1);
        }
    }

    fn mark_active(&self) {
        *self.last_activity.lock().unwrap() = Instant::now();
    }

    /// Stops accepting new submissions, waits up to `drainTimeoutMs` for
    /// in-flight tasks to finish, then returns regardless.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        log::info!(target: "cutstock_core::pool", "shutdown requested, draining");
        let deadline = Instant::now() + self.config.drain_timeout;
        while self.counters.active.load(Ordering::SeqCst) > 0 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        if self.counters.active.load(Ordering::SeqCst) > 0 {
            log::warn!(target: "cutstock_core::pool", "drain timeout elapsed with tasks still active");
        }
    }

    pub fn stats(&self) -> PoolStats {
        let completed = self.counters.completed.load(Ordering::SeqCst);
        let active = self.counters.active.load(Ordering::SeqCst);
        let queued = self.counters.queued.load(Ordering::SeqCst);
        let avg_runtime_ms = if completed == 0 {
            0.0
        } else {
            self.counters.runtime_ms_sum.load(Ordering::SeqCst) as f64 / completed as f64
        };
        let avg_wait_ms = if completed == 0 {
            0.0
        } else {
            self.counters.wait_ms_sum.load(Ordering::SeqCst) as f64 / completed as f64
        };
        let utilization = active as f64 / self.config.max_workers as f64;

        PoolStats {
            completed,
            active,
            queued,
            utilization,
            avg_runtime_ms,
            avg_wait_ms,
        }
    }

    /// `unhealthy` once utilization or queue pressure crosses the thresholds
    /// in the pool contract.
    pub fn health(&self) -> HealthStatus {
        let stats = self.stats();
        let queue_pressure = stats.queued as f64 / self.config.max_queue as f64;
        if stats.utilization >= 0.95 || queue_pressure > 0.9 {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        }
    }

    /// Number of worker permits currently live (between `min_workers` and
    /// `max_workers`). Exposed for tests; not part of the wire-facing stats.
    #[cfg(test)]
    fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }
}

enum Outcome<T> {
    Finished(Result<Result<T, tokio::task::JoinError>, tokio::time::error::Elapsed>),
    Cancelled,
}

/// Forgets worker permits back down to `min_workers` once the pool has sat
/// idle (no permit acquired or released) past `idle_timeout`. Only spawned
/// when `max_workers > min_workers`; exits once the pool starts shutting
/// down.
async fn idle_reaper(
    workers: Arc<Semaphore>,
    live_workers: Arc<AtomicUsize>,
    last_activity: Arc<Mutex<Instant>>,
    shutting_down: Arc<AtomicBool>,
    config: PoolConfig,
) {
    let tick = (config.idle_timeout / 4).max(Duration::from_millis(10));
    let floor = config.min_workers.max(1);
    loop {
        tokio::time::sleep(tick).await;
        if shutting_down.load(Ordering::SeqCst) {
            return;
        }
        let idle_for = last_activity.lock().unwrap().elapsed();
        if idle_for < config.idle_timeout {
            continue;
        }
        if live_workers.load(Ordering::SeqCst) <= floor {
            continue;
        }
        if let Ok(permit) = workers.clone().try_acquire_owned() {
            permit.forget();
            let remaining = live_workers.fetch_sub(1, Ordering::SeqCst) - 1;
            log::debug!(target: "cutstock_core::pool", "idled out one worker, {remaining} live");
        }
    }
}
