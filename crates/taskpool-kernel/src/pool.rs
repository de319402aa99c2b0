//! The public facade: a running elastic thread pool.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::PoolConfig;
use crate::controller::Controller;
use crate::delayed_queue::DelayedQueue;
use crate::delayed_task::DelayedTaskHandle;
use crate::error::{PoolError, Result};
use crate::ready_queue::{InsertMode, ReadyQueue};
use crate::task::{Task, TaskId};
use crate::worker::DEFAULT_WORKER_IDLE_US;
use crate::worker_set::{WorkerSet, WORKERTHREAD_MAX};

/// State shared between [`Pool`] and its [`Controller`] thread. Not public:
/// external callers only ever see `Pool`.
pub(crate) struct PoolShared {
    pub(crate) ready_queue: Arc<ReadyQueue>,
    pub(crate) delayed_queue: DelayedQueue,
    pub(crate) worker_set: WorkerSet,
    pub(crate) pool_alive: Arc<AtomicBool>,
    pub(crate) low_watermark: AtomicUsize,
    pub(crate) high_watermark: AtomicUsize,
    pub(crate) dynamic_enabled: AtomicBool,
    pub(crate) controller_idle_us: Arc<AtomicU64>,
    pub(crate) worker_idle_us: Arc<AtomicU64>,
    pub(crate) adaptive_threshold: AtomicUsize,
}

/// An in-process elastic thread pool: priority-ordered task intake, a
/// deadline-driven delayed queue, and a watermark-scaled worker set.
pub struct Pool {
    shared: Arc<PoolShared>,
    controller: Mutex<Option<Controller>>,
}

impl Pool {
    /// Construct a pool with `worker_count` workers (clamped to
    /// `[1, WORKERTHREAD_MAX]`), starting the controller loop iff
    /// `auto_start`. Fails only if not a single worker could be started.
    pub fn new(worker_count: usize, auto_start: bool) -> Result<Self> {
        Self::with_capacities(
            worker_count,
            auto_start,
            crate::ready_queue::FUNCTOR_MAX,
            crate::delayed_queue::DELAYED_FUNCTOR_MAX,
        )
    }

    /// Construct a pool from a [`PoolConfig`], applying its ready/delayed
    /// capacities and idle periods before returning.
    pub fn from_config(mut config: PoolConfig) -> Result<Self> {
        config.clamp();
        let pool = Self::with_capacities(
            config.worker_count,
            false,
            config.ready_capacity,
            config.delayed_capacity,
        )?;

        pool.shared.low_watermark.store(config.low_watermark, Ordering::Relaxed);
        pool.shared.high_watermark.store(config.high_watermark, Ordering::Relaxed);
        pool.shared
            .dynamic_enabled
            .store(config.dynamic_enabled, Ordering::Relaxed);
        pool.set_controller_idle(config.controller_idle_us);
        pool.set_worker_idle(config.worker_idle_us);

        if config.auto_start {
            pool.start_loop();
        }

        Ok(pool)
    }

    fn with_capacities(worker_count: usize, auto_start: bool, ready_capacity: usize, delayed_capacity: usize) -> Result<Self> {
        let worker_count = worker_count.clamp(1, WORKERTHREAD_MAX);
        let pool_alive = Arc::new(AtomicBool::new(true));
        let worker_idle_us = Arc::new(AtomicU64::new(DEFAULT_WORKER_IDLE_US));
        let controller_idle_us = Arc::new(AtomicU64::new(crate::controller::DEFAULT_CONTROLLER_IDLE_US));
        let ready_queue = Arc::new(ReadyQueue::with_capacity(ready_capacity));

        let worker_set = WorkerSet::new(Arc::clone(&ready_queue), Arc::clone(&pool_alive), Arc::clone(&worker_idle_us));

        let mut started = 0usize;
        for _ in 0..worker_count {
            if worker_set.add_worker().is_ok() {
                started += 1;
            }
        }
        if started == 0 {
            pool_alive.store(false, Ordering::Release);
            return Err(PoolError::ConstructionFailed);
        }

        let dynamic_enabled = worker_count > 1;
        let shared = Arc::new(PoolShared {
            ready_queue,
            delayed_queue: DelayedQueue::with_capacity(delayed_capacity),
            worker_set,
            pool_alive,
            low_watermark: AtomicUsize::new(worker_count),
            high_watermark: AtomicUsize::new(worker_count),
            dynamic_enabled: AtomicBool::new(dynamic_enabled),
            controller_idle_us,
            worker_idle_us,
            adaptive_threshold: AtomicUsize::new(1usize << started.min(63)),
        });

        tracing::info!(worker_count = started, dynamic_enabled, "pool constructed");

        let controller = if auto_start {
            Some(Controller::spawn(Arc::clone(&shared)))
        } else {
            None
        };

        Ok(Self {
            shared,
            controller: Mutex::new(controller),
        })
    }

    /// Insert `task` into the ready queue per `mode`. On success, wakes one
    /// idle worker. On failure (pool stopped, or queue full) the task is
    /// returned to the caller untouched.
    pub fn submit(&self, task: Task, mode: InsertMode) -> std::result::Result<(), Task> {
        if !self.shared.pool_alive.load(Ordering::Acquire) {
            tracing::warn!(task_id = %task.id(), "submit rejected: pool stopped");
            return Err(task);
        }

        match self.shared.ready_queue.insert(task, mode) {
            Ok(()) => {
                self.shared.worker_set.wake_one_idle();
                Ok(())
            }
            Err(task) => {
                tracing::warn!(task_id = %task.id(), "submit rejected: ready queue full");
                Err(task)
            }
        }
    }

    /// Insert a [`DelayedTaskHandle`] into the delayed queue. On failure
    /// (pool stopped, or queue full) the handle is returned to the caller.
    pub fn submit_delayed(&self, handle: DelayedTaskHandle) -> std::result::Result<(), DelayedTaskHandle> {
        if !self.shared.pool_alive.load(Ordering::Acquire) {
            return Err(handle);
        }
        self.shared.delayed_queue.insert(handle)
    }

    /// The zero-based position of `task_id` in the ready queue, if present.
    pub fn position_in_ready(&self, task_id: TaskId) -> Option<usize> {
        self.shared.ready_queue.position_of(task_id)
    }

    /// Set the low watermark, clamped to `≤ high_watermark`. Effective only
    /// while dynamic scaling is enabled.
    pub fn set_low_watermark(&self, n: usize) {
        let high = self.shared.high_watermark.load(Ordering::Relaxed);
        self.shared.low_watermark.store(n.min(high).max(1), Ordering::Relaxed);
    }

    /// Set the high watermark, clamped to `[low_watermark, WORKERTHREAD_MAX]`.
    /// Effective only while dynamic scaling is enabled.
    pub fn set_high_watermark(&self, n: usize) {
        let low = self.shared.low_watermark.load(Ordering::Relaxed);
        self.shared
            .high_watermark
            .store(n.max(low).min(WORKERTHREAD_MAX), Ordering::Relaxed);
    }

    /// Start the controller loop if it isn't already running.
    pub fn start_loop(&self) {
        let mut controller = self.controller.lock().unwrap();
        if controller.is_none() {
            *controller = Some(Controller::spawn(Arc::clone(&self.shared)));
        }
    }

    /// Stop the controller loop without tearing down any worker.
    pub fn stop_loop(&self) {
        let mut controller = self.controller.lock().unwrap();
        if let Some(mut running) = controller.take() {
            running.stop();
        }
    }

    /// Whether the controller loop is currently running.
    pub fn loop_running(&self) -> bool {
        self.controller.lock().unwrap().is_some()
    }

    /// Change the controller tick period.
    pub fn set_controller_idle(&self, us: u64) {
        self.shared.controller_idle_us.store(us.max(1), Ordering::Relaxed);
    }

    /// Change the per-worker idle-wait period.
    pub fn set_worker_idle(&self, us: u64) {
        self.shared.worker_idle_us.store(us.max(1), Ordering::Relaxed);
    }

    /// Number of tasks currently queued to run.
    pub fn ready_count(&self) -> usize {
        self.shared.ready_queue.len()
    }

    /// Number of delayed tasks currently awaiting their deadline.
    pub fn delayed_count(&self) -> usize {
        self.shared.delayed_queue.len()
    }

    /// Current number of live workers.
    pub fn worker_count(&self) -> usize {
        self.shared.worker_set.len()
    }

    /// Tear the pool down: stop accepting work, join the controller, then
    /// discard anything still queued before destroying the workers.
    ///
    /// Equivalent to simply dropping the `Pool` -- provided so teardown can
    /// be triggered explicitly without relying on scope exit.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shared.pool_alive.store(false, Ordering::Release);

        if let Some(mut controller) = self.controller.lock().unwrap().take() {
            controller.stop();
        }

        let discarded_delayed = self.shared.delayed_queue.clear();
        if discarded_delayed > 0 {
            tracing::warn!(count = discarded_delayed, "discarded un-promoted delayed tasks on shutdown");
        }

        let discarded_ready = self.shared.ready_queue.clear();
        if discarded_ready > 0 {
            tracing::warn!(count = discarded_ready, "discarded un-run tasks on shutdown");
        }

        self.shared.worker_set.clear();
        tracing::info!("pool shut down");
    }
}
