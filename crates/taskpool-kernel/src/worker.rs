//! A single worker thread: pops the ready queue and executes tasks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::ready_queue::ReadyQueue;

/// Default time a worker waits on its wake signal before re-checking the
/// ready queue on its own.
pub const DEFAULT_WORKER_IDLE_US: u64 = 1000;

/// Observable lifecycle state of a [`Worker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Waiting on its wake signal; no task in hand.
    Idle,
    /// Currently executing a task.
    Running,
    /// The worker loop has returned; the thread is finishing or gone.
    Finished,
}

struct WorkerInner {
    status: Mutex<WorkerStatus>,
    wake: Condvar,
    shutdown: AtomicBool,
}

/// How long the destructor waits, in total, for a fast-shutdown worker to
/// observe its shutdown flag before abandoning the thread handle.
const FAST_SHUTDOWN_POLL: Duration = Duration::from_micros(100);
const FAST_SHUTDOWN_ITERS: u32 = 1000;

/// One long-lived OS thread that repeatedly pops and executes ready tasks.
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
    inner: Arc<WorkerInner>,
    fast_shutdown: bool,
}

impl Worker {
    /// Spawn a new worker thread bound to `ready_queue`.
    ///
    /// `pool_alive` is the worker's non-owning back-reference to the pool:
    /// when the pool clears it, every worker observes the loop condition go
    /// false on its next iteration and exits, with no cyclic ownership
    /// between `Pool` and `Worker`.
    pub fn spawn(
        id: usize,
        ready_queue: Arc<ReadyQueue>,
        pool_alive: Arc<AtomicBool>,
        worker_idle_us: Arc<AtomicU64>,
    ) -> std::io::Result<Self> {
        let inner = Arc::new(WorkerInner {
            status: Mutex::new(WorkerStatus::Idle),
            wake: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });
        let loop_inner = Arc::clone(&inner);

        let handle = thread::Builder::new()
            .name(format!("taskpool-worker-{id}"))
            .spawn(move || worker_loop(id, &ready_queue, &pool_alive, &worker_idle_us, &loop_inner))?;

        Ok(Self {
            id,
            handle: Some(handle),
            inner,
            fast_shutdown: false,
        })
    }

    /// This worker's identifier, stable for its whole lifetime.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Current lifecycle state.
    pub fn status(&self) -> WorkerStatus {
        *self.inner.status.lock().unwrap()
    }

    /// Whether the worker is currently waiting for work.
    pub fn is_idle(&self) -> bool {
        self.status() == WorkerStatus::Idle
    }

    /// Signal the worker's wake condition; a no-op if it isn't currently
    /// sleeping.
    pub fn wake(&self) {
        let _guard = self.inner.status.lock().unwrap();
        self.inner.wake.notify_one();
    }

    /// Ask the worker to stop after it finishes any task in hand, then wake
    /// it so the request is observed promptly.
    pub fn request_shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        self.wake();
    }

    /// As [`request_shutdown`](Self::request_shutdown), but bound the grace
    /// period the destructor gives the thread to exit before abandoning it.
    pub fn request_fast_shutdown(&mut self) {
        self.fast_shutdown = true;
        self.request_shutdown();
    }

    /// Block until the worker thread has returned.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        if !self.fast_shutdown {
            let _ = handle.join();
            return;
        }

        for _ in 0..FAST_SHUTDOWN_ITERS {
            if self.status() == WorkerStatus::Finished {
                let _ = handle.join();
                return;
            }
            thread::sleep(FAST_SHUTDOWN_POLL);
        }

        tracing::warn!(
            worker_id = self.id,
            "worker did not finish within the fast-shutdown grace period, abandoning thread"
        );
        // Dropping the handle detaches the thread rather than blocking further.
        drop(handle);
    }
}

fn worker_loop(
    id: usize,
    ready_queue: &Arc<ReadyQueue>,
    pool_alive: &Arc<AtomicBool>,
    worker_idle_us: &Arc<AtomicU64>,
    inner: &Arc<WorkerInner>,
) {
    loop {
        if inner.shutdown.load(Ordering::Acquire) || !pool_alive.load(Ordering::Acquire) {
            break;
        }

        match ready_queue.pop_head() {
            Some(task) => {
                *inner.status.lock().unwrap() = WorkerStatus::Running;
                let task_id = task.id();
                tracing::debug!(worker_id = id, task_id = %task_id, "worker running task");
                task.execute();
            }
            None => {
                let mut guard = inner.status.lock().unwrap();
                *guard = WorkerStatus::Idle;
                let idle = Duration::from_micros(worker_idle_us.load(Ordering::Relaxed).max(1));
                let _ = inner.wake.wait_timeout(guard, idle).unwrap();
            }
        }
    }

    *inner.status.lock().unwrap() = WorkerStatus::Finished;
    tracing::info!(worker_id = id, "worker finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn new_pool_alive() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(true))
    }

    #[test]
    fn worker_runs_queued_task() {
        let ready_queue = Arc::new(ReadyQueue::new());
        let pool_alive = new_pool_alive();
        let worker_idle_us = Arc::new(AtomicU64::new(1000));
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);

        let mut task = crate::task::Task::new("t", move || {
            ran2.fetch_add(1, Ordering::SeqCst);
        });
        task.set_priority(0);
        ready_queue
            .insert(task, crate::ready_queue::InsertMode::Default)
            .unwrap();

        let worker = Worker::spawn(0, Arc::clone(&ready_queue), Arc::clone(&pool_alive), worker_idle_us).unwrap();

        let start = Instant::now();
        while ran.load(Ordering::SeqCst) == 0 && start.elapsed() < Duration::from_millis(500) {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        pool_alive.store(false, Ordering::Release);
        worker.wake();
        worker.join();
    }

    #[test]
    fn worker_exits_when_pool_dies() {
        let ready_queue = Arc::new(ReadyQueue::new());
        let pool_alive = new_pool_alive();
        let worker_idle_us = Arc::new(AtomicU64::new(1000));
        let worker = Worker::spawn(0, ready_queue, Arc::clone(&pool_alive), worker_idle_us).unwrap();

        pool_alive.store(false, Ordering::Release);
        worker.wake();
        worker.join();
    }
}
