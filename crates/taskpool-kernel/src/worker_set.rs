//! The mutable collection of workers backing a pool.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::PoolError;
use crate::ready_queue::ReadyQueue;
use crate::worker::Worker;

/// Default ceiling on worker count; also the compile-time `WORKERTHREAD_MAX`.
pub const WORKERTHREAD_MAX: usize = 60;

/// Insertion-ordered collection of [`Worker`]s, bounded by
/// [`WORKERTHREAD_MAX`].
pub struct WorkerSet {
    workers: Mutex<Vec<Worker>>,
    ready_queue: Arc<ReadyQueue>,
    pool_alive: Arc<AtomicBool>,
    worker_idle_us: Arc<AtomicU64>,
    next_id: AtomicUsize,
    capacity: usize,
}

impl WorkerSet {
    /// A worker set bounded by the default [`WORKERTHREAD_MAX`].
    pub fn new(ready_queue: Arc<ReadyQueue>, pool_alive: Arc<AtomicBool>, worker_idle_us: Arc<AtomicU64>) -> Self {
        Self::with_capacity(ready_queue, pool_alive, worker_idle_us, WORKERTHREAD_MAX)
    }

    /// A worker set bounded by an explicit capacity.
    pub fn with_capacity(
        ready_queue: Arc<ReadyQueue>,
        pool_alive: Arc<AtomicBool>,
        worker_idle_us: Arc<AtomicU64>,
        capacity: usize,
    ) -> Self {
        Self {
            workers: Mutex::new(Vec::new()),
            ready_queue,
            pool_alive,
            worker_idle_us,
            next_id: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Create and start a new worker, appending it to the set.
    pub fn add_worker(&self) -> Result<(), PoolError> {
        let mut workers = self.workers.lock().unwrap();
        if workers.len() >= self.capacity {
            return Err(PoolError::WorkerCapExceeded { max: self.capacity });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let worker = Worker::spawn(
            id,
            Arc::clone(&self.ready_queue),
            Arc::clone(&self.pool_alive),
            Arc::clone(&self.worker_idle_us),
        )
        .map_err(|err| PoolError::WorkerSpawnFailed { reason: err.to_string() })?;

        tracing::info!(worker_id = id, total = workers.len() + 1, "worker added");
        workers.push(worker);
        Ok(())
    }

    /// Remove the first idle worker, waiting for its thread to exit.
    pub fn remove_one_idle(&self) -> Result<(), PoolError> {
        let mut workers = self.workers.lock().unwrap();
        let position = workers.iter().position(Worker::is_idle);
        let Some(index) = position else {
            return Err(PoolError::NoIdleWorker);
        };

        let worker = workers.remove(index);
        worker.request_shutdown();
        tracing::info!(worker_id = worker.id(), remaining = workers.len(), "worker removed");
        drop(workers);
        worker.join();
        Ok(())
    }

    /// Wake the first idle worker, if any. Converts submit-path sleep
    /// latency into run latency.
    pub fn wake_one_idle(&self) {
        let workers = self.workers.lock().unwrap();
        if let Some(worker) = workers.iter().find(|w| w.is_idle()) {
            worker.wake();
        }
    }

    /// Current number of workers in the set.
    pub fn len(&self) -> usize {
        self.workers.lock().unwrap().len()
    }

    /// Whether the set currently holds no workers.
    pub fn is_empty(&self) -> bool {
        self.workers.lock().unwrap().is_empty()
    }

    /// Request fast shutdown of every worker and drop them, bounding the
    /// grace period each is given to exit. Used only during pool teardown,
    /// after the ready queue has been drained.
    pub fn clear(&self) {
        let mut workers = self.workers.lock().unwrap();
        for worker in workers.iter_mut() {
            worker.request_fast_shutdown();
        }
        let drained: Vec<Worker> = workers.drain(..).collect();
        drop(workers);
        drop(drained);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_set(capacity: usize) -> WorkerSet {
        let ready_queue = Arc::new(ReadyQueue::new());
        let pool_alive = Arc::new(AtomicBool::new(true));
        let worker_idle_us = Arc::new(AtomicU64::new(1000));
        WorkerSet::with_capacity(ready_queue, pool_alive, worker_idle_us, capacity)
    }

    #[test]
    fn add_worker_grows_the_set() {
        let set = fresh_set(WORKERTHREAD_MAX);
        set.add_worker().unwrap();
        set.add_worker().unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn add_worker_respects_the_cap() {
        let set = fresh_set(1);
        set.add_worker().unwrap();
        assert!(matches!(set.add_worker(), Err(PoolError::WorkerCapExceeded { max: 1 })));
    }

    #[test]
    fn remove_one_idle_fails_with_no_workers() {
        let set = fresh_set(WORKERTHREAD_MAX);
        assert!(matches!(set.remove_one_idle(), Err(PoolError::NoIdleWorker)));
    }
}
