//! The background loop that promotes due delayed tasks and scales the
//! worker set to match backlog.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::pool::PoolShared;
use crate::ready_queue::InsertMode;

/// Default controller tick period.
pub const DEFAULT_CONTROLLER_IDLE_US: u64 = 1000;

/// A handle to the running controller thread.
pub struct Controller {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl Controller {
    /// Spawn the controller loop against `shared`.
    ///
    /// Falls back to a no-op, already-stopped handle if the OS refuses to
    /// create the thread; the pool keeps running with scaling and delayed
    /// promotion simply not happening until `start_loop` is retried.
    pub fn spawn(shared: Arc<PoolShared>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let loop_running = Arc::clone(&running);

        match thread::Builder::new()
            .name("taskpool-controller".to_string())
            .spawn(move || controller_loop(&shared, &loop_running))
        {
            Ok(handle) => {
                tracing::info!("controller started");
                Self {
                    handle: Some(handle),
                    running,
                }
            }
            Err(err) => {
                tracing::error!(reason = %err, "failed to spawn controller thread");
                running.store(false, Ordering::Release);
                Self { handle: None, running }
            }
        }
    }

    /// Stop the loop and join its thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        tracing::info!("controller stopped");
    }
}

fn controller_loop(shared: &Arc<PoolShared>, running: &Arc<AtomicBool>) {
    while running.load(Ordering::Acquire) {
        thread::yield_now();

        if shared.dynamic_enabled.load(Ordering::Relaxed) {
            run_scaling_rule(shared);
        }

        let now = Instant::now();
        shared
            .delayed_queue
            .scan_and_promote(now, |task| shared.ready_queue.insert(task, InsertMode::Default));

        let idle_us = shared.controller_idle_us.load(Ordering::Relaxed).max(1);
        thread::sleep(Duration::from_micros(idle_us));
    }
}

/// Evaluated every controller tick; see the module-level documentation for
/// the rationale behind the exponential `adaptive_threshold`.
fn run_scaling_rule(shared: &PoolShared) {
    let low = shared.low_watermark.load(Ordering::Relaxed);
    let high = shared.high_watermark.load(Ordering::Relaxed);

    while shared.worker_set.len() < low {
        if shared.worker_set.add_worker().is_err() {
            break;
        }
    }

    let threshold = shared.adaptive_threshold.load(Ordering::Relaxed);
    if shared.ready_queue.len() > threshold && shared.worker_set.len() < high {
        if shared.worker_set.add_worker().is_err() {
            tracing::warn!("scale-up skipped: worker cap reached");
        }
    }

    if shared.ready_queue.is_empty() && shared.worker_set.len() > low {
        let _ = shared.worker_set.remove_one_idle();
    }

    let workers = shared.worker_set.len().max(1).min(63);
    shared.adaptive_threshold.store(1usize << workers, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Pool;
    use crate::task::Task;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn dynamic_pool_scales_up_under_backlog() {
        let pool = Pool::new(2, true).unwrap();
        pool.set_high_watermark(10);

        let counter = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(std::sync::Barrier::new(11));
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            let barrier = Arc::clone(&barrier);
            let _ = pool.submit(
                Task::new("work", move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    barrier.wait();
                }),
                crate::ready_queue::InsertMode::Default,
            );
        }

        let start = Instant::now();
        while pool.worker_count() < 10 && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(10));
        }

        barrier.wait();
        assert!(pool.worker_count() >= 2);
    }
}
