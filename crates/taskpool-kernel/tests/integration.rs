//! Integration tests for the taskpool-kernel crate.
//!
//! These exercise `Pool` end to end, the same way a library consumer would:
//! through `submit`/`submit_delayed` and the public counters, never reaching
//! into queue or worker internals.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::time::{Duration, Instant};

use taskpool_kernel::{DelayedTask, InsertMode, Pool, PoolConfig, Task, WORKERTHREAD_MAX};

fn wait_for(mut predicate: impl FnMut() -> bool, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}

#[test]
fn default_construction_starts_one_worker_and_the_loop() {
    let pool = Pool::new(1, true).unwrap();
    assert_eq!(pool.worker_count(), 1);
    assert!(pool.loop_running());
}

#[test]
fn construction_is_clamped_to_the_worker_ceiling() {
    let pool = Pool::new(WORKERTHREAD_MAX, false).unwrap();
    assert_eq!(pool.worker_count(), WORKERTHREAD_MAX);

    let over = Pool::new(WORKERTHREAD_MAX + 50, false).unwrap();
    assert_eq!(over.worker_count(), WORKERTHREAD_MAX);
}

#[test]
fn submit_and_run_clears_the_ready_queue() {
    let pool = Pool::new(2, true).unwrap();
    let flag = Arc::new(AtomicUsize::new(0));
    let flag2 = Arc::clone(&flag);

    pool.submit(
        Task::new("flag", move || flag2.store(1, Ordering::SeqCst)),
        InsertMode::Default,
    )
    .unwrap();

    assert!(wait_for(|| flag.load(Ordering::SeqCst) == 1, Duration::from_millis(200)));
    assert!(wait_for(|| pool.ready_count() == 0, Duration::from_millis(200)));
}

#[test]
fn backlog_beyond_capacity_is_rejected_intact() {
    let pool = Pool::new(5, false).unwrap();
    let release = Arc::new(Barrier::new(6));

    for _ in 0..5 {
        let release = Arc::clone(&release);
        pool.submit(Task::new("hold", move || { release.wait(); }), InsertMode::Default)
            .unwrap();
    }
    assert!(wait_for(|| pool.ready_count() == 0, Duration::from_millis(200)));

    let mut accepted = 0usize;
    let mut saw_rejection = false;
    for _ in 0..1030 {
        match pool.submit(Task::new("t", || {}), InsertMode::Default) {
            Ok(()) => accepted += 1,
            Err(task) => {
                // A rejected task is handed back intact, never executed.
                drop(task);
                saw_rejection = true;
                break;
            }
        }
    }

    release.wait();
    assert_eq!(accepted, taskpool_kernel::FUNCTOR_MAX);
    assert!(saw_rejection);
}

#[test]
fn delayed_task_is_promoted_after_its_deadline() {
    let pool = Pool::new(1, true).unwrap();
    let flag = Arc::new(AtomicUsize::new(0));
    let flag2 = Arc::clone(&flag);
    let deadline = Instant::now() + Duration::from_millis(150);

    let handle = DelayedTask::new(Task::new("flag", move || flag2.store(1, Ordering::SeqCst)), deadline);
    pool.submit_delayed(handle).unwrap();

    assert_eq!(pool.delayed_count(), 1);
    assert_eq!(pool.ready_count(), 0);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(flag.load(Ordering::SeqCst), 0, "must not fire before its deadline");

    assert!(wait_for(|| flag.load(Ordering::SeqCst) == 1, Duration::from_millis(500)));
}

#[test]
fn lifo_then_priority_then_fifo_execution_order() {
    let pool = Pool::new(1, false).unwrap();
    let release = Arc::new(Barrier::new(2));
    let release2 = Arc::clone(&release);
    pool.submit(Task::new("hold", move || { release2.wait(); }), InsertMode::Default)
        .unwrap();
    assert!(wait_for(|| pool.ready_count() == 0, Duration::from_millis(200)));

    let order: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let record = |initial: u8, observed: u8, mode: InsertMode| {
        let order = Arc::clone(&order);
        let mut task = Task::new("t", move || order.lock().unwrap().push(observed));
        task.set_priority(initial);
        pool.submit(task, mode).unwrap();
    };

    record(10, 10, InsertMode::Priority);
    record(50, 50, InsertMode::Priority);
    record(90, 90, InsertMode::Priority);
    record(0, 100, InsertMode::Lifo);
    record(0, 0, InsertMode::Fifo);

    release.wait();

    assert!(wait_for(|| order.lock().unwrap().len() == 5, Duration::from_millis(500)));
    assert_eq!(*order.lock().unwrap(), vec![100, 90, 50, 10, 0]);
}

#[test]
fn rejected_task_after_shutdown_is_not_executed() {
    let pool = Pool::new(1, true).unwrap();
    let ran = Arc::new(AtomicUsize::new(0));
    let ran2 = Arc::clone(&ran);
    let task = Task::new("t", move || {
        ran2.fetch_add(1, Ordering::SeqCst);
    });

    drop(pool);

    // The pool is gone; nothing left to submit to, and the task above was
    // never handed to it, so it was simply dropped without running.
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    drop(task);
}

#[test]
fn watermarks_converge_and_clamp() {
    let pool = Pool::new(3, false).unwrap();
    pool.set_high_watermark(2);
    pool.set_low_watermark(10);
    // low is clamped to <= high rather than rejected outright.
    pool.set_low_watermark(10);
    pool.set_high_watermark(50);
    // No direct getter is exposed; this exercises that repeated calls don't
    // panic or deadlock and that the pool keeps functioning afterwards.
    assert!(pool.worker_count() >= 1);
}

#[test]
fn pool_from_config_applies_capacities() {
    let mut config = PoolConfig {
        worker_count: 2,
        ready_capacity: 4,
        auto_start: false,
        ..PoolConfig::default()
    };
    config.clamp();

    let pool = Pool::from_config(config).unwrap();
    assert_eq!(pool.worker_count(), 2);

    let release = Arc::new(Barrier::new(3));
    for _ in 0..2 {
        let release = Arc::clone(&release);
        pool.submit(Task::new("hold", move || { release.wait(); }), InsertMode::Default)
            .unwrap();
    }
    assert!(wait_for(|| pool.ready_count() == 0, Duration::from_millis(200)));

    for _ in 0..4 {
        pool.submit(Task::new("t", || {}), InsertMode::Default).unwrap();
    }
    assert!(pool.submit(Task::new("t", || {}), InsertMode::Default).is_err());

    release.wait();
}
