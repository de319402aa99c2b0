//! Pool error types.
//!
//! Every public API in this crate surfaces errors through [`PoolError`],
//! the single error type returned by non-submission operations. Submission
//! paths (`submit`, `submit_delayed`) return the rejected value itself
//! rather than an error, since a [`Task`](crate::task::Task) must always
//! come back to the caller intact rather than be lost inside an error enum
//! -- see [`crate::pool::Pool::submit`].

use crate::task::TaskId;

/// Unified error type for the task pool kernel.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The pool has begun shutting down and will not accept new work.
    #[error("pool is stopped")]
    PoolStopped,

    /// The ready queue is at `FUNCTOR_MAX` capacity.
    #[error("ready queue is full ({capacity} tasks)")]
    ReadyQueueFull {
        /// The configured capacity that was reached.
        capacity: usize,
    },

    /// The delayed queue is at `DELAYED_FUNCTOR_MAX` capacity.
    #[error("delayed queue is full ({capacity} tasks)")]
    DelayedQueueFull {
        /// The configured capacity that was reached.
        capacity: usize,
    },

    /// `add_worker` was attempted at `WORKERTHREAD_MAX`.
    #[error("worker cap exceeded ({max} workers)")]
    WorkerCapExceeded {
        /// The configured ceiling that was reached.
        max: usize,
    },

    /// `remove_one_idle` found no idle worker to remove.
    #[error("no idle worker available to remove")]
    NoIdleWorker,

    /// The operating system refused to spawn a worker thread.
    #[error("failed to spawn worker thread: {reason}")]
    WorkerSpawnFailed {
        /// The underlying OS error, rendered as text.
        reason: String,
    },

    /// A task's body panicked during execution.
    ///
    /// Recorded for observability; it never propagates to a submitter,
    /// since by the time a task runs it is owned by the worker.
    #[error("task {task_id} panicked: {reason}")]
    TaskPanicked {
        /// The id of the task whose body panicked.
        task_id: TaskId,
        /// A best-effort rendering of the panic payload.
        reason: String,
    },

    /// The pool could not obtain a single worker during construction.
    #[error("pool construction failed: could not start any worker")]
    ConstructionFailed,

    /// A `PoolConfig` could not be loaded from disk.
    #[error("failed to load pool config from {path}: {reason}")]
    ConfigLoadFailed {
        /// Path that was read.
        path: String,
        /// Underlying I/O or parse error, rendered as text.
        reason: String,
    },
}

/// Convenience alias used throughout the kernel crate.
pub type Result<T> = std::result::Result<T, PoolError>;
