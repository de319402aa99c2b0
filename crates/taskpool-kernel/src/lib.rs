//! Taskpool Kernel.
//!
//! An in-process elastic thread pool: task intake through several ordering
//! disciplines, a deadline-driven delayed queue, and a watermark-scaled
//! worker set.
//!
//! - **[`task`]** -- the user-supplied unit of work.
//! - **[`delayed_task`]** -- a task wrapped with a deadline, pending
//!   promotion.
//! - **[`ready_queue`]** -- the priority-ordered queue workers pop from.
//! - **[`delayed_queue`]** -- the linearly-scanned queue of delayed tasks.
//! - **[`worker`]** -- a single worker thread.
//! - **[`worker_set`]** -- the mutable, bounded collection of workers.
//! - **[`controller`]** -- the background loop that promotes due delayed
//!   tasks and scales the worker set.
//! - **[`pool`]** -- the public facade that owns all of the above.
//! - **[`config`]** -- serializable pool configuration.
//! - **[`error`]** -- unified error types via [`thiserror`].

pub mod config;
pub mod controller;
pub mod delayed_queue;
pub mod delayed_task;
pub mod error;
pub mod pool;
pub mod ready_queue;
pub mod task;
pub mod worker;
pub mod worker_set;

pub use config::PoolConfig;
pub use delayed_queue::{DelayedQueue, DELAYED_FUNCTOR_MAX};
pub use delayed_task::{DelayedTask, DelayedTaskHandle};
pub use error::{PoolError, Result};
pub use pool::Pool;
pub use ready_queue::{InsertMode, ReadyQueue, FUNCTOR_MAX};
pub use task::{Task, TaskId};
pub use worker_set::WORKERTHREAD_MAX;
