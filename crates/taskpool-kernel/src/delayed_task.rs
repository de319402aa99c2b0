//! Tasks wrapped with a deadline, pending promotion into the ready queue.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::task::Task;

/// Shared handle to a [`DelayedTask`]; the caller keeps one end, the
/// [`DelayedQueue`](crate::delayed_queue::DelayedQueue) the other.
pub type DelayedTaskHandle = Arc<DelayedTask>;

/// A `Task` wrapped with a deadline. The inner task can be extracted exactly
/// once, by whichever of the holder or the controller calls [`take`](Self::take)
/// first.
pub struct DelayedTask {
    inner: Mutex<Option<Task>>,
    deadline: Mutex<Instant>,
}

impl DelayedTask {
    /// Wrap `task` with `deadline` and return a shared handle to it.
    pub fn new(task: Task, deadline: Instant) -> DelayedTaskHandle {
        Arc::new(Self {
            inner: Mutex::new(Some(task)),
            deadline: Mutex::new(deadline),
        })
    }

    /// The deadline at or after which this task becomes eligible for promotion.
    pub fn deadline(&self) -> Instant {
        *self.deadline.lock().unwrap()
    }

    /// Set a new deadline. Only meaningful before the inner task is taken.
    pub fn renew(&self, deadline: Instant) {
        *self.deadline.lock().unwrap() = deadline;
    }

    /// Mark the task for promotion on the next controller tick.
    pub fn reset_deadline(&self) {
        self.renew(Instant::now());
    }

    /// Atomically extract the inner task, leaving the wrapper empty.
    /// Returns `None` if already taken.
    pub fn take(&self) -> Option<Task> {
        self.inner.lock().unwrap().take()
    }

    /// Put a task back into the wrapper. Only legal while the wrapper is
    /// empty; used when a promotion attempt fails and the delayed task must
    /// remain queued for the next tick.
    pub fn restore(&self, task: Task) {
        let mut slot = self.inner.lock().unwrap();
        debug_assert!(slot.is_none(), "restore() called on a non-empty DelayedTask");
        *slot = Some(task);
    }

    /// Whether the inner task has already been extracted.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_none()
    }
}

impl std::fmt::Debug for DelayedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayedTask")
            .field("deadline", &self.deadline())
            .field("is_empty", &self.is_empty())
            .finish()
    }
}
