//! The user-supplied unit of work.
//!
//! A [`Task`] is an owned, one-shot callable: no input, no return value, plus
//! an 8-bit priority in `[0, 100]` that the [`ReadyQueue`](crate::ready_queue::ReadyQueue)
//! interprets on insertion. A `Task` is never resubmitted once it has been
//! delegated to the pool -- it is either executed exactly once or discarded.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use uuid::Uuid;

/// Unique identifier assigned to every [`Task`] at construction.
pub type TaskId = Uuid;

/// The boxed, type-erased closure a [`Task`] carries.
pub type TaskBody = Box<dyn FnOnce() + Send + 'static>;

/// A user-supplied unit of work, owned exclusively by whichever component
/// (submitter, queue, or worker) is currently holding it.
pub struct Task {
    id: TaskId,
    name: String,
    priority: u8,
    body: TaskBody,
}

impl Task {
    /// Wrap `body` into a new task at the default priority (`0`).
    pub fn new(name: impl Into<String>, body: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            priority: 0,
            body: Box::new(body),
        }
    }

    /// This task's identifier. Stable for the task's whole lifetime.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The diagnostic label this task was created with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current scheduling priority.
    #[must_use]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Clamp and set the scheduling priority to `[0, 100]`.
    pub fn set_priority(&mut self, priority: u8) {
        self.priority = priority.min(100);
    }

    /// Run the task body exactly once, consuming it.
    ///
    /// A panic inside the body is caught, logged at `error` level, and does
    /// not propagate -- the worker thread that calls this must keep running
    /// regardless of what the task body does.
    pub fn execute(self) {
        let id = self.id;
        let name = self.name;
        let result = panic::catch_unwind(AssertUnwindSafe(self.body));

        if let Err(payload) = result {
            let reason = panic_message(&payload);
            tracing::error!(task_id = %id, task_name = %name, reason = %reason, "task panicked");
        } else {
            tracing::trace!(task_id = %id, task_name = %name, "task completed");
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
