//! The priority-ordered queue of tasks awaiting a worker.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::task::{Task, TaskId};

/// Default capacity of a [`ReadyQueue`]; also the compile-time `FUNCTOR_MAX`.
pub const FUNCTOR_MAX: usize = 1024;

/// Insertion discipline applied when a task is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Priority forced to 0, appended at the tail.
    Fifo,
    /// Priority forced to 100, prepended at the head.
    Lifo,
    /// Priority left as-is; inserted ahead of the first task with strictly
    /// lower priority.
    Priority,
    /// Equivalent to [`InsertMode::Priority`].
    Default,
}

/// An ordered, bounded queue of [`Task`]s. Insertion order within a priority
/// band is preserved (stable tail-insert); the head is always the next task
/// a worker should run.
pub struct ReadyQueue {
    tasks: Mutex<VecDeque<Task>>,
    capacity: usize,
}

impl ReadyQueue {
    /// A queue bounded by the default [`FUNCTOR_MAX`].
    pub fn new() -> Self {
        Self::with_capacity(FUNCTOR_MAX)
    }

    /// A queue bounded by an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Insert `task` per `mode`. Rejects and returns the task unchanged if
    /// the queue is already at capacity.
    pub fn insert(&self, mut task: Task, mode: InsertMode) -> Result<(), Task> {
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.len() >= self.capacity {
            return Err(task);
        }

        match mode {
            InsertMode::Fifo => {
                task.set_priority(0);
                tasks.push_back(task);
            }
            InsertMode::Lifo => {
                task.set_priority(100);
                tasks.push_front(task);
            }
            InsertMode::Priority | InsertMode::Default => {
                let position = tasks.iter().position(|t| t.priority() < task.priority());
                match position {
                    Some(index) => tasks.insert(index, task),
                    None => tasks.push_back(task),
                }
            }
        }

        Ok(())
    }

    /// Remove and return the head of the queue, if any.
    pub fn pop_head(&self) -> Option<Task> {
        self.tasks.lock().unwrap().pop_front()
    }

    /// The zero-based index of `task_id` within the queue, if present.
    pub fn position_of(&self, task_id: TaskId) -> Option<usize> {
        self.tasks.lock().unwrap().iter().position(|t| t.id() == task_id)
    }

    /// Current number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Whether the queue currently holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().unwrap().is_empty()
    }

    /// Discard every queued task, returning the number discarded.
    pub fn clear(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap();
        let discarded = tasks.len();
        tasks.clear();
        discarded
    }
}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}
