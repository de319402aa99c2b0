//! The linearly-scanned queue of tasks awaiting their deadline.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::delayed_task::{DelayedTask, DelayedTaskHandle};
use crate::task::Task;

/// Default capacity of a [`DelayedQueue`]; also the compile-time
/// `DELAYED_FUNCTOR_MAX`.
pub const DELAYED_FUNCTOR_MAX: usize = 1024;

/// A bounded collection of [`DelayedTask`]s, scanned (not sorted) on every
/// controller tick for entries whose deadline has elapsed.
pub struct DelayedQueue {
    entries: Mutex<Vec<DelayedTaskHandle>>,
    capacity: usize,
}

impl DelayedQueue {
    /// A queue bounded by the default [`DELAYED_FUNCTOR_MAX`].
    pub fn new() -> Self {
        Self::with_capacity(DELAYED_FUNCTOR_MAX)
    }

    /// A queue bounded by an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Queue `handle` for promotion. Rejects (returning the handle) if the
    /// queue is already at capacity.
    pub fn insert(&self, handle: DelayedTaskHandle) -> Result<(), DelayedTaskHandle> {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity {
            return Err(handle);
        }
        entries.push(handle);
        Ok(())
    }

    /// Walk the queue once, promoting every entry whose deadline has
    /// elapsed into the ready queue via `submit`.
    ///
    /// `M_delayed` is released before `submit` is called so that promotion
    /// never holds the delayed-queue lock while acquiring the ready-queue
    /// lock -- the two locks are never nested in that order.
    pub fn scan_and_promote(&self, now: Instant, submit: impl Fn(Task) -> Result<(), Task>) {
        let due: Vec<DelayedTaskHandle> = {
            let entries = self.entries.lock().unwrap();
            entries
                .iter()
                .filter(|handle| !handle.is_empty() && handle.deadline() <= now)
                .cloned()
                .collect()
        };

        for handle in due {
            let Some(task) = handle.take() else { continue };
            match submit(task) {
                Ok(()) => self.remove(&handle),
                Err(task) => handle.restore(task),
            }
        }
    }

    fn remove(&self, handle: &DelayedTaskHandle) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|h| !Arc::ptr_eq(h, handle));
    }

    /// Current number of queued delayed tasks.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the queue currently holds no delayed tasks.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Discard every delayed task, returning the number discarded.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let discarded = entries.len();
        entries.clear();
        discarded
    }
}

impl Default for DelayedQueue {
    fn default() -> Self {
        Self::new()
    }
}
