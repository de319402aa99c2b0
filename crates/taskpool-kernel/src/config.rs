//! Serializable pool configuration, loadable from a TOML file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::controller::DEFAULT_CONTROLLER_IDLE_US;
use crate::delayed_queue::DELAYED_FUNCTOR_MAX;
use crate::error::{PoolError, Result};
use crate::ready_queue::FUNCTOR_MAX;
use crate::worker::DEFAULT_WORKER_IDLE_US;
use crate::worker_set::WORKERTHREAD_MAX;

/// A serializable snapshot of every pool tunable, loadable from a TOML
/// document and used to construct a [`Pool`](crate::pool::Pool) via
/// [`Pool::from_config`](crate::pool::Pool::from_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of workers to start with.
    pub worker_count: usize,
    /// Whether the controller loop starts immediately.
    pub auto_start: bool,
    /// Floor the controller keeps the worker count above.
    pub low_watermark: usize,
    /// Ceiling the controller keeps the worker count below.
    pub high_watermark: usize,
    /// Capacity of the ready queue.
    pub ready_capacity: usize,
    /// Capacity of the delayed queue.
    pub delayed_capacity: usize,
    /// Controller tick period, in microseconds.
    pub controller_idle_us: u64,
    /// Worker idle-wait period, in microseconds.
    pub worker_idle_us: u64,
    /// Whether the controller scales the worker count at all.
    pub dynamic_enabled: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            auto_start: true,
            low_watermark: 1,
            high_watermark: 1,
            ready_capacity: FUNCTOR_MAX,
            delayed_capacity: DELAYED_FUNCTOR_MAX,
            controller_idle_us: DEFAULT_CONTROLLER_IDLE_US,
            worker_idle_us: DEFAULT_WORKER_IDLE_US,
            dynamic_enabled: false,
        }
    }
}

impl PoolConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| PoolError::ConfigLoadFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let mut config: PoolConfig = toml::from_str(&text).map_err(|err| PoolError::ConfigLoadFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        config.clamp();
        Ok(config)
    }

    /// Clamp every field into the same ranges the runtime setters enforce,
    /// so a config file can never construct a pool in a state unreachable
    /// through the ordinary API.
    pub fn clamp(&mut self) {
        self.worker_count = self.worker_count.clamp(1, WORKERTHREAD_MAX);
        self.ready_capacity = self.ready_capacity.max(1);
        self.delayed_capacity = self.delayed_capacity.max(1);
        self.controller_idle_us = self.controller_idle_us.max(1);
        self.worker_idle_us = self.worker_idle_us.max(1);

        self.low_watermark = self.low_watermark.clamp(1, WORKERTHREAD_MAX);
        self.high_watermark = self
            .high_watermark
            .max(self.low_watermark)
            .min(WORKERTHREAD_MAX);
        self.low_watermark = self.low_watermark.min(self.high_watermark);
    }
}
