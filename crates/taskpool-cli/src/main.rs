//! Demo driver for `taskpool-kernel`.
//!
//! Builds a [`Pool`], submits a handful of self-logging tasks, and shuts it
//! down. Exists to give the library an executable entry point for manual
//! smoke-testing; it carries no scheduling logic of its own.

mod cli;
mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use taskpool_kernel::{InsertMode, Pool, PoolConfig, Task};

use crate::cli::Cli;
use crate::helpers::init_tracing;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("info");

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PoolConfig::from_file(path).with_context(|| format!("loading pool config from {path}"))?,
        None => PoolConfig::default(),
    };

    info!(worker_count = config.worker_count, "starting demo pool");
    let pool = Pool::from_config(config)?;

    let completed = Arc::new(AtomicUsize::new(0));
    for i in 0..cli.tasks {
        let completed = Arc::clone(&completed);
        let task = Task::new(format!("demo-{i}"), move || {
            info!(task_index = i, "demo task running");
            completed.fetch_add(1, Ordering::SeqCst);
        });
        if pool.submit(task, InsertMode::Default).is_err() {
            tracing::warn!(task_index = i, "demo task rejected, pool backlog full");
        }
    }

    let deadline = Duration::from_secs(5);
    let start = std::time::Instant::now();
    while completed.load(Ordering::SeqCst) < cli.tasks && start.elapsed() < deadline {
        thread::sleep(Duration::from_millis(20));
    }

    info!(
        completed = completed.load(Ordering::SeqCst),
        requested = cli.tasks,
        "demo run finished"
    );

    pool.shutdown();
    Ok(())
}
