//! Command-line surface for the `taskpool` demo binary.

use clap::Parser;

/// Build a pool, submit a handful of demo tasks, and shut it down.
#[derive(Debug, Parser)]
#[command(name = "taskpool", about = "Elastic thread pool demo driver")]
pub struct Cli {
    /// Path to a PoolConfig TOML file. Falls back to `PoolConfig::default()`.
    pub config: Option<String>,

    /// Number of demo tasks to submit.
    #[arg(short, long, default_value_t = 10)]
    pub tasks: usize,
}
