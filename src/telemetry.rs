//! Tracing subscriber setup for the two binaries.
//!
//! The CLI logs to stderr. The worker runs with its stdio detached, so it
//! logs to a file under the data directory instead.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub const WORKER_LOG_FILE_NAME: &str = "worker.log";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the CLI subscriber: compact stderr output, `warn` unless verbose.
pub fn init_cli(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Install the worker subscriber writing to `<log_dir>/worker.log`.
///
/// The returned guard flushes buffered lines on drop and must live until
/// the worker exits.
pub fn init_worker(log_dir: &Path) -> Option<WorkerGuard> {
    std::fs::create_dir_all(log_dir).ok()?;
    let appender = tracing_appender::rolling::never(log_dir, WORKER_LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .ok()?;

    Some(guard)
}
