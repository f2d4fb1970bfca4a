//! Detached generation worker.
//!
//! Invoked by `ccask add` as `ccask-worker '<json>'`. Exits 1 only when the
//! argument bundle is missing or invalid; generation failures are recorded
//! on the question record and still exit 0.

use std::process::ExitCode;

use ccask::config::Config;
use ccask::diagnostics::DiagnosticLog;
use ccask::telemetry;
use ccask::worker::{GenerationWorker, WorkerArgs, WorkerOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load(None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ccask-worker: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = telemetry::init_worker(&config.worker_log_dir);
    let log = DiagnosticLog::new(&config.log_file);

    let raw = std::env::args().nth(1).unwrap_or_default();
    let args = match WorkerArgs::from_json(&raw) {
        Ok(args) => args,
        Err(e) => {
            log.record(&e.to_string());
            tracing::error!(error = %e, "Rejected worker arguments");
            eprintln!("ccask-worker: {e}");
            return ExitCode::FAILURE;
        }
    };

    match GenerationWorker::from_config(&config).run(&args).await {
        Ok(WorkerOutcome::Completed { filepath }) => {
            tracing::info!(filepath = %filepath.display(), "Worker finished");
            ExitCode::SUCCESS
        }
        Ok(WorkerOutcome::Skipped { status }) => {
            tracing::info!(%status, "Worker skipped settled question");
            ExitCode::SUCCESS
        }
        Ok(WorkerOutcome::Failed { error }) => {
            tracing::warn!(%error, "Worker finished with failure");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Rejected worker arguments");
            eprintln!("ccask-worker: {e}");
            ExitCode::FAILURE
        }
    }
}
