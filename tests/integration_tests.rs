//! Integration tests for ccask
//!
//! These drive the real `ccask` and `ccask-worker` binaries against a
//! temporary data directory, with `sh` scripts standing in for the
//! generation tool.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use ccask::store::{QuestionRecord, QuestionStatus, RecordStore};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const WORKER_BIN: &str = env!("CARGO_BIN_EXE_ccask-worker");

/// Upper bound for a detached worker to finish a mock generation.
const WORKER_TIMEOUT: Duration = Duration::from_secs(20);

/// A data directory plus a mock generation tool.
struct Env {
    home: TempDir,
    generator: String,
}

impl Env {
    /// Mock tool running `script` under `sh`; it receives `-p <prompt>`.
    fn with_tool(script: &str) -> Self {
        let home = TempDir::new().unwrap();
        let tool = home.path().join("mock-tool.sh");
        fs::write(&tool, script).unwrap();
        let generator = format!("sh {}", tool.display());
        Self { home, generator }
    }

    fn path(&self) -> &Path {
        self.home.path()
    }

    /// Helper to create a ccask Command bound to this data directory
    fn ccask(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("ccask");
        self.apply(&mut cmd);
        cmd
    }

    fn worker(&self) -> Command {
        let mut cmd = Command::new(WORKER_BIN);
        self.apply(&mut cmd);
        cmd
    }

    fn apply(&self, cmd: &mut Command) {
        cmd.env("CCASK_HOME", self.path())
            .env("CCASK_GENERATOR_CMD", &self.generator)
            .env("CCASK_WORKER_CMD", WORKER_BIN)
            .env_remove("CCASK_ANSWERS_DIR")
            .env_remove("CLAUDE_CMD")
            .env_remove("RUST_LOG");
    }

    fn store(&self) -> RecordStore {
        RecordStore::in_dir(self.path())
    }

    fn records(&self) -> Vec<QuestionRecord> {
        self.store().load().unwrap().records
    }

    /// Poll the store until every record is terminal.
    fn wait_for_terminal(&self) -> Vec<QuestionRecord> {
        let deadline = Instant::now() + WORKER_TIMEOUT;
        loop {
            let records = self.records();
            if !records.is_empty() && records.iter().all(QuestionRecord::is_terminal) {
                return records;
            }
            assert!(
                Instant::now() < deadline,
                "Workers did not finish in time: {:#?}",
                records
            );
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    fn diagnostic_log(&self) -> String {
        fs::read_to_string(self.path().join("ccask.log")).unwrap_or_default()
    }

    /// The worker logs its outcome just after the final save; poll for it.
    fn wait_for_log(&self, needle: &str) -> String {
        let deadline = Instant::now() + WORKER_TIMEOUT;
        loop {
            let log = self.diagnostic_log();
            if log.contains(needle) {
                return log;
            }
            assert!(Instant::now() < deadline, "Missing log line {needle:?} in:\n{log}");
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}

fn answer(env: &Env, stem: &str) -> PathBuf {
    env.path().join("answers").join(format!("{stem}.md"))
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_ccask_help() {
        cargo_bin_cmd!("ccask")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("add"))
            .stdout(predicate::str::contains("status"));
    }

    #[test]
    fn test_ccask_version() {
        cargo_bin_cmd!("ccask").arg("--version").assert().success();
    }

    #[test]
    fn test_list_on_empty_store() {
        let env = Env::with_tool("printf 'unused'\n");
        env.ccask()
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No questions found."));
        // Reading creates an empty store document.
        assert!(env.path().join("questions.json").exists());
        assert!(env.records().is_empty());
    }

    #[test]
    fn test_list_rejects_unknown_status() {
        let env = Env::with_tool("printf 'unused'\n");
        env.ccask()
            .args(["list", "--status", "done"])
            .assert()
            .failure();
    }

    #[test]
    fn test_add_rejects_blank_question() {
        let env = Env::with_tool("printf 'unused'\n");
        env.ccask()
            .args(["add", "   "])
            .assert()
            .failure()
            .stderr(predicate::str::contains("must not be empty"));
        assert!(env.records().is_empty());
    }

    #[test]
    fn test_config_shows_effective_values() {
        let env = Env::with_tool("printf 'unused'\n");
        env.ccask()
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("generator_cmd"))
            .stdout(predicate::str::contains("mock-tool.sh"));
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let env = Env::with_tool("printf 'unused'\n");
        fs::write(env.path().join("config.toml"), "unknown_key = 1\n").unwrap();
        env.ccask()
            .arg("config")
            .assert()
            .failure()
            .stderr(predicate::str::contains("config.toml"));
    }

    #[test]
    fn test_corrupt_store_is_reported_not_repaired() {
        let env = Env::with_tool("printf 'unused'\n");
        let store_path = env.path().join("questions.json");
        fs::write(&store_path, "{ not json").unwrap();

        env.ccask()
            .arg("list")
            .assert()
            .failure()
            .stderr(predicate::str::contains("corrupt"));
        assert_eq!(fs::read_to_string(&store_path).unwrap(), "{ not json");
    }
}

// =============================================================================
// Submission Through Detached Worker
// =============================================================================

#[cfg(unix)]
mod lifecycle {
    use super::*;

    #[test]
    fn test_add_generates_explanation_in_background() {
        let env = Env::with_tool("printf 'explanation...'\n");

        env.ccask()
            .args(["add", "TCP handshake"])
            .assert()
            .success()
            .stdout(predicate::str::contains("TCP handshake"))
            .stdout(predicate::str::contains("tcp_handshake.md"));

        let records = env.wait_for_terminal();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.status, QuestionStatus::Completed);
        assert!(record.started_at.is_some());
        assert!(record.completed_at.is_some());
        assert!(record.error.is_none());

        let path = answer(&env, "tcp_handshake");
        assert_eq!(record.filepath.as_deref(), Some(path.as_path()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "explanation...");

        let log = env.wait_for_log("Successfully generated explanation for: TCP handshake");
        assert!(log.contains("Starting generation for: TCP handshake"));
    }

    #[test]
    fn test_failing_tool_marks_record_failed() {
        let env = Env::with_tool("echo 'not found' >&2\nexit 1\n");

        env.ccask().args(["add", "bogus term"]).assert().success();

        let records = env.wait_for_terminal();
        let record = &records[0];
        assert_eq!(record.status, QuestionStatus::Failed);
        assert!(record.filepath.is_none());
        let error = record.error.as_deref().unwrap();
        assert!(error.contains('1'));
        assert!(error.contains("not found"));
        assert!(!answer(&env, "bogus_term").exists());
        env.wait_for_log("Failed to generate explanation for bogus term");
    }

    #[test]
    fn test_same_term_twice_completes_both_records() {
        // Slow enough that the first worker is still saving while the second
        // submission and its worker write the store.
        let env = Env::with_tool("sleep 0.2\nprintf 'explanation...'\n");

        for _ in 0..5 {
            env.ccask().args(["add", "DNS"]).assert().success();
            env.ccask().args(["add", "DNS"]).assert().success();
        }

        let records = env.wait_for_terminal();
        assert_eq!(records.len(), 10);
        let mut ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
        assert!(records.iter().all(|r| {
            r.status == QuestionStatus::Completed && r.started_at.is_some()
        }));
    }

    #[test]
    fn test_status_watch_stops_on_interrupt() {
        use std::io::{BufRead, BufReader};
        use std::process::{Command as StdCommand, Stdio};

        let env = Env::with_tool("printf 'unused'\n");
        let mut child = StdCommand::new(env!("CARGO_BIN_EXE_ccask"))
            .args(["status", "--watch"])
            .env("CCASK_HOME", env.path())
            .env("CCASK_WORKER_CMD", WORKER_BIN)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        let stdout = child.stdout.take().unwrap();
        let mut lines = BufReader::new(stdout).lines();
        assert!(
            lines
                .by_ref()
                .map_while(Result::ok)
                .any(|line| line.contains("Watching questions"))
        );

        // SAFETY: signals a child we spawned and still own.
        unsafe {
            libc::kill(child.id() as libc::pid_t, libc::SIGINT);
        }

        let deadline = Instant::now() + Duration::from_secs(10);
        let status = loop {
            if let Some(status) = child.try_wait().unwrap() {
                break status;
            }
            if Instant::now() > deadline {
                child.kill().unwrap();
                panic!("status --watch ignored Ctrl+C");
            }
            std::thread::sleep(Duration::from_millis(50));
        };
        assert!(status.success(), "Exited with {status:?}");
    }

    #[test]
    fn test_missing_worker_binary_fails_submission() {
        let env = Env::with_tool("printf 'explanation...'\n");

        env.ccask()
            .env("CCASK_WORKER_CMD", env.path().join("no-such-worker"))
            .args(["add", "TCP handshake"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to launch generation worker"));

        let records = env.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, QuestionStatus::Failed);
    }

    #[test]
    fn test_show_and_status_after_completion() {
        let env = Env::with_tool("printf 'explanation...'\n");
        env.ccask().args(["add", "TCP handshake"]).assert().success();
        let records = env.wait_for_terminal();
        let id = records[0].id.clone();

        env.ccask()
            .args(["show", "TCP handshake"])
            .assert()
            .success()
            .stdout(predicate::str::contains("explanation..."));

        let output = env.ccask().args(["show", &id, "--json"]).output().unwrap();
        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["id"], id.as_str());
        assert_eq!(json["status"], "completed");
        assert_eq!(json["content"], "explanation...");

        let output = env.ccask().args(["show", "-j", "TCP handshake"]).output().unwrap();
        let short: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(short["id"], id.as_str());

        env.ccask()
            .args(["list", "-s", "completed", "-r"])
            .assert()
            .success()
            .stdout(predicate::str::contains("TCP handshake"));
        env.ccask()
            .args(["list", "-p"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No questions found."));

        env.ccask()
            .args(["status", "--filter", "completed"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Completed: 1"))
            .stdout(predicate::str::contains("TCP handshake"));
    }
}

// =============================================================================
// Worker Entry Point
// =============================================================================

mod worker_binary {
    use super::*;

    #[test]
    fn test_worker_without_arguments_exits_1() {
        let env = Env::with_tool("printf 'unused'\n");
        env.worker().assert().failure().code(1);
        assert!(env.diagnostic_log().contains("Invalid worker arguments"));
    }

    #[test]
    fn test_worker_with_incomplete_arguments_exits_1() {
        let env = Env::with_tool("printf 'unused'\n");
        env.worker()
            .arg(r#"{"question": "TCP"}"#)
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains(
                "Missing required arguments: question and filepath",
            ));
    }

    #[cfg(unix)]
    #[test]
    fn test_worker_runs_directly_without_record() {
        let env = Env::with_tool("printf 'direct'\n");
        let target = env.path().join("out/direct.md");
        let args = serde_json::json!({
            "question": "direct run",
            "filepath": target,
        });

        env.worker().arg(args.to_string()).assert().success();

        assert_eq!(fs::read_to_string(&target).unwrap(), "direct");
        assert!(env.diagnostic_log().contains("No question record found for: direct run"));
    }

    #[cfg(unix)]
    #[test]
    fn test_worker_generation_failure_still_exits_0() {
        let env = Env::with_tool("exit 2\n");
        let args = serde_json::json!({
            "question": "broken",
            "filepath": env.path().join("broken.md"),
        });

        env.worker().arg(args.to_string()).assert().success();
        assert!(env.diagnostic_log().contains("Exit code: 2"));
    }
}
