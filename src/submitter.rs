//! Job submission: create a pending record and hand it to a detached worker.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::{Config, ENV_HOME};
use crate::errors::SubmitError;
use crate::store::{QuestionRecord, RecordStore, Transition};
use crate::util::answer_path;
use crate::worker::WorkerArgs;

/// Starts a worker for a submission without waiting for it.
pub trait WorkerLauncher {
    fn launch(&self, args: &WorkerArgs) -> Result<(), SubmitError>;
}

/// Launches `ccask-worker` as a detached OS process.
///
/// The child gets null stdio and is detached from our session (Unix) or
/// console (Windows), so closing the submitting terminal does not stop it.
/// The handle is dropped without waiting; the worker keeps running after
/// we exit.
#[derive(Debug, Clone)]
pub struct DetachedLauncher {
    program: PathBuf,
    envs: Vec<(String, OsString)>,
}

impl DetachedLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            envs: Vec::new(),
        }
    }

    /// Launcher for `config`, pointing the worker at the same data directory.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.worker_cmd).env(ENV_HOME, config.data_dir.as_os_str())
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

impl WorkerLauncher for DetachedLauncher {
    fn launch(&self, args: &WorkerArgs) -> Result<(), SubmitError> {
        let payload = args.to_json().map_err(SubmitError::Args)?;

        let mut cmd = Command::new(&self.program);
        cmd.arg(payload)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        detach(&mut cmd);

        let child = cmd.spawn().map_err(|source| SubmitError::LaunchFailed {
            command: self.program.display().to_string(),
            source,
        })?;
        tracing::debug!(pid = child.id(), worker = %self.program.display(), "Worker launched");
        Ok(())
    }
}

/// Start the child in a new session so it has no controlling terminal and
/// a hangup or Ctrl+C in ours does not reach it.
#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;

    let new_session = || {
        // SAFETY: setsid takes no pointers and is async-signal-safe.
        if unsafe { libc::setsid() } == -1 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    };
    // SAFETY: the hook only calls setsid between fork and exec.
    unsafe {
        cmd.pre_exec(new_session);
    }
}

/// Start the child without a console and outside our Ctrl+C group.
#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;

    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}

/// Creates records and launches their workers.
pub struct Submitter<L> {
    store: RecordStore,
    answers_dir: PathBuf,
    generator_cmd: Option<String>,
    launcher: L,
}

impl<L: WorkerLauncher> Submitter<L> {
    pub fn new(store: RecordStore, answers_dir: impl Into<PathBuf>, launcher: L) -> Self {
        Self {
            store,
            answers_dir: answers_dir.into(),
            generator_cmd: None,
            launcher,
        }
    }

    /// Generator command forwarded to the worker in its argument bundle.
    pub fn with_generator_cmd(mut self, generator_cmd: impl Into<String>) -> Self {
        self.generator_cmd = Some(generator_cmd.into());
        self
    }

    pub fn answers_dir(&self) -> &Path {
        &self.answers_dir
    }

    /// Target file the explanation for `term` is written to.
    pub fn answer_path(&self, term: &str) -> PathBuf {
        answer_path(&self.answers_dir, term)
    }

    /// Record `term` as pending and start its worker.
    ///
    /// Returns as soon as the worker process is spawned. If the spawn fails
    /// the new record is marked failed before the error is returned, so it
    /// does not sit in Pending forever.
    pub fn submit(&self, term: &str) -> Result<QuestionRecord, SubmitError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(SubmitError::EmptyQuestion);
        }

        let record = QuestionRecord::new(term);
        self.store.insert(record.clone())?;

        let args = WorkerArgs {
            question: record.term.clone(),
            filepath: self.answer_path(term),
            generator_command: self.generator_cmd.clone(),
            question_id: Some(record.id.clone()),
        };

        if let Err(e) = self.launcher.launch(&args) {
            let error = e.to_string();
            if let Err(store_err) = self.store.transition(&record.id, Transition::Failed { error }) {
                tracing::warn!(id = %record.id, error = %store_err, "Could not mark record failed");
            }
            return Err(e);
        }

        tracing::info!(id = %record.id, term, "Question submitted");
        Ok(record)
    }
}

impl Submitter<DetachedLauncher> {
    pub fn from_config(config: &Config) -> Self {
        Submitter::new(
            config.record_store(),
            &config.answers_dir,
            DetachedLauncher::from_config(config),
        )
        .with_generator_cmd(&config.generator_cmd)
    }
}
