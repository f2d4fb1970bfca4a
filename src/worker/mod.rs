//! Generation worker.
//!
//! Runs once per submission in its own detached process (`ccask-worker`)
//! and drives one record from Pending to a terminal status:
//!
//! 1. validate the argument bundle (the only hard failure)
//! 2. find the record, by id when the bundle has one, else by term
//! 3. mark it Generating, or stop if it is already Completed or Failed
//! 4. run the generation tool and write its stdout to the target file
//! 5. mark it Completed or Failed and append the outcome to the diagnostic log
//!
//! Nobody observes the worker's exit status, so every failure after step 1
//! ends up on the record and in the log instead of in an error return.
//! Store problems (missing record, unreadable store) are logged and skipped.

mod generator;

pub use generator::{GeneratorCommand, generate, render_prompt};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::diagnostics::DiagnosticLog;
use crate::errors::{GenerationError, StoreError};
use crate::store::{QuestionStatus, RecordStore, Transition};

/// The single serialized argument handed to `ccask-worker`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerArgs {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub filepath: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
}

impl WorkerArgs {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, GenerationError> {
        serde_json::from_str(raw)
            .map_err(|e| GenerationError::InvalidArgs(format!("Failed to parse arguments: {e}")))
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.question.trim().is_empty() || self.filepath.as_os_str().is_empty() {
            return Err(GenerationError::InvalidArgs(
                "Missing required arguments: question and filepath".to_string(),
            ));
        }
        Ok(())
    }
}

/// Terminal result of one worker run.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutcome {
    Completed { filepath: PathBuf },
    Failed { error: String },
    /// The record was already terminal; the tool was not run.
    Skipped { status: QuestionStatus },
}

pub struct GenerationWorker {
    store: RecordStore,
    log: DiagnosticLog,
    prompt_template: String,
    default_generator: String,
}

impl GenerationWorker {
    pub fn new(
        store: RecordStore,
        log: DiagnosticLog,
        prompt_template: impl Into<String>,
        default_generator: impl Into<String>,
    ) -> Self {
        Self {
            store,
            log,
            prompt_template: prompt_template.into(),
            default_generator: default_generator.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.record_store(),
            DiagnosticLog::new(&config.log_file),
            config.prompt_template.clone(),
            config.generator_cmd.clone(),
        )
    }

    /// Drive one submission to a terminal status.
    ///
    /// Returns `Err` only for an invalid argument bundle.
    pub async fn run(&self, args: &WorkerArgs) -> Result<WorkerOutcome, GenerationError> {
        if let Err(e) = args.validate() {
            self.log.record(&e.to_string());
            return Err(e);
        }

        let question = args.question.as_str();
        self.log.record(&format!("Starting generation for: {question}"));
        tracing::info!(question, filepath = %args.filepath.display(), "Starting generation");

        let record_id = self.locate(args);
        if let Some(id) = record_id.as_deref() {
            match self.store.transition(id, Transition::Generating) {
                Ok(_) => {}
                Err(StoreError::InvalidTransition { from, .. }) => {
                    self.log.record(&format!(
                        "Skipping generation for {question}: question {id} is already {from}"
                    ));
                    tracing::info!(question, id, status = %from, "Record already settled, skipping");
                    return Ok(WorkerOutcome::Skipped { status: from });
                }
                Err(e) => self.report_update_failure(id, QuestionStatus::Generating, &e),
            }
        }

        match self.generate_to_file(args).await {
            Ok(()) => {
                let filepath = args.filepath.clone();
                self.update(
                    record_id.as_deref(),
                    Transition::Completed {
                        filepath: filepath.clone(),
                    },
                );
                self.log.record(&format!(
                    "Successfully generated explanation for: {question} -> {}",
                    filepath.display()
                ));
                tracing::info!(question, "Generation completed");
                Ok(WorkerOutcome::Completed { filepath })
            }
            Err(e) => {
                let error = e.to_string();
                self.update(
                    record_id.as_deref(),
                    Transition::Failed {
                        error: error.clone(),
                    },
                );
                self.log.record(&format!(
                    "Failed to generate explanation for {question}. {error}"
                ));
                tracing::warn!(question, %error, "Generation failed");
                Ok(WorkerOutcome::Failed { error })
            }
        }
    }

    async fn generate_to_file(&self, args: &WorkerArgs) -> Result<(), GenerationError> {
        ensure_parent_dir(&args.filepath).await?;

        let command_line = args
            .generator_command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&self.default_generator);
        let command = GeneratorCommand::parse(command_line).ok_or_else(|| {
            GenerationError::SpawnFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "generator command is empty",
            ))
        })?;

        let prompt = render_prompt(&self.prompt_template, &args.question);
        let content = generate(&command, &prompt).await?;

        tokio::fs::write(&args.filepath, &content)
            .await
            .map_err(|source| GenerationError::WriteFailed {
                path: args.filepath.clone(),
                source,
            })
    }

    /// Resolve the record this run belongs to. A miss is logged, not fatal.
    fn locate(&self, args: &WorkerArgs) -> Option<String> {
        if let Some(id) = &args.question_id {
            return Some(id.clone());
        }
        match self.store.load() {
            Ok(store) => {
                let found = store.find_by_term(&args.question).map(|r| r.id.clone());
                if found.is_none() {
                    self.log
                        .record(&format!("No question record found for: {}", args.question));
                }
                found
            }
            Err(e) => {
                self.log
                    .record(&format!("Failed to read question store: {e}"));
                None
            }
        }
    }

    /// Best-effort status update; failures are logged and swallowed.
    fn update(&self, record_id: Option<&str>, transition: Transition) {
        let Some(id) = record_id else {
            return;
        };
        let target = transition.target();
        if let Err(e) = self.store.transition(id, transition) {
            self.report_update_failure(id, target, &e);
        }
    }

    fn report_update_failure(&self, id: &str, target: QuestionStatus, error: &StoreError) {
        tracing::warn!(id, %target, %error, "Status update skipped");
        self.log
            .record(&format!("Failed to update question status: {error}"));
    }
}

async fn ensure_parent_dir(path: &Path) -> Result<(), GenerationError> {
    let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| GenerationError::WriteFailed {
            path: dir.to_path_buf(),
            source,
        })
}
