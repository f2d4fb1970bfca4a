//! Typed error hierarchy for ccask.
//!
//! Three top-level enums cover the three subsystems:
//! - `StoreError`: record store load/save and status transitions
//! - `GenerationError`: one run of the external generation tool
//! - `SubmitError`: creating a record and launching its worker

use std::path::PathBuf;

use thiserror::Error;

use crate::store::QuestionStatus;

/// Errors from the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Question store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Question with ID {id} not found")]
    RecordNotFound { id: String },

    #[error("Question with ID {id} already exists")]
    DuplicateId { id: String },

    #[error("Question {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: QuestionStatus,
        to: QuestionStatus,
    },

    #[error("Question store at {path} changed since it was loaded")]
    Conflict { path: PathBuf },

    #[error("Failed to serialize question store: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Question store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from a single generation run.
///
/// The `Display` text is what ends up in a failed record's `error` field.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Process error: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Exit code: {}, Error: {}", exit_code_label(.code), trimmed(.stderr))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Exit code: 0, Error: {}", empty_output_detail(.stderr))]
    EmptyOutput { stderr: String },

    #[error("Failed to write file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid worker arguments: {0}")]
    InvalidArgs(String),
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

fn trimmed(text: &str) -> &str {
    text.trim()
}

fn empty_output_detail(stderr: &str) -> &str {
    let stderr = stderr.trim();
    if stderr.is_empty() { "empty output" } else { stderr }
}

/// Errors from submitting a question.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Failed to launch generation worker {command}: {source}")]
    LaunchFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode worker arguments: {0}")]
    Args(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
