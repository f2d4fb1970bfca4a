//! Question records and the persisted store document.
//!
//! A [`Store`] is a plain value: callers load it through a [`RecordStore`],
//! change it in memory, and hand it back for a whole-document replace.
//! Status changes go through [`QuestionRecord::apply`], which enforces the
//! forward-only lifecycle:
//!
//! ```text
//! Pending ──► Generating ──► Completed
//!    │             │
//!    └─────────────┴───────► Failed
//! ```

mod record_store;

pub use record_store::{RecordStore, STORE_FILE_NAME};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::errors::StoreError;

/// Schema version written into fresh stores.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Prefix of every generated question id.
pub const ID_PREFIX: &str = "q_";

/// Lifecycle state of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl QuestionStatus {
    pub const ALL: [QuestionStatus; 4] = [
        QuestionStatus::Pending,
        QuestionStatus::Generating,
        QuestionStatus::Completed,
        QuestionStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionStatus::Pending => "pending",
            QuestionStatus::Generating => "generating",
            QuestionStatus::Completed => "completed",
            QuestionStatus::Failed => "failed",
        }
    }

    /// Completed and Failed accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, QuestionStatus::Completed | QuestionStatus::Failed)
    }

    /// Position in the lifecycle; both terminal states share the last rank.
    fn rank(self) -> u8 {
        match self {
            QuestionStatus::Pending => 0,
            QuestionStatus::Generating => 1,
            QuestionStatus::Completed | QuestionStatus::Failed => 2,
        }
    }
}

impl std::fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuestionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(QuestionStatus::Pending),
            "generating" => Ok(QuestionStatus::Generating),
            "completed" => Ok(QuestionStatus::Completed),
            "failed" => Ok(QuestionStatus::Failed),
            _ => anyhow::bail!(
                "Invalid status '{}'. Valid values: pending, generating, completed, failed",
                s
            ),
        }
    }
}

/// A requested change of status, carrying the data the target state needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Generating,
    Completed { filepath: PathBuf },
    Failed { error: String },
}

impl Transition {
    pub fn target(&self) -> QuestionStatus {
        match self {
            Transition::Generating => QuestionStatus::Generating,
            Transition::Completed { .. } => QuestionStatus::Completed,
            Transition::Failed { .. } => QuestionStatus::Failed,
        }
    }
}

/// One tracked question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    pub term: String,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QuestionRecord {
    /// Build a new pending record with a fresh id.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            term: term.into(),
            status: QuestionStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            filepath: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a status transition.
    ///
    /// Re-entering Generating from Generating is a no-op so repeated updates
    /// are idempotent. Any move backwards, out of a terminal state, or
    /// straight from Pending to Completed is rejected and leaves the record
    /// untouched.
    pub fn apply(&mut self, transition: Transition, now: DateTime<Utc>) -> Result<(), StoreError> {
        let from = self.status;
        let to = transition.target();

        let allowed = match (from, to) {
            (QuestionStatus::Generating, QuestionStatus::Generating) => return Ok(()),
            (QuestionStatus::Pending, QuestionStatus::Completed) => false,
            _ => !from.is_terminal() && to.rank() > from.rank(),
        };
        if !allowed {
            return Err(StoreError::InvalidTransition {
                id: self.id.clone(),
                from,
                to,
            });
        }

        self.status = to;
        match transition {
            Transition::Generating => {
                self.started_at.get_or_insert(now);
            }
            Transition::Completed { filepath } => {
                self.completed_at.get_or_insert(now);
                self.filepath = Some(filepath);
                self.error = None;
            }
            Transition::Failed { error } => {
                self.error = Some(error);
                self.filepath = None;
            }
        }
        Ok(())
    }
}

/// Generate a question id: the prefix followed by a v4 UUID in simple form.
pub fn generate_id() -> String {
    format!("{}{}", ID_PREFIX, Uuid::new_v4().simple())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetadata {
    #[serde(alias = "version")]
    pub schema_version: String,
    pub last_updated: DateTime<Utc>,
}

/// The whole persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(alias = "questions")]
    pub records: Vec<QuestionRecord>,
    pub metadata: StoreMetadata,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            metadata: StoreMetadata {
                schema_version: SCHEMA_VERSION.to_string(),
                last_updated: Utc::now(),
            },
        }
    }
}

impl Store {
    pub fn get(&self, id: &str) -> Option<&QuestionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut QuestionRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// First record submitted with this term.
    pub fn find_by_term(&self, term: &str) -> Option<&QuestionRecord> {
        self.records.iter().find(|r| r.term == term)
    }

    /// Append a record, refusing an id that is already present.
    pub fn insert(&mut self, record: QuestionRecord) -> Result<(), StoreError> {
        if self.get(&record.id).is_some() {
            return Err(StoreError::DuplicateId { id: record.id });
        }
        self.records.push(record);
        Ok(())
    }
}
