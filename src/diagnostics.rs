//! Append-only diagnostic log for postmortems.
//!
//! One line per event, `[<ISO-8601 timestamp>] <message>`, independent of
//! the record store so a corrupt store never hides what the worker did.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: PathBuf,
}

impl DiagnosticLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line.
    pub fn append(&self, message: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create log directory")?;
        }

        // Embedded newlines would break the one-line-per-event format.
        let message = message.trim_end().replace('\n', " | ");
        let entry = format!(
            "[{}] {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message
        );

        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open diagnostic log")?
            .write_all(entry.as_bytes())
            .context("Failed to write diagnostic log entry")?;

        Ok(())
    }

    /// Append, reporting failures through tracing instead of returning them.
    pub fn record(&self, message: &str) {
        if let Err(e) = self.append(message) {
            tracing::warn!(path = %self.path.display(), error = %e, "Diagnostic log write failed");
        }
    }
}
