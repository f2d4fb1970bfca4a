//! Shared utility functions for the ccask crate.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Upper bound on the length of a sanitized file stem.
pub const MAX_FILENAME_LEN: usize = 50;

/// Extension of generated answer files.
pub const ANSWER_EXTENSION: &str = "md";

static SEPARATOR_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9-]+").unwrap());

/// Turn a question term into a file stem.
///
/// The result is lowercase, uses only `[a-z0-9_-]`, and is at most
/// [`MAX_FILENAME_LEN`] characters. Runs of anything else collapse into a
/// single `_`. Terms with no usable characters (e.g. entirely non-Latin
/// script) get a stable hash-based stem instead of an empty one.
pub fn sanitize_filename(term: &str) -> String {
    let lowered = term.to_lowercase();
    let collapsed = SEPARATOR_RUN.replace_all(&lowered, "_");
    let trimmed = collapsed.trim_matches('_');

    // Only ASCII survives the regex, so byte truncation is char-safe.
    let truncated = &trimmed[..trimmed.len().min(MAX_FILENAME_LEN)];
    let stem = truncated.trim_end_matches('_');

    if stem.is_empty() {
        let digest = format!("{:x}", Sha256::digest(term.as_bytes()));
        format!("q-{}", &digest[..12])
    } else {
        stem.to_string()
    }
}

/// Where the explanation for `term` is written inside `answers_dir`.
pub fn answer_path(answers_dir: &Path, term: &str) -> PathBuf {
    answers_dir.join(format!("{}.{}", sanitize_filename(term), ANSWER_EXTENSION))
}
