//! Explanation display and clipboard copy: `ccask show`, `ccask copy`.

use anyhow::{Context, Result, bail};
use console::style;
use std::io::Write;
use std::process::{Command, Stdio};

use ccask::config::Config;
use ccask::query::QueryService;
use ccask::store::{QuestionRecord, QuestionStatus};
use ccask::ui::format_question;
use ccask::ui::icons::CHECK;

fn find(config: &Config, id_or_term: &str) -> Result<QuestionRecord> {
    QueryService::new(config.record_store())
        .find(id_or_term)?
        .with_context(|| format!("No question found for: {}", id_or_term))
}

/// Explanation text of a completed record, `None` for any other status.
fn read_content(record: &QuestionRecord) -> Result<Option<String>> {
    match (&record.status, &record.filepath) {
        (QuestionStatus::Completed, Some(path)) => std::fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("Failed to read explanation file {}", path.display())),
        _ => Ok(None),
    }
}

pub fn cmd_show(config: &Config, id_or_term: &str, json: bool) -> Result<()> {
    let record = find(config, id_or_term)?;
    let content = read_content(&record)?;

    if json {
        let mut value = serde_json::to_value(&record)?;
        if let (Some(obj), Some(text)) = (value.as_object_mut(), &content) {
            obj.insert("content".into(), serde_json::Value::String(text.clone()));
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", format_question(&record));
    if let Some(text) = content {
        println!();
        println!("{}", text.trim_end());
    }
    Ok(())
}

type ClipboardTool = (&'static str, &'static [&'static str]);

#[cfg(target_os = "macos")]
const CLIPBOARD_TOOLS: &[ClipboardTool] = &[("pbcopy", &[])];
#[cfg(windows)]
const CLIPBOARD_TOOLS: &[ClipboardTool] = &[("clip", &[])];
#[cfg(not(any(target_os = "macos", windows)))]
const CLIPBOARD_TOOLS: &[ClipboardTool] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
];

fn copy_to_clipboard(text: &str) -> Result<&'static str> {
    for &(program, args) in CLIPBOARD_TOOLS {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(program, error = %e, "Clipboard tool unavailable");
                continue;
            }
        };
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        let status = child.wait()?;
        if status.success() {
            return Ok(program);
        }
        tracing::debug!(program, ?status, "Clipboard tool failed");
    }
    bail!("No working clipboard tool found (tried pbcopy, wl-copy, xclip, clip)")
}

pub fn cmd_copy(config: &Config, id_or_term: &str) -> Result<()> {
    let record = find(config, id_or_term)?;
    let Some(content) = read_content(&record)? else {
        bail!(
            "Question '{}' is {}; only completed explanations can be copied",
            record.term,
            record.status
        );
    };

    let tool = copy_to_clipboard(&content)?;
    println!(
        "{}Copied explanation for {} {}",
        CHECK,
        style(&record.term).bold(),
        style(format!("(via {})", tool)).dim()
    );
    Ok(())
}
