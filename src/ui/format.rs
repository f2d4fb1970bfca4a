//! Plain-text rendering of question records for the CLI views.

use chrono::{DateTime, Local, Utc};
use console::style;

use crate::query::StatusCounts;
use crate::store::{QuestionRecord, QuestionStatus};
use crate::ui::icons::{CHECK, CROSS, GENERATING, PENDING};

/// Human duration between two instants: `1m 5s` or `42s`.
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let seconds = (end - start).num_seconds().max(0);
    let minutes = seconds / 60;
    if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

pub fn format_status(status: QuestionStatus) -> String {
    match status {
        QuestionStatus::Pending => format!("{}{}", PENDING, style("Pending").yellow()),
        QuestionStatus::Generating => format!("{}{}", GENERATING, style("Generating").cyan()),
        QuestionStatus::Completed => format!("{}{}", CHECK, style("Completed").green()),
        QuestionStatus::Failed => format!("{}{}", CROSS, style("Failed").red()),
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Multi-line summary of one record.
pub fn format_question(question: &QuestionRecord) -> String {
    let mut lines = vec![
        format!("[{}] {}", style(&question.id).dim(), style(&question.term).bold()),
        format!("  Status:    {}", format_status(question.status)),
        format!("  Created:   {}", format_time(question.created_at)),
    ];

    if let Some(started) = question.started_at {
        lines.push(format!("  Started:   {}", format_time(started)));
    }
    if let (Some(started), Some(completed)) = (question.started_at, question.completed_at) {
        lines.push(format!(
            "  Completed: {} ({})",
            format_time(completed),
            format_duration(started, completed)
        ));
    }
    if let Some(path) = &question.filepath {
        lines.push(format!("  File:      {}", path.display()));
    }
    if let Some(error) = &question.error {
        lines.push(format!("  Error:     {}", style(error).red()));
    }

    lines.join("\n")
}

pub fn format_stats(stats: &StatusCounts) -> String {
    format!(
        "  Pending: {} | Generating: {} | Completed: {} | Failed: {}",
        stats.pending, stats.generating, stats.completed, stats.failed
    )
}
