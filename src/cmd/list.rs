//! Record listing: `ccask list`.

use anyhow::Result;
use chrono::{Duration, Utc};
use console::style;

use ccask::config::Config;
use ccask::query::{QueryService, StatusCounts};
use ccask::store::QuestionStatus;
use ccask::ui::format_question;
use ccask::ui::format_stats;
use ccask::ui::icons::{FILTER, LIST, STATS};

/// Window kept by `--recent`.
const RECENT_HOURS: i64 = 24;

/// Render the stats line and the matching records, newest first.
pub fn render_questions(
    query: &QueryService,
    status: Option<QuestionStatus>,
    recent: bool,
) -> Result<String> {
    let all = query.get_all()?;
    let stats = StatusCounts::from_records(&all);
    let cutoff = Utc::now() - Duration::hours(RECENT_HOURS);

    let shown: Vec<_> = all
        .iter()
        .filter(|q| status.is_none_or(|s| q.status == s))
        .filter(|q| !recent || q.created_at >= cutoff)
        .collect();

    let mut out = Vec::new();
    out.push(format!("{}{}", STATS, style("Statistics").bold()));
    out.push(format_stats(&stats));
    out.push(String::new());

    let mut heading = format!("{}{}", LIST, style("Questions").bold());
    if let Some(s) = status {
        heading.push_str(&format!(" {}{}", FILTER, s));
    }
    if recent {
        heading.push_str(&format!(" (last {}h)", RECENT_HOURS));
    }
    out.push(heading);

    if shown.is_empty() {
        out.push("  No questions found.".to_string());
    } else {
        for q in shown {
            out.push(String::new());
            out.push(format_question(q));
        }
    }
    Ok(out.join("\n"))
}

/// Parse `--status`; `all` means no filter.
pub fn parse_filter(raw: Option<&str>) -> Result<Option<QuestionStatus>> {
    match raw {
        None | Some("all") => Ok(None),
        Some(s) => Ok(Some(s.parse()?)),
    }
}

pub fn cmd_list(config: &Config, status: Option<&str>, pending: bool, recent: bool) -> Result<()> {
    let filter = if pending {
        Some(QuestionStatus::Pending)
    } else {
        parse_filter(status)?
    };
    let query = QueryService::new(config.record_store());
    println!("{}", render_questions(&query, filter, recent)?);
    Ok(())
}
