//! Question submission: `ccask add`.

use anyhow::{Context, Result};
use console::style;

use ccask::config::Config;
use ccask::submitter::Submitter;
use ccask::ui::icons::{FILE, PENDING};

pub fn cmd_add(config: &Config, question: &str) -> Result<()> {
    let submitter = Submitter::from_config(config);
    let target = submitter.answer_path(question.trim());
    let record = submitter
        .submit(question)
        .with_context(|| format!("Failed to submit question: {}", question.trim()))?;

    println!(
        "{}Queued {} {}",
        PENDING,
        style(&record.term).bold(),
        style(format!("({})", record.id)).dim()
    );
    println!("{}Explanation will be written to {}", FILE, target.display());
    println!(
        "Run {} to follow progress.",
        style("ccask status --watch").cyan()
    );
    Ok(())
}
