//! Status view with optional polling: `ccask status`.

use anyhow::Result;
use console::{Term, style};
use std::time::Duration;

use ccask::config::Config;
use ccask::query::QueryService;
use ccask::ui::icons::WATCH;

use super::list::{parse_filter, render_questions};

/// Refresh period for `--watch`.
const WATCH_INTERVAL: Duration = Duration::from_secs(2);

pub async fn cmd_status(config: &Config, filter: Option<&str>, watch: bool) -> Result<()> {
    let filter = parse_filter(filter)?;
    let query = QueryService::new(config.record_store());

    if !watch {
        println!("{}", render_questions(&query, filter, false)?);
        return Ok(());
    }

    let term = Term::stdout();
    let mut ticker = tokio::time::interval(WATCH_INTERVAL);
    // Registered once so a Ctrl+C during a redraw is still delivered.
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    loop {
        tokio::select! {
            biased;
            _ = &mut interrupted => {
                println!();
                tracing::debug!("Status watch interrupted");
                return Ok(());
            }
            _ = ticker.tick() => {
                let view = render_questions(&query, filter, false)?;
                term.clear_screen()?;
                println!(
                    "{}{} {}",
                    WATCH,
                    style("Watching questions").bold(),
                    style("(Ctrl+C to stop)").dim()
                );
                println!();
                println!("{}", view);
            }
        }
    }
}
