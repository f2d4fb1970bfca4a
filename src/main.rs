use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ccask::config::Config;
use ccask::telemetry;

mod cmd;

#[derive(Parser)]
#[command(name = "ccask")]
#[command(version, about = "Queue questions and generate explanations in the background")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data directory (defaults to $CCASK_HOME or ~/.ccask)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a question; the explanation is generated in the background
    #[command(visible_alias = "ask")]
    Add {
        /// The term or question to explain
        question: String,
    },
    /// List questions with their status
    List {
        /// Only show pending questions
        #[arg(short, long)]
        pending: bool,
        /// Only show questions from the last 24 hours
        #[arg(short, long)]
        recent: bool,
        /// Filter by status: all, pending, generating, completed, failed
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show question status, optionally refreshing until Ctrl+C
    Status {
        /// Re-poll every 2 seconds
        #[arg(short, long)]
        watch: bool,
        /// Filter by status: all, pending, generating, completed, failed
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Show a question and its explanation
    Show {
        /// Record id or the submitted term
        id_or_term: String,
        /// Print the record as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Copy a completed explanation to the clipboard
    Copy {
        /// Record id or the submitted term
        id_or_term: String,
    },
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_cli(cli.verbose);
    let config = Config::load(cli.data_dir.clone())?;

    match &cli.command {
        Commands::Add { question } => cmd::cmd_add(&config, question)?,
        Commands::List {
            pending,
            recent,
            status,
        } => cmd::cmd_list(&config, status.as_deref(), *pending, *recent)?,
        Commands::Status { watch, filter } => {
            cmd::cmd_status(&config, filter.as_deref(), *watch).await?
        }
        Commands::Show { id_or_term, json } => cmd::cmd_show(&config, id_or_term, *json)?,
        Commands::Copy { id_or_term } => cmd::cmd_copy(&config, id_or_term)?,
        Commands::Config => cmd::cmd_config(&config)?,
    }

    Ok(())
}
