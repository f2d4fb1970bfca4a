//! Configuration for ccask.
//!
//! Settings are layered: built-in defaults, then `<data-dir>/config.toml`,
//! then environment variables, then CLI flags (only the data directory can
//! be set from the command line).
//!
//! # Configuration File Format
//!
//! ```toml
//! generator_cmd = "claude"
//! answers_dir = "answers"          # relative paths resolve against the data dir
//! worker_cmd = "/usr/local/bin/ccask-worker"
//! prompt_template = "Explain {question} in detail."
//! ```
//!
//! # Environment
//!
//! | Variable              | Overrides                              |
//! |-----------------------|----------------------------------------|
//! | `CCASK_HOME`          | data directory (default `~/.ccask`)    |
//! | `CCASK_GENERATOR_CMD` | `generator_cmd` (`CLAUDE_CMD` also read) |
//! | `CCASK_ANSWERS_DIR`   | `answers_dir`                          |
//! | `CCASK_WORKER_CMD`    | `worker_cmd`                           |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::RecordStore;

pub const DATA_DIR_NAME: &str = ".ccask";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_FILE_NAME: &str = "ccask.log";
pub const WORKER_BIN_NAME: &str = "ccask-worker";
pub const DEFAULT_GENERATOR_CMD: &str = "claude";
pub const DEFAULT_ANSWERS_DIR: &str = "answers";

/// Prompt handed to the generation tool; `{question}` is replaced with the term.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "Explain \"{question}\" in detail. \
Cover the technical terminology involved and keep the explanation easy to follow.";

pub const ENV_HOME: &str = "CCASK_HOME";
pub const ENV_GENERATOR_CMD: &str = "CCASK_GENERATOR_CMD";
pub const ENV_CLAUDE_CMD: &str = "CLAUDE_CMD";
pub const ENV_ANSWERS_DIR: &str = "CCASK_ANSWERS_DIR";
pub const ENV_WORKER_CMD: &str = "CCASK_WORKER_CMD";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub generator_cmd: Option<String>,
    #[serde(default)]
    pub answers_dir: Option<PathBuf>,
    #[serde(default)]
    pub worker_cmd: Option<PathBuf>,
    #[serde(default)]
    pub prompt_template: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub store_file: PathBuf,
    pub answers_dir: PathBuf,
    pub log_file: PathBuf,
    pub worker_log_dir: PathBuf,
    pub generator_cmd: String,
    pub worker_cmd: PathBuf,
    pub prompt_template: String,
    /// Whether a config.toml was found and applied.
    pub from_file: bool,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `data_dir` comes from the CLI and takes precedence over `CCASK_HOME`.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        Self::load_with_env(data_dir, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an injectable environment lookup.
    pub fn load_with_env(
        data_dir: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let data_dir = match data_dir.or_else(|| env(ENV_HOME).map(PathBuf::from)) {
            Some(dir) => dir,
            None => dirs::home_dir()
                .context("Could not determine home directory; set CCASK_HOME")?
                .join(DATA_DIR_NAME),
        };

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        let file = if config_path.exists() {
            Some(ConfigFile::load(&config_path)?)
        } else {
            None
        };

        Ok(Self::resolve(data_dir, file, env))
    }

    fn resolve(
        data_dir: PathBuf,
        file: Option<ConfigFile>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let from_file = file.is_some();
        let file = file.unwrap_or_default();
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let generator_cmd = non_empty(ENV_GENERATOR_CMD)
            .or_else(|| non_empty(ENV_CLAUDE_CMD))
            .or(file.generator_cmd)
            .unwrap_or_else(|| DEFAULT_GENERATOR_CMD.to_string());

        let answers_dir = non_empty(ENV_ANSWERS_DIR)
            .map(PathBuf::from)
            .or(file.answers_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ANSWERS_DIR));
        let answers_dir = if answers_dir.is_absolute() {
            answers_dir
        } else {
            data_dir.join(answers_dir)
        };

        let worker_cmd = non_empty(ENV_WORKER_CMD)
            .map(PathBuf::from)
            .or(file.worker_cmd)
            .unwrap_or_else(default_worker_cmd);

        let prompt_template = file
            .prompt_template
            .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string());

        Self {
            store_file: RecordStore::in_dir(&data_dir).path().to_path_buf(),
            log_file: data_dir.join(LOG_FILE_NAME),
            worker_log_dir: data_dir.join("logs"),
            answers_dir,
            generator_cmd,
            worker_cmd,
            prompt_template,
            from_file,
            data_dir,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }

    pub fn record_store(&self) -> RecordStore {
        RecordStore::new(&self.store_file)
    }
}

/// `ccask-worker` next to the running executable, else whatever is on PATH.
fn default_worker_cmd() -> PathBuf {
    let file_name = format!("{}{}", WORKER_BIN_NAME, std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&file_name)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| PathBuf::from(file_name))
}
