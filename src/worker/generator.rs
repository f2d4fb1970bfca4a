//! Invocation of the external generation tool.

use std::process::Stdio;
use tokio::process::Command;

use crate::errors::GenerationError;

/// A generator command line split into program and leading arguments.
///
/// The configured command is split on whitespace, so `"sh ./mock.sh"` runs
/// `sh` with `./mock.sh` before the `-p <prompt>` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorCommand {
    program: String,
    args: Vec<String>,
}

impl GeneratorCommand {
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Substitute the question into the prompt template.
pub fn render_prompt(template: &str, question: &str) -> String {
    template.replace("{question}", question)
}

/// Run `<command> -p <prompt>` to completion and return its stdout.
///
/// stdout and stderr are buffered in full until the process exits; there
/// is no timeout. Success requires exit code 0 and non-blank stdout.
pub async fn generate(command: &GeneratorCommand, prompt: &str) -> Result<Vec<u8>, GenerationError> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args);
    cmd.arg("-p");
    cmd.arg(prompt);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!(program = %command.program, "Spawning generation tool");
    let output = cmd.output().await.map_err(GenerationError::SpawnFailed)?;

    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code();
    tracing::debug!(?code, stdout_bytes = output.stdout.len(), "Generation tool exited");

    if !output.status.success() {
        return Err(GenerationError::NonZeroExit { code, stderr });
    }
    if String::from_utf8_lossy(&output.stdout).trim().is_empty() {
        return Err(GenerationError::EmptyOutput { stderr });
    }
    Ok(output.stdout)
}
