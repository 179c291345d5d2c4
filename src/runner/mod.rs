//! Subprocess runner shared by every installation step
//!
//! Steps never spawn processes directly. They describe the command with a
//! [`CommandSpec`] and hand it to a [`CommandRunner`], which either buffers
//! the combined output (capture mode) or attaches the process to the
//! controlling terminal (interactive mode).

pub mod command;
pub mod subprocess;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

pub use command::{CommandOutput, CommandSpec};
pub use subprocess::SystemCommandRunner;

/// Errors raised while running an external command
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed: {command} ({}){}", describe_exit(.code), render_output(.output))]
    Failed {
        command: String,
        code: Option<i32>,
        output: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

fn render_output(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!("\nOutput: {}", output)
    }
}

/// Trait for command execution - allows swapping the real subprocess runner for a mock
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion, buffering stdout and stderr together.
    ///
    /// A non-zero exit is *not* an error here; only a failure to start the
    /// process is.
    async fn capture(&self, command: &CommandSpec) -> Result<CommandOutput, RunnerError>;

    /// Run the command with stdin/stdout/stderr inherited from this process.
    async fn interactive(&self, command: &CommandSpec) -> Result<CommandOutput, RunnerError>;
}

/// Run in capture mode and turn a non-zero exit into [`RunnerError::Failed`]
/// carrying the trimmed output.
pub async fn run_captured(
    runner: &dyn CommandRunner,
    command: &CommandSpec,
) -> Result<String, RunnerError> {
    let result = runner.capture(command).await?;
    if result.is_success() {
        Ok(result.output)
    } else {
        Err(RunnerError::Failed {
            command: command.to_string(),
            code: result.code,
            output: result.output.trim().to_string(),
        })
    }
}

/// Run attached to the terminal and turn a non-zero exit into an error.
pub async fn run_interactive(
    runner: &dyn CommandRunner,
    command: &CommandSpec,
) -> Result<(), RunnerError> {
    let result = runner.interactive(command).await?;
    if result.is_success() {
        Ok(())
    } else {
        Err(RunnerError::Failed {
            command: command.to_string(),
            code: result.code,
            output: String::new(),
        })
    }
}
