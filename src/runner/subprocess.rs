//! Real subprocess runner backed by `tokio::process`

use crate::runner::{CommandOutput, CommandRunner, CommandSpec, RunnerError};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs commands on the host system
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner {
    /// Show a spinner while a captured command runs
    show_progress: bool,
}

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    fn spinner(&self, command: &CommandSpec) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(command.program().to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    }
}

fn spawn_error(command: &CommandSpec, source: std::io::Error) -> RunnerError {
    RunnerError::Spawn {
        program: command.program().to_string(),
        source,
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn capture(&self, command: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        debug!("Running: {}", command);

        let spinner = self.spinner(command);
        let result = Command::new(command.program())
            .args(command.get_args())
            .envs(command.get_envs())
            .stdin(Stdio::null())
            .output()
            .await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        let output = result.map_err(|e| spawn_error(command, e))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(
            "{} exited with {:?} ({} bytes of output)",
            command.program(),
            output.status.code(),
            combined.len()
        );

        Ok(CommandOutput {
            code: output.status.code(),
            output: combined,
        })
    }

    async fn interactive(&self, command: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        debug!("Running attached to terminal: {}", command);

        let status = Command::new(command.program())
            .args(command.get_args())
            .envs(command.get_envs())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| spawn_error(command, e))?;

        Ok(CommandOutput {
            code: status.code(),
            output: String::new(),
        })
    }
}
