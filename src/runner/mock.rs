//! Recording command runner for unit tests

use crate::runner::{CommandOutput, CommandRunner, CommandSpec, RunnerError};
use async_trait::async_trait;
use std::sync::Mutex;

type Hook = Box<dyn Fn() + Send + Sync>;

/// A command seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub command: String,
    pub envs: Vec<(String, String)>,
    pub interactive: bool,
}

enum Scripted {
    Output(CommandOutput),
    SpawnError,
}

/// Mock runner: every command succeeds with empty output unless a response
/// is scripted for a substring of its command line (first match wins).
#[derive(Default)]
pub struct MockRunner {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<Vec<(String, Scripted)>>,
    hooks: Mutex<Vec<(String, Hook)>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, pattern: &str, output: CommandOutput) {
        self.responses
            .lock()
            .unwrap()
            .push((pattern.to_string(), Scripted::Output(output)));
    }

    pub fn spawn_error(&self, pattern: &str) {
        self.responses
            .lock()
            .unwrap()
            .push((pattern.to_string(), Scripted::SpawnError));
    }

    /// Run `hook` whenever a matching command executes (e.g. to create the
    /// files the real tool would write)
    pub fn on_run<F>(&self, pattern: &str, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks
            .lock()
            .unwrap()
            .push((pattern.to_string(), Box::new(hook)));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }

    pub fn was_run_containing(&self, needle: &str) -> bool {
        self.commands().iter().any(|c| c.contains(needle))
    }

    fn record(
        &self,
        command: &CommandSpec,
        interactive: bool,
    ) -> Result<CommandOutput, RunnerError> {
        let line = command.to_string();
        let envs = command
            .get_envs()
            .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
            .collect();
        self.calls.lock().unwrap().push(RecordedCall {
            command: line.clone(),
            envs,
            interactive,
        });

        for (pattern, hook) in self.hooks.lock().unwrap().iter() {
            if line.contains(pattern.as_str()) {
                hook();
            }
        }

        let responses = self.responses.lock().unwrap();
        match responses.iter().find(|(pattern, _)| line.contains(pattern.as_str())) {
            Some((_, Scripted::Output(output))) => Ok(output.clone()),
            Some((_, Scripted::SpawnError)) => Err(RunnerError::Spawn {
                program: command.program().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }),
            None => Ok(CommandOutput::success("")),
        }
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn capture(&self, command: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        self.record(command, false)
    }

    async fn interactive(&self, command: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        self.record(command, true).map(|mut output| {
            output.output.clear();
            output
        })
    }
}
