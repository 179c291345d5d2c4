//! Test utilities shared by the scenario tests

#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use sts_installer::core::state::StepState;
use sts_installer::execution::{ExecutionEvent, InstallEngine, Prompter};
use sts_installer::{
    CommandOutput, CommandRunner, CommandSpec, PipelineConfig, RunSummary, RunnerError, StepKind,
};
use tempfile::TempDir;

pub const RELEASE: &str = "quay.io/openshift-release-dev/ocp-release:4.12.0-x86_64";
pub const CCO_IMAGE: &str = "quay.io/openshift-release-dev/ocp-v4.0-art-dev@sha256:cco";

/// What `openshift-install create install-config` writes by default
const WIZARD_INSTALL_CONFIG: &str = "\
apiVersion: v1
baseDomain: example.com
compute:
- name: worker
  replicas: 3
controlPlane:
  name: master
  replicas: 3
metadata:
  name: sts-demo
platform:
  aws:
    region: us-east-2
";

/// Temporary workspace root holding `artifacts/`
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn version_dir(&self) -> PathBuf {
        self.root().join("artifacts/4.12.0-x86_64")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.version_dir().join(relative)
    }

    /// Default configuration, with a credentials file inside the workspace
    pub fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::for_release(RELEASE).unwrap();
        config.aws_credentials_file = Some(self.root().join("aws-credentials"));
        config
    }

    pub fn write_credentials(&self) {
        fs::write(
            self.root().join("aws-credentials"),
            "[default]\naws_access_key_id = AKIAWORKSPACE\naws_secret_access_key = secret\n",
        )
        .unwrap();
    }
}

/// A command seen by [`FakeTools`]
#[derive(Debug, Clone)]
pub struct Call {
    pub command: String,
    pub envs: Vec<(String, String)>,
    pub interactive: bool,
}

/// Stands in for `oc`, `openshift-install` and `ccoctl`, writing the files
/// each real tool would leave behind
pub struct FakeTools {
    version_dir: PathBuf,
    install_config: Mutex<String>,
    failures: Mutex<Vec<String>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTools {
    pub fn new(workspace: &Workspace) -> Arc<Self> {
        Arc::new(Self {
            version_dir: workspace.version_dir(),
            install_config: Mutex::new(WIZARD_INSTALL_CONFIG.to_string()),
            failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Content the install-config wizard writes
    pub fn set_install_config(&self, content: &str) {
        *self.install_config.lock().unwrap() = content.to_string();
    }

    /// Make every command containing `pattern` exit with status 1
    pub fn fail_on(&self, pattern: &str) {
        self.failures.lock().unwrap().push(pattern.to_string());
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.commands().iter().any(|c| c.contains(needle))
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.version_dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn simulate(&self, line: &str) -> CommandOutput {
        if self.failures.lock().unwrap().iter().any(|p| line.contains(p.as_str())) {
            return CommandOutput::failure(1, format!("simulated failure of {}", line));
        }

        if line.contains("release extract --credentials-requests") {
            self.write(
                "credreqs/0000_50_cloud-credential-operator_image-registry.yaml",
                "kind: CredentialsRequest",
            );
        } else if line.contains("--command=openshift-install") {
            self.write("bin/openshift-install", "#!/bin/sh\n");
        } else if line.contains("--image-for=cloud-credential-operator") {
            return CommandOutput::success(format!("{}\n", CCO_IMAGE));
        } else if line.contains("oc image extract") {
            self.write("bin/ccoctl", "#!/bin/sh\n");
        } else if line.contains("create install-config") {
            let content = self.install_config.lock().unwrap().clone();
            self.write("install-config.yaml", &content);
        } else if line.contains("create manifests") {
            self.write("manifests/cluster-config.yaml", "kind: ConfigMap");
            fs::remove_file(self.version_dir.join("install-config.yaml")).unwrap();
        } else if line.contains("aws create-all") {
            self.write(
                "_output/manifests/openshift-image-registry-installer-cloud-credentials-credentials.yaml",
                "kind: Secret",
            );
            self.write("_output/tls/bound-service-account-signing-key.key", "key");
        } else if line.contains("create cluster") {
            self.write(".openshift_install.log", "level=info msg=\"Install complete!\"\n");
            self.write("auth/kubeconfig", "apiVersion: v1\n");
            self.write("metadata.json", r#"{"clusterName":"sts-demo","infraID":"sts-demo-x7k2p"}"#);
        } else if line.contains("get secret aws-creds") {
            return CommandOutput::failure(
                1,
                "Error from server (NotFound): secrets \"aws-creds\" not found",
            );
        } else if line.contains("installer-cloud-credentials") {
            let credentials = STANDARD.encode(concat!(
                "[default]\n",
                "role_arn = arn:aws:iam::123456789012:role/sts-demo-openshift-image-registry\n",
                "web_identity_token_file = /var/run/secrets/openshift/serviceaccount/token\n",
            ));
            return CommandOutput::success(format!(
                r#"{{"apiVersion":"v1","kind":"Secret","data":{{"credentials":"{}"}}}}"#,
                credentials
            ));
        }
        CommandOutput::success("")
    }

    fn record(&self, command: &CommandSpec, interactive: bool) -> CommandOutput {
        let line = command.to_string();
        self.calls.lock().unwrap().push(Call {
            command: line.clone(),
            envs: command
                .get_envs()
                .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
                .collect(),
            interactive,
        });
        self.simulate(&line)
    }
}

#[async_trait]
impl CommandRunner for FakeTools {
    async fn capture(&self, command: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        Ok(self.record(command, false))
    }

    async fn interactive(&self, command: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        let mut output = self.record(command, true);
        output.output.clear();
        Ok(output)
    }
}

/// Answers confirmations from a script, then says no
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<Vec<bool>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn answering(answers: &[bool]) -> Arc<Self> {
        let mut answers = answers.to_vec();
        answers.reverse();
        Arc::new(Self {
            answers: Mutex::new(answers),
            questions: Mutex::new(Vec::new()),
        })
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

/// A prompter that declines everything
pub fn no_answers() -> Arc<ScriptedPrompter> {
    ScriptedPrompter::answering(&[])
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn confirm(&self, question: &str) -> io::Result<bool> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.answers.lock().unwrap().pop().unwrap_or(false))
    }

    async fn ask(&self, question: &str) -> io::Result<Option<String>> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(None)
    }
}

/// Result of one engine run
pub struct RunResult {
    pub summary: RunSummary,
    pub engine: InstallEngine,
    pub events: Vec<ExecutionEvent>,
}

/// Run the engine once over `workspace`
pub async fn run_install(
    workspace: &Workspace,
    config: PipelineConfig,
    tools: Arc<FakeTools>,
    prompter: Arc<ScriptedPrompter>,
) -> RunResult {
    let mut engine = InstallEngine::new(config, workspace.root(), tools, prompter);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine.add_event_handler(move |event| sink.lock().unwrap().push(event));

    let summary = engine.execute().await;
    let events = events.lock().unwrap().clone();
    RunResult {
        summary,
        engine,
        events,
    }
}

/// Assert the steps numbered in `range` ended in states matching `check`
pub fn assert_steps<F>(result: &RunResult, range: std::ops::RangeInclusive<usize>, check: F)
where
    F: Fn(&StepState) -> bool,
{
    for number in range {
        let kind = StepKind::from_number(number).unwrap();
        let state = result.engine.state(kind);
        assert!(check(state), "step {} ({}) in unexpected state {:?}", number, kind, state);
    }
}

pub fn succeeded(state: &StepState) -> bool {
    matches!(state, StepState::Succeeded { .. })
}

pub fn already_completed(state: &StepState) -> bool {
    matches!(
        state,
        StepState::Skipped(sts_installer::SkipReason::AlreadyCompleted)
    )
}

pub fn pending(state: &StepState) -> bool {
    state.is_pending()
}
