//! Main execution engine - drives the installation steps in order

use crate::core::config::{FailurePolicy, PipelineConfig};
use crate::core::install_config::ClusterInstallConfig;
use crate::core::layout::ArtifactLayout;
use crate::core::state::{SkipReason, StepState};
use crate::core::step::StepKind;
use crate::core::summary::{OverallStatus, RunSummary};
use crate::execution::detector::CompletionDetector;
use crate::execution::prompt::Prompter;
use crate::runner::CommandRunner;
use crate::steps::{build_step, StepContext};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Events that can occur during an installation run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        release_image: String,
        total_steps: usize,
    },
    StepSkipped {
        step: StepKind,
        reason: SkipReason,
    },
    StepStarted {
        step: StepKind,
    },
    StepCompleted {
        step: StepKind,
        duration: Duration,
    },
    StepFailed {
        step: StepKind,
        error: String,
    },
    ClusterIdentityResolved {
        cluster_name: Option<String>,
        region: Option<String>,
    },
    RunAborted {
        step: StepKind,
    },
    RunCompleted {
        status: OverallStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Runs the eleven steps once, in order, skipping completed work
pub struct InstallEngine {
    config: PipelineConfig,
    root: PathBuf,
    runner: Arc<dyn CommandRunner>,
    prompter: Arc<dyn Prompter>,
    event_handlers: Vec<EventHandler>,
    states: BTreeMap<StepKind, StepState>,
}

impl InstallEngine {
    /// `root` is the workspace directory that holds `artifacts/`
    pub fn new(
        config: PipelineConfig,
        root: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            config,
            root: root.into(),
            runner,
            prompter,
            event_handlers: Vec::new(),
            states: StepKind::ALL
                .iter()
                .map(|kind| (*kind, StepState::Pending))
                .collect(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Configuration as it stands, including any back-filled fields
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self, kind: StepKind) -> &StepState {
        self.states.get(&kind).unwrap_or(&StepState::Pending)
    }

    pub fn states(&self) -> impl Iterator<Item = (StepKind, &StepState)> {
        self.states.iter().map(|(kind, state)| (*kind, state))
    }

    fn set_state(&mut self, kind: StepKind, state: StepState) {
        self.states.insert(kind, state);
    }

    /// Execute the installation
    pub async fn execute(&mut self) -> RunSummary {
        let mut summary = RunSummary::new();

        info!("Starting installation for {}", self.config.release_image);
        self.emit_event(ExecutionEvent::RunStarted {
            release_image: self.config.release_image.clone(),
            total_steps: StepKind::ALL.len(),
        });

        for kind in StepKind::ALL {
            let ctx = match StepContext::new(&self.config, &self.root, self.runner.clone()) {
                Ok(ctx) => ctx,
                Err(e) => {
                    error!("Could not prepare step {}: {}", kind.number(), e);
                    summary.add_failure(
                        format!("Step {}", kind.number()),
                        e.to_string(),
                        Duration::ZERO,
                    );
                    self.set_state(
                        kind,
                        StepState::Failed {
                            error: e.to_string(),
                            failed_at: Utc::now(),
                        },
                    );
                    self.emit_event(ExecutionEvent::StepFailed {
                        step: kind,
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            let layout = ctx.layout.clone();
            let step = build_step(kind, ctx);

            let detector = CompletionDetector::new(layout.clone(), self.config.start_from_step);
            if let Some(reason) = detector.skip_reason(kind.number()) {
                self.skip(kind, reason, &layout);
                continue;
            }

            let question = format!("Proceed with {}?", step.name());
            if self.config.confirm_each_step && !self.confirm(&question).await {
                self.skip(kind, SkipReason::UserChoice, &layout);
                continue;
            }

            info!("Step {}: {}", kind.number(), step.name());
            self.set_state(
                kind,
                StepState::Running {
                    started_at: Utc::now(),
                },
            );
            self.emit_event(ExecutionEvent::StepStarted { step: kind });

            let started = Instant::now();
            let result = step.execute().await;
            let duration = started.elapsed();

            match result {
                Ok(()) => {
                    let started_at = match self.state(kind) {
                        StepState::Running { started_at } => *started_at,
                        _ => Utc::now(),
                    };
                    self.set_state(
                        kind,
                        StepState::Succeeded {
                            started_at,
                            completed_at: Utc::now(),
                        },
                    );
                    summary.add_success(step.name(), duration);
                    self.emit_event(ExecutionEvent::StepCompleted {
                        step: kind,
                        duration,
                    });
                    self.after_step(kind, &layout);
                }
                Err(e) => {
                    let detail = e.to_string();
                    error!("Step {} ({}) failed: {}", kind.number(), step.name(), detail);
                    self.set_state(
                        kind,
                        StepState::Failed {
                            error: detail.clone(),
                            failed_at: Utc::now(),
                        },
                    );
                    summary.add_failure(step.name(), detail.clone(), duration);
                    self.emit_event(ExecutionEvent::StepFailed {
                        step: kind,
                        error: detail,
                    });

                    if !self.continue_after_failure().await {
                        let not_attempted =
                            self.states.values().filter(|state| state.is_pending()).count();
                        warn!(
                            "Stopping after failed step {}; {} steps not attempted",
                            kind.number(),
                            not_attempted
                        );
                        self.emit_event(ExecutionEvent::RunAborted { step: kind });
                        break;
                    }
                }
            }
        }

        let status = summary.status();
        info!("Installation run finished: {}", status);
        self.emit_event(ExecutionEvent::RunCompleted { status });
        summary
    }

    fn skip(&mut self, kind: StepKind, reason: SkipReason, layout: &ArtifactLayout) {
        info!("Skipping step {} ({}): {}", kind.number(), kind.name(), reason);
        self.set_state(kind, StepState::Skipped(reason));
        self.emit_event(ExecutionEvent::StepSkipped { step: kind, reason });
        self.after_step(kind, layout);
    }

    /// Hook run once a step has either executed successfully or been skipped
    fn after_step(&mut self, kind: StepKind, layout: &ArtifactLayout) {
        if kind == StepKind::CreateInstallConfig {
            self.backfill_cluster_identity(layout);
        }
    }

    /// Take cluster name and region from install-config.yaml (or its backup)
    /// when the configuration leaves them unset
    fn backfill_cluster_identity(&mut self, layout: &ArtifactLayout) {
        if self.config.cluster_identity().is_some() {
            return;
        }

        let candidates = [layout.install_config(), layout.install_config_backup()];
        let parsed = match ClusterInstallConfig::load_first(&candidates) {
            Some(Ok(parsed)) => parsed,
            Some(Err(e)) => {
                warn!("Could not read cluster name and region from install-config: {}", e);
                return;
            }
            None => {
                debug!("No install-config.yaml to read cluster name and region from");
                return;
            }
        };

        if self
            .config
            .backfill_cluster_identity(parsed.cluster_name(), parsed.region())
        {
            info!(
                "Using cluster name {:?} and region {:?} from install-config.yaml",
                self.config.cluster_name, self.config.aws_region
            );
            self.emit_event(ExecutionEvent::ClusterIdentityResolved {
                cluster_name: self.config.cluster_name.clone(),
                region: self.config.aws_region.clone(),
            });
        }
    }

    async fn confirm(&self, question: &str) -> bool {
        match self.prompter.confirm(question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Could not read answer: {}", e);
                false
            }
        }
    }

    async fn continue_after_failure(&self) -> bool {
        match self.config.on_failure {
            FailurePolicy::Abort => false,
            FailurePolicy::Prompt => self.confirm("Continue with the next step anyway?").await,
        }
    }

    /// Workspace root the engine resolves artifacts against
    pub fn root(&self) -> &Path {
        &self.root
    }
}
