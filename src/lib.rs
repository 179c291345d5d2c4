//! sts-installer - resumable OpenShift on AWS installs in manual (STS) credentials mode

pub mod cli;
pub mod core;
pub mod execution;
pub mod runner;
pub mod steps;

// Re-export commonly used types
pub use core::{
    ArtifactLayout, ConfigError, ConfigLayer, FailurePolicy, OverallStatus, PipelineConfig,
    RunSummary, SkipReason, StepKind, StepState, VersionArch,
};
pub use execution::{CompletionDetector, ExecutionEvent, InstallEngine, Prompter};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, RunnerError};
pub use steps::{build_step, InstallStep, StepContext, StepError};
