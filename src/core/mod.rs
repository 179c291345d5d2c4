//! Core domain models for the installer
//!
//! Configuration, the step identities and their per-run state, the on-disk
//! artifact layout, and the run summary.

pub mod config;
pub mod credentials;
pub mod files;
pub mod install_config;
pub mod layout;
pub mod release;
pub mod state;
pub mod step;
pub mod summary;

pub use config::{ConfigError, ConfigLayer, FailurePolicy, PipelineConfig};
pub use layout::ArtifactLayout;
pub use release::VersionArch;
pub use state::{SkipReason, StepState};
pub use step::StepKind;
pub use summary::{OverallStatus, RunSummary, StepOutcome, StepRecord};
