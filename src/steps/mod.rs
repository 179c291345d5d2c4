//! The installation steps
//!
//! Each step is a small struct implementing [`InstallStep`]. Steps share a
//! [`StepContext`] carrying the resolved configuration, the artifact layout
//! and the command runner; [`build_step`] is the only place that maps a
//! [`StepKind`] to its implementation.

mod aws;
mod copy;
mod deploy;
mod install_config;
mod release;
mod verify;

use crate::core::config::{ConfigError, PipelineConfig};
use crate::core::credentials;
use crate::core::install_config::InstallConfigError;
use crate::core::layout::ArtifactLayout;
use crate::core::step::StepKind;
use crate::runner::{CommandRunner, RunnerError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub use aws::CreateAwsResources;
pub use copy::CopyOutputDir;
pub use deploy::DeployCluster;
pub use install_config::{CreateInstallConfig, CreateManifests, SetManualCredentials};
pub use release::{ExtractCcoctl, ExtractCredentialsRequests, ExtractInstaller};
pub use verify::VerifyInstallation;

/// Errors that fail a step
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Command(#[from] RunnerError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    InstallConfig(#[from] InstallConfigError),

    #[error("{0}")]
    Precondition(String),
}

impl StepError {
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> StepError {
        let context = context.into();
        move |source| StepError::Io { context, source }
    }
}

/// Everything a step needs, injected at construction time
#[derive(Clone)]
pub struct StepContext {
    pub config: PipelineConfig,
    pub layout: ArtifactLayout,
    pub runner: Arc<dyn CommandRunner>,
}

impl StepContext {
    pub fn new(
        config: &PipelineConfig,
        root: &Path,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, ConfigError> {
        let version_arch = config.version_arch()?;
        let layout = ArtifactLayout::new(root, &version_arch, config.output_dir.as_deref());
        Ok(Self {
            config: config.clone(),
            layout,
            runner,
        })
    }

    /// `--registry-config=<pull secret>` for `oc`
    pub fn registry_config_arg(&self) -> String {
        format!("--registry-config={}", self.config.pull_secret_path.display())
    }

    /// Profile credentials as environment variables; empty when unreadable
    pub fn aws_env(&self) -> Vec<(String, String)> {
        credentials::injectable_env(self.config.credentials_path(), &self.config.aws_profile)
    }
}

/// A single installation step
#[async_trait]
pub trait InstallStep: Send + Sync {
    fn kind(&self) -> StepKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    async fn execute(&self) -> Result<(), StepError>;
}

/// Construct the implementation for `kind`
pub fn build_step(kind: StepKind, ctx: StepContext) -> Box<dyn InstallStep> {
    match kind {
        StepKind::ExtractCredentialsRequests => Box::new(ExtractCredentialsRequests::new(ctx)),
        StepKind::ExtractInstaller => Box::new(ExtractInstaller::new(ctx)),
        StepKind::ExtractCcoctl => Box::new(ExtractCcoctl::new(ctx)),
        StepKind::CreateInstallConfig => Box::new(CreateInstallConfig::new(ctx)),
        StepKind::SetManualCredentials => Box::new(SetManualCredentials::new(ctx)),
        StepKind::CreateManifests => Box::new(CreateManifests::new(ctx)),
        StepKind::CreateAwsResources => Box::new(CreateAwsResources::new(ctx)),
        StepKind::CopyManifests => Box::new(CopyOutputDir::manifests(ctx)),
        StepKind::CopyTlsFiles => Box::new(CopyOutputDir::tls(ctx)),
        StepKind::DeployCluster => Box::new(DeployCluster::new(ctx)),
        StepKind::VerifyInstallation => Box::new(VerifyInstallation::new(ctx)),
    }
}
