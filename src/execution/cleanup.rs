//! Removal of the AWS resources created by a run

use crate::core::config::ConfigError;
use crate::core::credentials::{self, CredentialsError};
use crate::core::layout::ArtifactLayout;
use crate::core::release::VersionArch;
use crate::execution::prompt::Prompter;
use crate::runner::{run_captured, run_interactive, CommandRunner, CommandSpec, RunnerError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to destroy cluster: {0}")]
    Destroy(#[source] RunnerError),

    #[error("failed to delete AWS resources: {0}")]
    Delete(#[source] RunnerError),

    #[error("failed to read answer: {0}")]
    Prompt(#[source] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    pub cluster_name: String,
    pub region: String,
    /// Locates the release's artifacts (extracted ccoctl, cluster metadata)
    pub release_image: Option<String>,
    pub aws_profile: String,
    pub aws_credentials_file: Option<PathBuf>,
    /// Answer yes to every question
    pub assume_yes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    Cancelled,
    Completed { cluster_destroyed: bool },
}

pub struct Cleanup {
    options: CleanupOptions,
    root: PathBuf,
    runner: Arc<dyn CommandRunner>,
    prompter: Arc<dyn Prompter>,
}

impl Cleanup {
    pub fn new(
        options: CleanupOptions,
        root: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            options,
            root: root.into(),
            runner,
            prompter,
        }
    }

    async fn confirm(&self, question: &str) -> Result<bool, CleanupError> {
        if self.options.assume_yes {
            return Ok(true);
        }
        self.prompter
            .confirm(question)
            .await
            .map_err(CleanupError::Prompt)
    }

    fn layout(&self) -> Result<Option<ArtifactLayout>, CleanupError> {
        let Some(image) = &self.options.release_image else {
            return Ok(None);
        };
        let version_arch = VersionArch::from_release_image(image)?;
        Ok(Some(ArtifactLayout::new(&self.root, &version_arch, None)))
    }

    fn aws_env(&self) -> Vec<(String, String)> {
        let path = match &self.options.aws_credentials_file {
            Some(path) => Ok::<_, CredentialsError>(path.clone()),
            None => credentials::default_credentials_path(),
        };
        credentials::injectable_env(path, &self.options.aws_profile)
    }

    pub async fn run(&self) -> Result<CleanupOutcome, CleanupError> {
        let options = &self.options;
        let question = format!(
            "This will delete AWS resources for cluster '{}' in region '{}'. Continue?",
            options.cluster_name, options.region
        );
        if !self.confirm(&question).await? {
            info!("Cleanup cancelled");
            return Ok(CleanupOutcome::Cancelled);
        }

        let layout = self.layout()?;
        let env = self.aws_env();

        let cluster_destroyed = match &layout {
            Some(layout) => self.destroy_cluster(layout, &env).await?,
            None => false,
        };

        let ccoctl = layout
            .as_ref()
            .map(|layout| layout.ccoctl_binary())
            .filter(|path| path.is_file())
            .map(|path| CommandSpec::from_path(&path))
            .unwrap_or_else(|| CommandSpec::new("ccoctl"));
        let command = ccoctl
            .args(["aws", "delete", "--name", options.cluster_name.as_str()])
            .args(["--region", options.region.as_str()])
            .envs(env);

        info!("Deleting AWS resources for {}", options.cluster_name);
        run_captured(self.runner.as_ref(), &command)
            .await
            .map_err(CleanupError::Delete)?;
        info!("AWS resources have been deleted");

        Ok(CleanupOutcome::Completed { cluster_destroyed })
    }

    /// Offer `openshift-install destroy cluster` when a deployment left
    /// metadata behind
    async fn destroy_cluster(
        &self,
        layout: &ArtifactLayout,
        env: &[(String, String)],
    ) -> Result<bool, CleanupError> {
        if !layout.cluster_metadata().is_file() {
            return Ok(false);
        }
        let installer = layout.installer_binary();
        if !installer.is_file() {
            warn!(
                "Cluster metadata found but {} is missing; skipping cluster destroy",
                installer.display()
            );
            return Ok(false);
        }
        if !self
            .confirm("Cluster metadata found. Destroy the cluster with openshift-install first?")
            .await?
        {
            return Ok(false);
        }

        let command = CommandSpec::from_path(&installer)
            .args(["destroy", "cluster", "--dir"])
            .path_arg(layout.version_dir())
            .arg("--log-level=info")
            .envs(env.iter().cloned());
        run_interactive(self.runner.as_ref(), &command)
            .await
            .map_err(CleanupError::Destroy)?;

        info!("Cluster destroyed");
        Ok(true)
    }
}
