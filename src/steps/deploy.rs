//! Cluster deployment

use super::{InstallStep, StepContext, StepError};
use crate::core::step::StepKind;
use crate::runner::{run_interactive, CommandSpec};
use async_trait::async_trait;
use tracing::info;

/// `openshift-install create cluster`, streamed to the terminal
pub struct DeployCluster {
    ctx: StepContext,
}

impl DeployCluster {
    pub fn new(ctx: StepContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl InstallStep for DeployCluster {
    fn kind(&self) -> StepKind {
        StepKind::DeployCluster
    }

    async fn execute(&self) -> Result<(), StepError> {
        let layout = &self.ctx.layout;
        info!("Deploying cluster, this usually takes 30 to 45 minutes");

        let command = CommandSpec::from_path(&layout.installer_binary())
            .args(["create", "cluster", "--dir"])
            .path_arg(layout.version_dir())
            .arg("--log-level=info")
            .envs(self.ctx.aws_env());
        run_interactive(self.ctx.runner.as_ref(), &command).await?;

        info!("Cluster deployed; kubeconfig at {}", layout.kubeconfig().display());
        Ok(())
    }
}
