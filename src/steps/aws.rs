//! Cloud identity resources created with ccoctl

use super::{InstallStep, StepContext, StepError};
use crate::core::step::StepKind;
use crate::runner::{run_captured, CommandSpec};
use async_trait::async_trait;
use tracing::info;

/// `ccoctl aws create-all`: OIDC provider, IAM roles and the matching
/// secret manifests
pub struct CreateAwsResources {
    ctx: StepContext,
}

impl CreateAwsResources {
    pub fn new(ctx: StepContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl InstallStep for CreateAwsResources {
    fn kind(&self) -> StepKind {
        StepKind::CreateAwsResources
    }

    async fn execute(&self) -> Result<(), StepError> {
        let (name, region) = self.ctx.config.cluster_identity().ok_or_else(|| {
            StepError::Precondition(
                "cluster name and AWS region must be set before creating AWS resources".to_string(),
            )
        })?;

        let layout = &self.ctx.layout;
        let mut command = CommandSpec::from_path(&layout.ccoctl_binary())
            .args(["aws", "create-all", "--name", name, "--region", region])
            .arg("--credentials-requests-dir")
            .path_arg(&layout.credreqs_dir())
            .arg("--output-dir")
            .path_arg(layout.output_dir());
        if self.ctx.config.private_bucket {
            command = command.arg("--create-private-s3-bucket");
        }
        let command = command.envs(self.ctx.aws_env());

        run_captured(self.ctx.runner.as_ref(), &command).await?;

        info!(
            "AWS resources for {} created in {}",
            name,
            layout.output_dir().display()
        );
        Ok(())
    }
}
