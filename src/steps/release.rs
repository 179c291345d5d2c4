//! Steps that pull artifacts out of the release image

use super::{InstallStep, StepContext, StepError};
use crate::core::files;
use crate::core::step::StepKind;
use crate::runner::{run_captured, CommandSpec};
use async_trait::async_trait;
use tracing::{debug, info};

/// Extract the AWS CredentialsRequest manifests
pub struct ExtractCredentialsRequests {
    ctx: StepContext,
}

impl ExtractCredentialsRequests {
    pub fn new(ctx: StepContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl InstallStep for ExtractCredentialsRequests {
    fn kind(&self) -> StepKind {
        StepKind::ExtractCredentialsRequests
    }

    async fn execute(&self) -> Result<(), StepError> {
        let credreqs = self.ctx.layout.credreqs_dir();
        files::ensure_dir(&credreqs).map_err(StepError::io("failed to create credreqs directory"))?;

        let command = CommandSpec::new("oc")
            .args(["adm", "release", "extract", "--credentials-requests", "--cloud=aws"])
            .arg(format!("--to={}", credreqs.display()))
            .arg(self.ctx.registry_config_arg())
            .arg(&self.ctx.config.release_image);
        run_captured(self.ctx.runner.as_ref(), &command).await?;

        info!("Credentials requests extracted to {}", credreqs.display());
        Ok(())
    }
}

/// Extract the `openshift-install` binary
pub struct ExtractInstaller {
    ctx: StepContext,
}

impl ExtractInstaller {
    pub fn new(ctx: StepContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl InstallStep for ExtractInstaller {
    fn kind(&self) -> StepKind {
        StepKind::ExtractInstaller
    }

    async fn execute(&self) -> Result<(), StepError> {
        let bin_dir = self.ctx.layout.bin_dir();
        files::ensure_dir(&bin_dir).map_err(StepError::io("failed to create bin directory"))?;

        let command = CommandSpec::new("oc")
            .args(["adm", "release", "extract", "--command=openshift-install"])
            .arg(format!("--to={}", bin_dir.display()))
            .arg(self.ctx.registry_config_arg())
            .arg(&self.ctx.config.release_image);
        run_captured(self.ctx.runner.as_ref(), &command).await?;

        let binary = self.ctx.layout.installer_binary();
        files::make_executable(&binary).map_err(StepError::io(format!(
            "openshift-install not usable at {}",
            binary.display()
        )))?;

        info!("openshift-install extracted to {}", binary.display());
        Ok(())
    }
}

/// Extract `ccoctl` from the cloud-credential-operator image
pub struct ExtractCcoctl {
    ctx: StepContext,
}

impl ExtractCcoctl {
    pub fn new(ctx: StepContext) -> Self {
        Self { ctx }
    }

    async fn operator_image(&self) -> Result<String, StepError> {
        let command = CommandSpec::new("oc")
            .args(["adm", "release", "info", "--image-for=cloud-credential-operator"])
            .arg(self.ctx.registry_config_arg())
            .arg(&self.ctx.config.release_image);
        let output = run_captured(self.ctx.runner.as_ref(), &command).await?;

        let image = output.trim();
        if image.is_empty() {
            return Err(StepError::Precondition(
                "release image did not report a cloud-credential-operator image".to_string(),
            ));
        }
        Ok(image.to_string())
    }
}

#[async_trait]
impl InstallStep for ExtractCcoctl {
    fn kind(&self) -> StepKind {
        StepKind::ExtractCcoctl
    }

    async fn execute(&self) -> Result<(), StepError> {
        let bin_dir = self.ctx.layout.bin_dir();
        files::ensure_dir(&bin_dir).map_err(StepError::io("failed to create bin directory"))?;

        let image = self.operator_image().await?;
        debug!("cloud-credential-operator image: {}", image);

        let command = CommandSpec::new("oc")
            .args(["image", "extract"])
            .arg(&image)
            .arg(format!("--path=/usr/bin/ccoctl:{}", bin_dir.display()))
            .arg(self.ctx.registry_config_arg())
            .arg("--confirm");
        run_captured(self.ctx.runner.as_ref(), &command).await?;

        let binary = self.ctx.layout.ccoctl_binary();
        files::make_executable(&binary).map_err(StepError::io(format!(
            "ccoctl not usable at {}",
            binary.display()
        )))?;

        info!("ccoctl extracted to {}", binary.display());
        Ok(())
    }
}
