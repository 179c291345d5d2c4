//! Steps that produce and prepare the cluster's install-config.yaml

use super::{InstallStep, StepContext, StepError};
use crate::core::files;
use crate::core::install_config::{self, MANUAL_CREDENTIALS_MARKER};
use crate::core::step::StepKind;
use crate::runner::{run_captured, run_interactive, CommandSpec};
use async_trait::async_trait;
use std::fs;
use tracing::info;

/// Run the installer's interactive install-config wizard
pub struct CreateInstallConfig {
    ctx: StepContext,
}

impl CreateInstallConfig {
    pub fn new(ctx: StepContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl InstallStep for CreateInstallConfig {
    fn kind(&self) -> StepKind {
        StepKind::CreateInstallConfig
    }

    async fn execute(&self) -> Result<(), StepError> {
        let version_dir = self.ctx.layout.version_dir();
        files::ensure_dir(version_dir)
            .map_err(StepError::io("failed to create release directory"))?;

        let command = CommandSpec::from_path(&self.ctx.layout.installer_binary())
            .args(["create", "install-config", "--dir"])
            .path_arg(version_dir);
        run_interactive(self.ctx.runner.as_ref(), &command).await?;
        Ok(())
    }
}

/// Patch install-config.yaml for manual (STS) credentials and the
/// configured instance type
pub struct SetManualCredentials {
    ctx: StepContext,
}

impl SetManualCredentials {
    pub fn new(ctx: StepContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl InstallStep for SetManualCredentials {
    fn kind(&self) -> StepKind {
        StepKind::SetManualCredentials
    }

    async fn execute(&self) -> Result<(), StepError> {
        let path = self.ctx.layout.install_config();
        let original = fs::read_to_string(&path).map_err(StepError::io(format!(
            "failed to read {}",
            path.display()
        )))?;

        let sized = install_config::apply_instance_type(&original, &self.ctx.config.instance_type)?;
        if sized.is_some() {
            info!(
                "Instance type {} applied to machine pools",
                self.ctx.config.instance_type
            );
        }
        let patched =
            install_config::set_manual_credentials_mode(sized.as_deref().unwrap_or(&original));

        if patched != original {
            fs::write(&path, &patched).map_err(StepError::io(format!(
                "failed to write {}",
                path.display()
            )))?;
        }

        info!("{} set in {}", MANUAL_CREDENTIALS_MARKER, path.display());
        Ok(())
    }
}

/// Render the installer manifests from install-config.yaml
pub struct CreateManifests {
    ctx: StepContext,
}

impl CreateManifests {
    pub fn new(ctx: StepContext) -> Self {
        Self { ctx }
    }

    /// The installer deletes install-config.yaml once it has consumed it,
    /// so keep a copy next to it (and restore from that copy on a rerun).
    fn preserve_install_config(&self) -> Result<(), StepError> {
        let config = self.ctx.layout.install_config();
        let backup = self.ctx.layout.install_config_backup();

        if !config.is_file() && backup.is_file() {
            info!("Restoring {} from backup", config.display());
            fs::copy(&backup, &config)
                .map_err(StepError::io("failed to restore install-config.yaml"))?;
        }

        fs::copy(&config, &backup).map_err(StepError::io(format!(
            "failed to back up {}",
            config.display()
        )))?;
        Ok(())
    }
}

#[async_trait]
impl InstallStep for CreateManifests {
    fn kind(&self) -> StepKind {
        StepKind::CreateManifests
    }

    async fn execute(&self) -> Result<(), StepError> {
        self.preserve_install_config()?;

        let command = CommandSpec::from_path(&self.ctx.layout.installer_binary())
            .args(["create", "manifests", "--dir"])
            .path_arg(self.ctx.layout.version_dir());
        run_captured(self.ctx.runner.as_ref(), &command).await?;

        info!(
            "Manifests created in {}",
            self.ctx.layout.install_manifests_dir().display()
        );
        Ok(())
    }
}
