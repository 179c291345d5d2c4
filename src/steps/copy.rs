//! Copy ccoctl output into the installer's directory

use super::{InstallStep, StepContext, StepError};
use crate::core::files;
use crate::core::step::StepKind;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Recursively copy one ccoctl output directory into the release directory
pub struct CopyOutputDir {
    kind: StepKind,
    source: PathBuf,
    destination: PathBuf,
}

impl CopyOutputDir {
    /// `<output>/manifests` → `artifacts/<version-arch>/manifests`
    pub fn manifests(ctx: StepContext) -> Self {
        Self {
            kind: StepKind::CopyManifests,
            source: ctx.layout.output_manifests_dir(),
            destination: ctx.layout.install_manifests_dir(),
        }
    }

    /// `<output>/tls` → `artifacts/<version-arch>/tls`
    pub fn tls(ctx: StepContext) -> Self {
        Self {
            kind: StepKind::CopyTlsFiles,
            source: ctx.layout.output_tls_dir(),
            destination: ctx.layout.install_tls_dir(),
        }
    }
}

#[async_trait]
impl InstallStep for CopyOutputDir {
    fn kind(&self) -> StepKind {
        self.kind
    }

    async fn execute(&self) -> Result<(), StepError> {
        let copied = files::copy_dir_recursive(&self.source, &self.destination).map_err(
            StepError::io(format!(
                "failed to copy {} to {}",
                self.source.display(),
                self.destination.display()
            )),
        )?;

        info!(
            "Copied {} files into {}",
            copied,
            self.destination.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::runner::mock::MockRunner;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copy_manifests_merges_into_existing_dir() {
        let dir = TempDir::new().unwrap();
        let version_dir = dir.path().join("artifacts/4.12.0-x86_64");
        let output = version_dir.join("_output/manifests");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("cluster-authentication-02-config.yaml"), "auth").unwrap();
        fs::create_dir_all(version_dir.join("manifests")).unwrap();
        fs::write(version_dir.join("manifests/cluster-config.yaml"), "existing").unwrap();

        let step = CopyOutputDir::manifests(context(dir.path(), Arc::new(MockRunner::new())));
        step.execute().await.unwrap();

        assert!(version_dir
            .join("manifests/cluster-authentication-02-config.yaml")
            .is_file());
        assert!(version_dir.join("manifests/cluster-config.yaml").is_file());
    }

    #[tokio::test]
    async fn test_copy_tls_nested() {
        let dir = TempDir::new().unwrap();
        let version_dir = dir.path().join("artifacts/4.12.0-x86_64");
        let output = version_dir.join("_output/tls");
        fs::create_dir_all(output.join("keys")).unwrap();
        fs::write(output.join("bound-service-account-signing-key.key"), "key").unwrap();
        fs::write(output.join("keys/extra.pem"), "pem").unwrap();

        let step = CopyOutputDir::tls(context(dir.path(), Arc::new(MockRunner::new())));
        assert_eq!(step.kind(), StepKind::CopyTlsFiles);
        step.execute().await.unwrap();

        assert_eq!(
            fs::read_to_string(version_dir.join("tls/keys/extra.pem")).unwrap(),
            "pem"
        );
    }

    #[tokio::test]
    async fn test_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let step = CopyOutputDir::manifests(context(dir.path(), Arc::new(MockRunner::new())));

        let err = step.execute().await.unwrap_err();
        assert!(err.to_string().contains("failed to copy"));
    }
}
