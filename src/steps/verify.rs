//! Post-install checks that the cluster runs on short-lived credentials

use super::{InstallStep, StepContext, StepError};
use crate::core::step::StepKind;
use crate::runner::{CommandSpec, RunnerError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};

const ROOT_CREDENTIALS_SECRET: &str = "aws-creds";
const REGISTRY_CREDENTIALS_SECRET: &str = "installer-cloud-credentials";
const STS_MARKERS: [&str; 2] = ["role_arn", "web_identity_token_file"];

/// Verify that no root AWS credentials were installed and that components
/// authenticate through IAM roles
pub struct VerifyInstallation {
    ctx: StepContext,
}

impl VerifyInstallation {
    pub fn new(ctx: StepContext) -> Self {
        Self { ctx }
    }

    fn oc(&self) -> CommandSpec {
        let kubeconfig = self.ctx.layout.kubeconfig();
        let command = CommandSpec::new("oc");
        if kubeconfig.is_file() {
            command.env("KUBECONFIG", kubeconfig.display().to_string())
        } else {
            command
        }
    }

    /// The root credentials secret must not exist in manual mode
    async fn check_root_credentials(&self) {
        let command = self
            .oc()
            .args(["get", "secret", ROOT_CREDENTIALS_SECRET, "-n", "kube-system"]);

        match self.ctx.runner.capture(&command).await {
            Ok(output) if output.is_success() => {
                warn!("Root credentials secret {} exists in kube-system", ROOT_CREDENTIALS_SECRET);
            }
            Ok(_) => info!("✓ Root credentials secret does not exist"),
            Err(e) => warn!("Could not check for root credentials secret: {}", e),
        }
    }

    /// Image registry credentials must reference an IAM role
    async fn check_role_credentials(&self) -> Result<(), StepError> {
        let command = self.oc().args([
            "get",
            "secret",
            REGISTRY_CREDENTIALS_SECRET,
            "-n",
            "openshift-image-registry",
            "-o",
            "json",
        ]);

        let output = self.ctx.runner.capture(&command).await?;
        if !output.is_success() {
            if output.output.contains("NotFound") {
                warn!(
                    "Secret {} not found in openshift-image-registry",
                    REGISTRY_CREDENTIALS_SECRET
                );
                return Ok(());
            }
            return Err(StepError::Command(RunnerError::Failed {
                command: command.to_string(),
                code: output.code,
                output: output.output.trim().to_string(),
            }));
        }

        let credentials = decode_credentials(&output.output);
        let haystack = credentials.as_deref().unwrap_or(&output.output);
        if STS_MARKERS.iter().any(|marker| haystack.contains(marker)) {
            info!("✓ Components are using IAM roles");
        } else {
            warn!(
                "Components may not be using IAM roles: no role_arn in {}",
                REGISTRY_CREDENTIALS_SECRET
            );
        }
        Ok(())
    }
}

/// `data.credentials` of a secret rendered as JSON, base64-decoded
fn decode_credentials(secret_json: &str) -> Option<String> {
    let secret: serde_json::Value = serde_json::from_str(secret_json).ok()?;
    let encoded = secret.get("data")?.get("credentials")?.as_str()?;
    match STANDARD.decode(encoded) {
        Ok(bytes) => String::from_utf8(bytes).ok(),
        Err(e) => {
            debug!("credentials field is not valid base64: {}", e);
            None
        }
    }
}

#[async_trait]
impl InstallStep for VerifyInstallation {
    fn kind(&self) -> StepKind {
        StepKind::VerifyInstallation
    }

    async fn execute(&self) -> Result<(), StepError> {
        self.check_root_credentials().await;
        self.check_role_credentials().await
    }
}
