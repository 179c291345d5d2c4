//! Step identities

use serde::Serialize;
use std::fmt;

/// The eleven installation steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StepKind {
    ExtractCredentialsRequests,
    ExtractInstaller,
    ExtractCcoctl,
    CreateInstallConfig,
    SetManualCredentials,
    CreateManifests,
    CreateAwsResources,
    CopyManifests,
    CopyTlsFiles,
    DeployCluster,
    VerifyInstallation,
}

impl StepKind {
    pub const ALL: [StepKind; 11] = [
        StepKind::ExtractCredentialsRequests,
        StepKind::ExtractInstaller,
        StepKind::ExtractCcoctl,
        StepKind::CreateInstallConfig,
        StepKind::SetManualCredentials,
        StepKind::CreateManifests,
        StepKind::CreateAwsResources,
        StepKind::CopyManifests,
        StepKind::CopyTlsFiles,
        StepKind::DeployCluster,
        StepKind::VerifyInstallation,
    ];

    /// 1-based position in the sequence
    pub fn number(self) -> usize {
        match self {
            StepKind::ExtractCredentialsRequests => 1,
            StepKind::ExtractInstaller => 2,
            StepKind::ExtractCcoctl => 3,
            StepKind::CreateInstallConfig => 4,
            StepKind::SetManualCredentials => 5,
            StepKind::CreateManifests => 6,
            StepKind::CreateAwsResources => 7,
            StepKind::CopyManifests => 8,
            StepKind::CopyTlsFiles => 9,
            StepKind::DeployCluster => 10,
            StepKind::VerifyInstallation => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StepKind::ExtractCredentialsRequests => "Extract credentials requests",
            StepKind::ExtractInstaller => "Extract openshift-install binary",
            StepKind::ExtractCcoctl => "Extract ccoctl binary",
            StepKind::CreateInstallConfig => "Create install-config.yaml",
            StepKind::SetManualCredentials => "Set credentialsMode to Manual",
            StepKind::CreateManifests => "Create manifests",
            StepKind::CreateAwsResources => "Create AWS resources",
            StepKind::CopyManifests => "Copy manifests",
            StepKind::CopyTlsFiles => "Copy TLS files",
            StepKind::DeployCluster => "Deploy cluster",
            StepKind::VerifyInstallation => "Verify installation",
        }
    }

    pub fn from_number(number: usize) -> Option<StepKind> {
        number
            .checked_sub(1)
            .and_then(|index| StepKind::ALL.get(index))
            .copied()
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
