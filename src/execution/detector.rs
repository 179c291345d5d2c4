//! Decides from on-disk evidence whether a step's work already happened

use crate::core::files;
use crate::core::install_config::MANUAL_CREDENTIALS_MARKER;
use crate::core::layout::ArtifactLayout;
use crate::core::state::SkipReason;
use crate::core::step::StepKind;
use std::path::PathBuf;

/// Line the installer writes to its log once the cluster is up
pub const INSTALL_COMPLETE_MARKER: &str = "Install complete!";

/// Completion checks for the eleven steps.
///
/// Checks only stat and read files; they never run commands.
#[derive(Debug, Clone)]
pub struct CompletionDetector {
    layout: ArtifactLayout,
    start_from_step: Option<usize>,
}

impl CompletionDetector {
    pub fn new(layout: ArtifactLayout, start_from_step: Option<usize>) -> Self {
        Self {
            layout,
            start_from_step,
        }
    }

    pub fn should_skip(&self, step_number: usize) -> bool {
        self.skip_reason(step_number).is_some()
    }

    /// Why `step_number` should be skipped, if it should.
    ///
    /// A start-from override covers every lower step regardless of what is on
    /// disk; unknown step numbers are never skipped.
    pub fn skip_reason(&self, step_number: usize) -> Option<SkipReason> {
        if let Some(start) = self.start_from_step {
            if step_number < start {
                return Some(SkipReason::StartFromStep(start));
            }
        }

        let kind = StepKind::from_number(step_number)?;
        self.has_evidence(kind).then_some(SkipReason::AlreadyCompleted)
    }

    pub fn has_evidence(&self, kind: StepKind) -> bool {
        let layout = &self.layout;
        match kind {
            StepKind::ExtractCredentialsRequests => files::dir_has_entries(&layout.credreqs_dir()),
            StepKind::ExtractInstaller => files::file_exists(&layout.installer_binary()),
            StepKind::ExtractCcoctl => files::file_exists(&layout.ccoctl_binary()),
            StepKind::CreateInstallConfig => {
                files::file_exists(&layout.install_config())
                    || files::file_exists(&layout.install_config_backup())
            }
            StepKind::SetManualCredentials => {
                files::file_contains(&self.current_install_config(), MANUAL_CREDENTIALS_MARKER)
            }
            StepKind::CreateManifests => files::dir_has_entries(&layout.install_manifests_dir()),
            StepKind::CreateAwsResources => {
                files::dir_has_entries(&layout.output_manifests_dir())
                    && files::dir_has_entries(&layout.output_tls_dir())
            }
            StepKind::CopyManifests => files::entries_present_in(
                &layout.output_manifests_dir(),
                &layout.install_manifests_dir(),
            ),
            StepKind::CopyTlsFiles => {
                files::entries_present_in(&layout.output_tls_dir(), &layout.install_tls_dir())
            }
            StepKind::DeployCluster => {
                files::file_contains(&layout.install_log(), INSTALL_COMPLETE_MARKER)
            }
            StepKind::VerifyInstallation => false,
        }
    }

    /// The live install-config, or the backup once the installer has consumed it.
    /// A stale backup never speaks for a live file.
    fn current_install_config(&self) -> PathBuf {
        let live = self.layout.install_config();
        if files::file_exists(&live) {
            live
        } else {
            self.layout.install_config_backup()
        }
    }
}
