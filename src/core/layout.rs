//! On-disk artifact layout for one release

use crate::core::release::VersionArch;
use std::path::{Path, PathBuf};

/// Paths of every artifact a run produces or inspects.
///
/// All paths hang off an explicit workspace root:
///
/// ```text
/// <root>/artifacts/<version-arch>/
///     credreqs/  bin/{openshift-install,ccoctl}
///     install-config.yaml  install-config.yaml.backup
///     manifests/  tls/  auth/kubeconfig  metadata.json
///     .openshift_install.log
///     _output/{manifests,tls}/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    version_dir: PathBuf,
    output_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: &Path, version_arch: &VersionArch, output_dir: Option<&Path>) -> Self {
        let version_dir = root.join("artifacts").join(version_arch.as_str());
        let output_dir = match output_dir {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => root.join(dir),
            None => version_dir.join("_output"),
        };
        Self {
            version_dir,
            output_dir,
        }
    }

    pub fn version_dir(&self) -> &Path {
        &self.version_dir
    }

    pub fn credreqs_dir(&self) -> PathBuf {
        self.version_dir.join("credreqs")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.version_dir.join("bin")
    }

    pub fn installer_binary(&self) -> PathBuf {
        self.bin_dir().join("openshift-install")
    }

    pub fn ccoctl_binary(&self) -> PathBuf {
        self.bin_dir().join("ccoctl")
    }

    pub fn install_config(&self) -> PathBuf {
        self.version_dir.join("install-config.yaml")
    }

    pub fn install_config_backup(&self) -> PathBuf {
        self.version_dir.join("install-config.yaml.backup")
    }

    pub fn install_manifests_dir(&self) -> PathBuf {
        self.version_dir.join("manifests")
    }

    pub fn install_tls_dir(&self) -> PathBuf {
        self.version_dir.join("tls")
    }

    /// Where ccoctl writes its manifests and keys
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output_manifests_dir(&self) -> PathBuf {
        self.output_dir.join("manifests")
    }

    pub fn output_tls_dir(&self) -> PathBuf {
        self.output_dir.join("tls")
    }

    pub fn install_log(&self) -> PathBuf {
        self.version_dir.join(".openshift_install.log")
    }

    pub fn kubeconfig(&self) -> PathBuf {
        self.version_dir.join("auth").join("kubeconfig")
    }

    pub fn cluster_metadata(&self) -> PathBuf {
        self.version_dir.join("metadata.json")
    }
}
