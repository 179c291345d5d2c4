//! Run configuration: environment, YAML file and flag layers

use crate::core::credentials::{self, CredentialsError};
use crate::core::release::VersionArch;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "openshift-sts-installer.yaml";

/// Prefix shared by all configuration environment variables
pub const ENV_PREFIX: &str = "OPENSHIFT_STS_";

pub const DEFAULT_AWS_PROFILE: &str = "default";
pub const DEFAULT_PULL_SECRET: &str = "pull-secret.json";
pub const DEFAULT_INSTANCE_TYPE: &str = "m5.4xlarge";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("release image is required")]
    MissingReleaseImage,

    #[error("invalid release image '{image}': {reason}")]
    InvalidReleaseImage { image: String, reason: &'static str },

    #[error("invalid value '{value}' for {variable}")]
    InvalidEnv { variable: String, value: String },
}

/// What to do when a step fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run at the first failed step
    #[default]
    Abort,
    /// Ask the operator whether to carry on with the next step
    Prompt,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "prompt" => Ok(FailurePolicy::Prompt),
            other => Err(format!("unknown failure policy '{}'", other)),
        }
    }
}

/// One source of configuration (environment, file or flags).
///
/// Every field is optional; layers are merged with [`ConfigLayer::merge`] and
/// then turned into a [`PipelineConfig`] by [`ConfigLayer::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigLayer {
    pub release_image: Option<String>,
    pub cluster_name: Option<String>,
    pub aws_region: Option<String>,
    pub aws_profile: Option<String>,
    pub pull_secret_path: Option<PathBuf>,
    pub private_bucket: Option<bool>,
    pub output_dir: Option<PathBuf>,
    pub start_from_step: Option<usize>,
    pub confirm_each_step: Option<bool>,
    pub instance_type: Option<String>,
    pub on_failure: Option<FailurePolicy>,
    pub aws_credentials_file: Option<PathBuf>,
}

impl ConfigLayer {
    /// Load a layer from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a layer from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to null
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let layer: ConfigLayer = serde_yaml::from_str(yaml)?;
        Ok(layer.normalized())
    }

    /// Load a layer from `OPENSHIFT_STS_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load a layer through an arbitrary variable lookup
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let flag = |name: &str| var(name).map(|v| v == "true");

        let start_from_step = match var("START_FROM_STEP") {
            Some(value) => Some(value.trim().parse::<usize>().map_err(|_| {
                ConfigError::InvalidEnv {
                    variable: format!("{}START_FROM_STEP", ENV_PREFIX),
                    value: value.clone(),
                }
            })?),
            None => None,
        };

        let on_failure = match var("ON_FAILURE") {
            Some(value) => Some(value.parse::<FailurePolicy>().map_err(|_| {
                ConfigError::InvalidEnv {
                    variable: format!("{}ON_FAILURE", ENV_PREFIX),
                    value: value.clone(),
                }
            })?),
            None => None,
        };

        let layer = ConfigLayer {
            release_image: var("RELEASE_IMAGE"),
            cluster_name: var("CLUSTER_NAME"),
            aws_region: var("AWS_REGION"),
            aws_profile: var("AWS_PROFILE"),
            pull_secret_path: var("PULL_SECRET_PATH").map(PathBuf::from),
            private_bucket: flag("PRIVATE_BUCKET"),
            output_dir: var("OUTPUT_DIR").map(PathBuf::from),
            start_from_step,
            confirm_each_step: flag("CONFIRM_EACH_STEP"),
            instance_type: var("INSTANCE_TYPE"),
            on_failure,
            aws_credentials_file: var("AWS_CREDENTIALS_FILE").map(PathBuf::from),
        };
        Ok(layer.normalized())
    }

    /// Treat empty strings, `false` and a zero step as "not set"
    pub fn normalized(self) -> Self {
        fn text(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }
        fn path(value: Option<PathBuf>) -> Option<PathBuf> {
            value.filter(|p| !p.as_os_str().is_empty())
        }

        ConfigLayer {
            release_image: text(self.release_image),
            cluster_name: text(self.cluster_name),
            aws_region: text(self.aws_region),
            aws_profile: text(self.aws_profile),
            pull_secret_path: path(self.pull_secret_path),
            private_bucket: self.private_bucket.filter(|b| *b),
            output_dir: path(self.output_dir),
            start_from_step: self.start_from_step.filter(|n| *n > 0),
            confirm_each_step: self.confirm_each_step.filter(|b| *b),
            instance_type: text(self.instance_type),
            on_failure: self.on_failure,
            aws_credentials_file: path(self.aws_credentials_file),
        }
    }

    /// Merge `other` into this layer; fields set in `other` win
    pub fn merge(self, other: ConfigLayer) -> Self {
        let other = other.normalized();
        let this = self.normalized();
        ConfigLayer {
            release_image: other.release_image.or(this.release_image),
            cluster_name: other.cluster_name.or(this.cluster_name),
            aws_region: other.aws_region.or(this.aws_region),
            aws_profile: other.aws_profile.or(this.aws_profile),
            pull_secret_path: other.pull_secret_path.or(this.pull_secret_path),
            private_bucket: other.private_bucket.or(this.private_bucket),
            output_dir: other.output_dir.or(this.output_dir),
            start_from_step: other.start_from_step.or(this.start_from_step),
            confirm_each_step: other.confirm_each_step.or(this.confirm_each_step),
            instance_type: other.instance_type.or(this.instance_type),
            on_failure: other.on_failure.or(this.on_failure),
            aws_credentials_file: other.aws_credentials_file.or(this.aws_credentials_file),
        }
    }

    /// Apply defaults and validate into the final run configuration
    pub fn resolve(self) -> Result<PipelineConfig, ConfigError> {
        let layer = self.normalized();
        let release_image = layer.release_image.ok_or(ConfigError::MissingReleaseImage)?;
        VersionArch::from_release_image(&release_image)?;

        Ok(PipelineConfig {
            release_image,
            cluster_name: layer.cluster_name,
            aws_region: layer.aws_region,
            aws_profile: layer
                .aws_profile
                .unwrap_or_else(|| DEFAULT_AWS_PROFILE.to_string()),
            pull_secret_path: layer
                .pull_secret_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PULL_SECRET)),
            private_bucket: layer.private_bucket.unwrap_or(false),
            output_dir: layer.output_dir,
            start_from_step: layer.start_from_step,
            confirm_each_step: layer.confirm_each_step.unwrap_or(false),
            instance_type: layer
                .instance_type
                .unwrap_or_else(|| DEFAULT_INSTANCE_TYPE.to_string()),
            on_failure: layer.on_failure.unwrap_or_default(),
            aws_credentials_file: layer.aws_credentials_file,
        })
    }
}

/// Resolved configuration for one installer run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    /// Release image reference, always carrying a version tag
    pub release_image: String,

    /// Cluster name; back-filled from install-config.yaml when unset
    pub cluster_name: Option<String>,

    /// AWS region; back-filled from install-config.yaml when unset
    pub aws_region: Option<String>,

    pub aws_profile: String,
    pub pull_secret_path: PathBuf,

    /// Create a private S3 bucket fronted by CloudFront for the OIDC issuer
    pub private_bucket: bool,

    /// ccoctl output directory; `artifacts/<version-arch>/_output` when unset
    pub output_dir: Option<PathBuf>,

    /// Skip every step numbered below this one
    pub start_from_step: Option<usize>,

    pub confirm_each_step: bool,

    /// Instance type for the control plane and compute pools
    pub instance_type: String,

    pub on_failure: FailurePolicy,

    /// AWS shared credentials file; `~/.aws/credentials` when unset
    pub aws_credentials_file: Option<PathBuf>,
}

impl PipelineConfig {
    /// Configuration for `release_image` with every other field defaulted
    pub fn for_release(release_image: &str) -> Result<Self, ConfigError> {
        ConfigLayer {
            release_image: Some(release_image.to_string()),
            ..ConfigLayer::default()
        }
        .resolve()
    }

    pub fn version_arch(&self) -> Result<VersionArch, ConfigError> {
        VersionArch::from_release_image(&self.release_image)
    }

    /// Cluster name and region, when both are known
    pub fn cluster_identity(&self) -> Option<(&str, &str)> {
        match (self.cluster_name.as_deref(), self.aws_region.as_deref()) {
            (Some(name), Some(region)) if !name.is_empty() && !region.is_empty() => {
                Some((name, region))
            }
            _ => None,
        }
    }

    /// Fill cluster name and region where they are still unset.
    ///
    /// Returns true when anything changed.
    pub fn backfill_cluster_identity(&mut self, name: Option<&str>, region: Option<&str>) -> bool {
        let mut changed = false;
        if self.cluster_name.is_none() {
            if let Some(name) = name.filter(|n| !n.is_empty()) {
                self.cluster_name = Some(name.to_string());
                changed = true;
            }
        }
        if self.aws_region.is_none() {
            if let Some(region) = region.filter(|r| !r.is_empty()) {
                self.aws_region = Some(region.to_string());
                changed = true;
            }
        }
        changed
    }

    /// Location of the AWS shared credentials file
    pub fn credentials_path(&self) -> Result<PathBuf, CredentialsError> {
        match &self.aws_credentials_file {
            Some(path) => Ok(path.clone()),
            None => credentials::default_credentials_path(),
        }
    }
}
