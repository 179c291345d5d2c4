//! CLI command definitions

use crate::core::config::{ConfigLayer, FailurePolicy, DEFAULT_AWS_PROFILE};
use crate::execution::CleanupOptions;
use clap::Args;
use std::path::PathBuf;

/// Run (or resume) the installation
#[derive(Debug, Args, Clone, Default)]
pub struct InstallCommand {
    /// Release image, e.g. quay.io/openshift-release-dev/ocp-release:4.12.0-x86_64
    #[arg(long)]
    pub release_image: Option<String>,

    /// Cluster name (read from install-config.yaml when omitted)
    #[arg(long)]
    pub cluster_name: Option<String>,

    /// AWS region (read from install-config.yaml when omitted)
    #[arg(long)]
    pub region: Option<String>,

    /// AWS profile from the shared credentials file
    #[arg(long)]
    pub aws_profile: Option<String>,

    /// Path to the pull secret
    #[arg(long)]
    pub pull_secret: Option<PathBuf>,

    /// Serve the OIDC issuer from a private S3 bucket behind CloudFront
    #[arg(long)]
    pub private_bucket: bool,

    /// Skip every step before this one (1-11)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=11))]
    pub start_from_step: Option<u8>,

    /// Ask before running each step
    #[arg(long)]
    pub confirm_each_step: bool,

    /// Instance type for the control plane and compute pools
    #[arg(long)]
    pub instance_type: Option<String>,

    /// What to do when a step fails
    #[arg(long, value_enum)]
    pub on_failure: Option<FailurePolicyArg>,

    /// Directory for ccoctl output (default: artifacts/<version-arch>/_output)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl InstallCommand {
    /// Flags as a configuration layer; unset flags leave lower layers alone
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            release_image: self.release_image.clone(),
            cluster_name: self.cluster_name.clone(),
            aws_region: self.region.clone(),
            aws_profile: self.aws_profile.clone(),
            pull_secret_path: self.pull_secret.clone(),
            private_bucket: self.private_bucket.then_some(true),
            output_dir: self.output_dir.clone(),
            start_from_step: self.start_from_step.map(usize::from),
            confirm_each_step: self.confirm_each_step.then_some(true),
            instance_type: self.instance_type.clone(),
            on_failure: self.on_failure.map(Into::into),
            aws_credentials_file: None,
        }
    }
}

/// Delete the AWS resources created for a cluster
#[derive(Debug, Args, Clone)]
pub struct CleanupCommand {
    /// Cluster (infrastructure) name given to ccoctl
    #[arg(long)]
    pub cluster_name: String,

    /// AWS region
    #[arg(long)]
    pub region: String,

    /// Release image whose artifacts (ccoctl, cluster metadata) to use
    #[arg(long)]
    pub release_image: Option<String>,

    /// AWS profile from the shared credentials file [default: default]
    #[arg(long)]
    pub aws_profile: Option<String>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl CleanupCommand {
    /// Flags over the config file and environment `layers`
    pub fn to_options(&self, layers: &ConfigLayer) -> CleanupOptions {
        let flags = ConfigLayer {
            release_image: self.release_image.clone(),
            aws_profile: self.aws_profile.clone(),
            ..ConfigLayer::default()
        };
        let merged = layers.clone().merge(flags);

        CleanupOptions {
            cluster_name: self.cluster_name.clone(),
            region: self.region.clone(),
            release_image: merged.release_image,
            aws_profile: merged
                .aws_profile
                .unwrap_or_else(|| DEFAULT_AWS_PROFILE.to_string()),
            aws_credentials_file: merged.aws_credentials_file,
            assume_yes: self.yes,
        }
    }
}

/// Failure policy argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicyArg {
    Abort,
    Prompt,
}

impl From<FailurePolicyArg> for FailurePolicy {
    fn from(arg: FailurePolicyArg) -> Self {
        match arg {
            FailurePolicyArg::Abort => FailurePolicy::Abort,
            FailurePolicyArg::Prompt => FailurePolicy::Prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_flags_produce_empty_layer() {
        assert_eq!(InstallCommand::default().to_layer(), ConfigLayer::default());
    }

    #[test]
    fn test_flags_to_layer() {
        let command = InstallCommand {
            region: Some("us-east-2".to_string()),
            private_bucket: true,
            start_from_step: Some(8),
            on_failure: Some(FailurePolicyArg::Prompt),
            ..InstallCommand::default()
        };

        let layer = command.to_layer();
        assert_eq!(layer.aws_region.as_deref(), Some("us-east-2"));
        assert_eq!(layer.private_bucket, Some(true));
        assert_eq!(layer.start_from_step, Some(8));
        assert_eq!(layer.on_failure, Some(FailurePolicy::Prompt));
        assert_eq!(layer.confirm_each_step, None);
    }

    fn cleanup(aws_profile: Option<&str>) -> CleanupCommand {
        CleanupCommand {
            cluster_name: "sts-demo".to_string(),
            region: "us-east-2".to_string(),
            release_image: None,
            aws_profile: aws_profile.map(str::to_string),
            yes: false,
        }
    }

    #[test]
    fn test_cleanup_profile_defaults() {
        let options = cleanup(None).to_options(&ConfigLayer::default());
        assert_eq!(options.aws_profile, DEFAULT_AWS_PROFILE);
        assert_eq!(options.release_image, None);
    }

    #[test]
    fn test_cleanup_takes_profile_from_config_layers() {
        let env = ConfigLayer::from_env_with(|name| match name {
            "OPENSHIFT_STS_AWS_PROFILE" => Some("from-env".to_string()),
            _ => None,
        })
        .unwrap();
        let file = ConfigLayer::from_yaml(
            "releaseImage: quay.io/ocp-release:4.12.0-x86_64\n\
             awsCredentialsFile: /etc/aws/credentials\n",
        )
        .unwrap();

        let options = cleanup(None).to_options(&env.clone().merge(file.clone()));
        assert_eq!(options.aws_profile, "from-env");
        assert_eq!(
            options.release_image.as_deref(),
            Some("quay.io/ocp-release:4.12.0-x86_64")
        );
        assert_eq!(
            options.aws_credentials_file.as_deref(),
            Some(std::path::Path::new("/etc/aws/credentials"))
        );

        let file = ConfigLayer::from_yaml("awsProfile: from-file\n").unwrap();
        let options = cleanup(None).to_options(&env.clone().merge(file.clone()));
        assert_eq!(options.aws_profile, "from-file");

        let options = cleanup(Some("from-flags")).to_options(&env.merge(file));
        assert_eq!(options.aws_profile, "from-flags");
    }

    #[test]
    fn test_flags_override_file_layer() {
        let file = ConfigLayer::from_yaml(
            "releaseImage: quay.io/ocp-release:4.12.0-x86_64\nclusterName: from-file\n",
        )
        .unwrap();
        let flags = InstallCommand {
            cluster_name: Some("from-flags".to_string()),
            ..InstallCommand::default()
        };

        let config = file.merge(flags.to_layer()).resolve().unwrap();
        assert_eq!(config.cluster_name.as_deref(), Some("from-flags"));
        assert_eq!(config.release_image, "quay.io/ocp-release:4.12.0-x86_64");
    }
}
