//! Checks run before the first step: tools, pull secret, AWS credentials

use crate::core::credentials::AwsCredentials;
use crate::execution::prompt::Prompter;
use crate::runner::{CommandRunner, CommandSpec, RunnerError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Where operators download their pull secret
pub const PULL_SECRET_URL: &str = "https://cloud.redhat.com/openshift/install/pull-secret";

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("'oc' command not found in PATH. Please install the OpenShift CLI")]
    MissingOc,

    #[error("pull secret not found at {}", .0.display())]
    PullSecretMissing(PathBuf),

    #[error("failed to read pull secret {}: {source}", .path.display())]
    PullSecretRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pull secret {} is not valid JSON: {source}", .path.display())]
    PullSecretInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("AWS credentials for profile '{0}' have expired. Please refresh your credentials")]
    ExpiredCredentials(String),

    #[error("AWS credentials for profile '{0}' are invalid")]
    InvalidCredentials(String),

    #[error("failed to validate AWS credentials for profile '{profile}': {output}")]
    CredentialValidation { profile: String, output: String },

    #[error("failed to read answer: {0}")]
    Prompt(#[source] std::io::Error),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Required tools must be on PATH
pub fn check_prerequisites() -> Result<(), PreflightError> {
    which::which("oc").map_err(|_| PreflightError::MissingOc)?;
    Ok(())
}

/// The pull secret must exist and parse as JSON
pub fn validate_pull_secret(path: &Path) -> Result<(), PreflightError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            PreflightError::PullSecretMissing(path.to_path_buf())
        } else {
            PreflightError::PullSecretRead {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    serde_json::from_str::<serde_json::Value>(&content).map_err(|source| {
        PreflightError::PullSecretInvalid {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(())
}

/// Return a usable pull secret path.
///
/// When `path` does not exist, point the operator at the download page and
/// ask where they saved the file.
pub async fn resolve_pull_secret(
    path: &Path,
    prompter: &dyn Prompter,
    runner: &dyn CommandRunner,
) -> Result<PathBuf, PreflightError> {
    if path.exists() {
        validate_pull_secret(path)?;
        return Ok(path.to_path_buf());
    }

    println!("Pull secret not found at {}", path.display());
    println!("Download it from: {}", PULL_SECRET_URL);
    open_browser(runner, PULL_SECRET_URL).await;

    let answer = prompter
        .ask("Enter the path to your downloaded pull secret:")
        .await
        .map_err(PreflightError::Prompt)?;
    let chosen = match answer {
        Some(answer) => PathBuf::from(answer),
        None => return Err(PreflightError::PullSecretMissing(path.to_path_buf())),
    };

    validate_pull_secret(&chosen)?;
    info!("Using pull secret {}", chosen.display());
    Ok(chosen)
}

fn browser_command(url: &str) -> Option<CommandSpec> {
    if cfg!(target_os = "macos") {
        Some(CommandSpec::new("open").arg(url))
    } else if cfg!(target_os = "windows") {
        Some(CommandSpec::new("rundll32").args(["url.dll,FileProtocolHandler", url]))
    } else if cfg!(unix) {
        Some(CommandSpec::new("xdg-open").arg(url))
    } else {
        None
    }
}

/// Best effort; failures are only logged
pub async fn open_browser(runner: &dyn CommandRunner, url: &str) {
    let Some(command) = browser_command(url) else {
        return;
    };
    match runner.capture(&command).await {
        Ok(output) if output.is_success() => {}
        Ok(output) => debug!("{} exited with {:?}", command, output.code),
        Err(e) => debug!("Could not open browser: {}", e),
    }
}

/// Validate the profile's credentials with STS when the AWS CLI is
/// installed and the profile can be read; skip otherwise
pub async fn validate_aws_credentials(
    runner: &dyn CommandRunner,
    profile: &str,
    credentials_file: &Path,
) -> Result<(), PreflightError> {
    if which::which("aws").is_err() {
        debug!("aws CLI not found, skipping credential validation");
        return Ok(());
    }

    let credentials = match AwsCredentials::load(credentials_file, profile) {
        Ok(credentials) => credentials,
        Err(e) => {
            warn!("Skipping AWS credential validation: {}", e);
            return Ok(());
        }
    };

    verify_caller_identity(runner, profile, &credentials).await
}

/// `aws sts get-caller-identity` with the profile's keys
pub async fn verify_caller_identity(
    runner: &dyn CommandRunner,
    profile: &str,
    credentials: &AwsCredentials,
) -> Result<(), PreflightError> {
    let command = CommandSpec::new("aws")
        .args(["sts", "get-caller-identity", "--profile", profile])
        .envs(credentials.env_vars());

    let output = runner.capture(&command).await?;
    if output.is_success() {
        info!("AWS credentials for profile '{}' are valid", profile);
        return Ok(());
    }
    Err(classify_sts_failure(profile, output.output.trim()))
}

pub fn classify_sts_failure(profile: &str, output: &str) -> PreflightError {
    if output.contains("ExpiredToken") || output.contains("expired") {
        PreflightError::ExpiredCredentials(profile.to_string())
    } else if output.contains("InvalidClientTokenId") {
        PreflightError::InvalidCredentials(profile.to_string())
    } else {
        PreflightError::CredentialValidation {
            profile: profile.to_string(),
            output: output.to_string(),
        }
    }
}
