//! AWS shared credentials file

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

pub const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("failed to read credentials file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("profile '{0}' not found or missing required credentials")]
    ProfileNotFound(String),
}

/// Keys of one profile
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

// Secrets stay out of logs
impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn section_header() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^\[\s*(?:profile\s+)?([^\]]+?)\s*\]$")
            .unwrap_or_else(|e| panic!("invalid regex: {e}"))
    })
}

impl AwsCredentials {
    /// Parse the section for `profile` out of an INI-style credentials file
    pub fn parse(content: &str, profile: &str) -> Result<Self, CredentialsError> {
        let mut in_profile = false;
        let mut access_key_id = None;
        let mut secret_access_key = None;
        let mut session_token = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(captures) = section_header().captures(line) {
                in_profile = &captures[1] == profile;
                continue;
            }
            if !in_profile {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "aws_access_key_id" => access_key_id = Some(value),
                "aws_secret_access_key" => secret_access_key = Some(value),
                "aws_session_token" => session_token = Some(value),
                _ => {}
            }
        }

        match (access_key_id, secret_access_key) {
            (Some(access_key_id), Some(secret_access_key))
                if !access_key_id.is_empty() && !secret_access_key.is_empty() =>
            {
                Ok(Self {
                    access_key_id,
                    secret_access_key,
                    session_token: session_token.filter(|t| !t.is_empty()),
                })
            }
            _ => Err(CredentialsError::ProfileNotFound(profile.to_string())),
        }
    }

    /// Read `profile` from the credentials file at `path`
    pub fn load(path: &Path, profile: &str) -> Result<Self, CredentialsError> {
        let content = std::fs::read_to_string(path).map_err(|source| CredentialsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, profile)
    }

    /// Environment variables understood by the AWS tooling
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut vars = vec![
            (ACCESS_KEY_ID_VAR.to_string(), self.access_key_id.clone()),
            (SECRET_ACCESS_KEY_VAR.to_string(), self.secret_access_key.clone()),
        ];
        if let Some(token) = &self.session_token {
            vars.push((SESSION_TOKEN_VAR.to_string(), token.clone()));
        }
        vars
    }
}

/// `AWS_SHARED_CREDENTIALS_FILE`, falling back to `~/.aws/credentials`
pub fn default_credentials_path() -> Result<PathBuf, CredentialsError> {
    if let Some(path) = std::env::var_os("AWS_SHARED_CREDENTIALS_FILE").filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    dirs::home_dir()
        .map(|home| home.join(".aws").join("credentials"))
        .ok_or(CredentialsError::NoHomeDir)
}

/// Credential variables for `profile`, or none when they cannot be read.
///
/// The commands that receive them can still fall back to whatever the
/// environment already provides.
pub fn injectable_env(
    path: Result<PathBuf, CredentialsError>,
    profile: &str,
) -> Vec<(String, String)> {
    match path.and_then(|path| AwsCredentials::load(&path, profile)) {
        Ok(credentials) => credentials.env_vars(),
        Err(e) => {
            warn!("Could not read AWS credentials for profile '{}': {}", profile, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CREDENTIALS: &str = r#"
# managed by hand
[default]
aws_access_key_id = AKIADEFAULT
aws_secret_access_key = default-secret

[profile sts]
aws_access_key_id=AKIASTS
aws_secret_access_key=sts-secret
aws_session_token=sts-token

[broken]
aws_access_key_id = AKIABROKEN
"#;

    #[test]
    fn test_parse_default_profile() {
        let creds = AwsCredentials::parse(CREDENTIALS, "default").unwrap();
        assert_eq!(creds.access_key_id, "AKIADEFAULT");
        assert_eq!(creds.secret_access_key, "default-secret");
        assert_eq!(creds.session_token, None);
        assert_eq!(creds.env_vars().len(), 2);
    }

    #[test]
    fn test_parse_profile_prefix_and_session_token() {
        let creds = AwsCredentials::parse(CREDENTIALS, "sts").unwrap();
        assert_eq!(creds.access_key_id, "AKIASTS");
        assert_eq!(creds.session_token.as_deref(), Some("sts-token"));

        let vars = creds.env_vars();
        assert!(vars.contains(&(SESSION_TOKEN_VAR.to_string(), "sts-token".to_string())));
    }

    #[test]
    fn test_incomplete_or_missing_profile() {
        assert!(matches!(
            AwsCredentials::parse(CREDENTIALS, "broken"),
            Err(CredentialsError::ProfileNotFound(_))
        ));
        assert!(matches!(
            AwsCredentials::parse(CREDENTIALS, "nope"),
            Err(CredentialsError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = AwsCredentials::parse(CREDENTIALS, "sts").unwrap();
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("sts-secret"));
        assert!(!rendered.contains("sts-token"));
    }

    #[test]
    fn test_injectable_env_is_empty_on_failure() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("credentials");
        assert!(injectable_env(Ok(missing.clone()), "default").is_empty());

        std::fs::write(&missing, CREDENTIALS).unwrap();
        assert_eq!(injectable_env(Ok(missing), "default").len(), 2);
    }
}
