//! Reading and patching the installer's install-config.yaml

use regex::Regex;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Line that puts the cluster into manual (STS) credentials mode
pub const MANUAL_CREDENTIALS_MARKER: &str = "credentialsMode: Manual";

#[derive(Debug, Error)]
pub enum InstallConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse install-config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// The parts of install-config.yaml the installer cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInstallConfig {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub platform: Platform,
    pub credentials_mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Platform {
    pub aws: Option<AwsPlatform>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AwsPlatform {
    pub region: Option<String>,
}

impl ClusterInstallConfig {
    pub fn parse(content: &str) -> Result<Self, InstallConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, InstallConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| InstallConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Load the first of `candidates` that exists
    pub fn load_first(candidates: &[PathBuf]) -> Option<Result<Self, InstallConfigError>> {
        candidates
            .iter()
            .find(|path| path.is_file())
            .map(|path| Self::load(path))
    }

    pub fn cluster_name(&self) -> Option<&str> {
        self.metadata.name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn region(&self) -> Option<&str> {
        self.platform
            .aws
            .as_ref()
            .and_then(|aws| aws.region.as_deref())
            .filter(|r| !r.is_empty())
    }
}

fn credentials_mode_line() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(r"(?m)^credentialsMode:.*$").unwrap_or_else(|e| panic!("invalid regex: {e}"))
    })
}

/// Put `content` into manual credentials mode.
///
/// An existing top-level `credentialsMode:` line is rewritten; otherwise the
/// marker is appended. Content already carrying the marker is returned as is.
pub fn set_manual_credentials_mode(content: &str) -> String {
    if content.contains(MANUAL_CREDENTIALS_MARKER) {
        return content.to_string();
    }

    let line = credentials_mode_line();
    if line.is_match(content) {
        return line
            .replace(content, MANUAL_CREDENTIALS_MARKER)
            .into_owned();
    }

    let mut patched = content.to_string();
    if !patched.is_empty() && !patched.ends_with('\n') {
        patched.push('\n');
    }
    patched.push_str(MANUAL_CREDENTIALS_MARKER);
    patched.push('\n');
    patched
}

/// Set `platform.aws.type` on the controlPlane and compute pools that do not
/// declare one.
///
/// Returns the re-serialized document, or `None` when nothing needed
/// changing.
pub fn apply_instance_type(
    content: &str,
    instance_type: &str,
) -> Result<Option<String>, InstallConfigError> {
    let mut document: Value = serde_yaml::from_str(content)?;
    let Some(root) = document.as_mapping_mut() else {
        return Ok(None);
    };

    let mut changed = false;
    if let Some(pool) = root.get_mut("controlPlane") {
        changed |= set_pool_type(pool, instance_type);
    }
    if let Some(Value::Sequence(pools)) = root.get_mut("compute") {
        for pool in pools.iter_mut() {
            changed |= set_pool_type(pool, instance_type);
        }
    }

    if !changed {
        return Ok(None);
    }
    Ok(Some(serde_yaml::to_string(&document)?))
}

fn set_pool_type(pool: &mut Value, instance_type: &str) -> bool {
    let Some(pool) = pool.as_mapping_mut() else {
        return false;
    };
    let aws = child_mapping(child_mapping(pool, "platform"), "aws");
    if aws.contains_key("type") {
        return false;
    }
    aws.insert(
        Value::String("type".to_string()),
        Value::String(instance_type.to_string()),
    );
    true
}

/// Get `key` as a mapping, replacing a missing or null value with an empty one
fn child_mapping<'a>(parent: &'a mut Mapping, key: &str) -> &'a mut Mapping {
    let slot = parent
        .entry(Value::String(key.to_string()))
        .or_insert(Value::Null);
    if !slot.is_mapping() {
        *slot = Value::Mapping(Mapping::new());
    }
    match slot {
        Value::Mapping(mapping) => mapping,
        _ => unreachable!("slot was just set to a mapping"),
    }
}
