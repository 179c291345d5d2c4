//! Release image reference parsing

use crate::core::config::ConfigError;
use std::fmt;

/// Version and architecture of a release, taken from the image tag.
///
/// Every artifact produced for a release lives under
/// `artifacts/<version-arch>/`, so several releases can sit side by side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionArch(String);

impl VersionArch {
    /// Parse the trailing tag of a release image reference.
    ///
    /// `quay.io/openshift-release-dev/ocp-release:4.12.0-x86_64` → `4.12.0-x86_64`
    pub fn from_release_image(image: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &'static str| ConfigError::InvalidReleaseImage {
            image: image.to_string(),
            reason,
        };

        let image = image.trim();
        if image.is_empty() {
            return Err(ConfigError::MissingReleaseImage);
        }
        if image.contains('@') {
            return Err(invalid("release image must be referenced by tag, not digest"));
        }

        let (_, tag) = image
            .rsplit_once(':')
            .ok_or_else(|| invalid("release image must contain a tag (e.g. :4.12.0-x86_64)"))?;

        // registry:5000/path has a port, not a tag
        if tag.contains('/') {
            return Err(invalid("release image must contain a tag (e.g. :4.12.0-x86_64)"));
        }
        if tag.is_empty() {
            return Err(invalid("release image tag cannot be empty"));
        }

        Ok(Self(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_release_image() {
        let va = VersionArch::from_release_image(
            "quay.io/openshift-release-dev/ocp-release:4.12.0-x86_64",
        )
        .unwrap();
        assert_eq!(va.as_str(), "4.12.0-x86_64");
    }

    #[test]
    fn test_prerelease_and_arch_variants() {
        let fc = VersionArch::from_release_image(
            "quay.io/openshift-release-dev/ocp-release:4.10.0-fc.4-x86_64",
        )
        .unwrap();
        assert_eq!(fc.as_str(), "4.10.0-fc.4-x86_64");

        let arm = VersionArch::from_release_image("registry/path:4.13.1-aarch64").unwrap();
        assert_eq!(arm.to_string(), "4.13.1-aarch64");
    }

    #[test]
    fn test_registry_port_without_tag() {
        let va = VersionArch::from_release_image("mirror.local:5000/ocp/release:4.14.2-x86_64")
            .unwrap();
        assert_eq!(va.as_str(), "4.14.2-x86_64");

        assert!(VersionArch::from_release_image("mirror.local:5000/ocp/release").is_err());
    }

    #[test]
    fn test_invalid_references() {
        assert!(matches!(
            VersionArch::from_release_image(""),
            Err(ConfigError::MissingReleaseImage)
        ));
        assert!(
            VersionArch::from_release_image("quay.io/openshift-release-dev/ocp-release").is_err()
        );
        assert!(VersionArch::from_release_image("quay.io/ocp-release:").is_err());
        assert!(VersionArch::from_release_image("quay.io/ocp-release@sha256:abc123").is_err());
    }
}
