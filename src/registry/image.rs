//! Image references
//!
//! An [`Image`] names an artifact in a registry: the registry domain, the repository path, a
//! tag or pinned manifest digest and, once resolved, the digest of its config blob.

use crate::error::{RegistryError, Result};
use std::fmt;

/// Domain used when an image name does not carry one
pub const DEFAULT_DOMAIN: &str = "docker.io";

const LEGACY_DEFAULT_DOMAIN: &str = "index.docker.io";
const OFFICIAL_REPO_PREFIX: &str = "library/";
const DEFAULT_TAG: &str = "latest";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub domain: String,
    pub path: String,
    pub tag: String,
    /// Manifest digest from an `name@sha256:...` reference
    pub manifest_digest: String,
    /// Config digest. Empty until resolved; a non-empty digest short-circuits digest lookups
    pub digest: String,
}

impl Image {
    pub fn new(domain: &str, path: &str, tag: &str) -> Self {
        Self {
            domain: domain.to_string(),
            path: path.to_string(),
            tag: tag.to_string(),
            manifest_digest: String::new(),
            digest: String::new(),
        }
    }

    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = digest.into();
        self
    }

    pub fn is_resolved(&self) -> bool {
        !self.digest.is_empty()
    }

    /// Manifest reference: the tag, or the manifest digest for digest-pinned references
    pub fn reference(&self) -> &str {
        if self.tag.is_empty() {
            &self.manifest_digest
        } else {
            &self.tag
        }
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.path)?;
        if !self.tag.is_empty() {
            write!(f, ":{}", self.tag)?;
        }
        if !self.manifest_digest.is_empty() {
            write!(f, "@{}", self.manifest_digest)?;
        }
        Ok(())
    }
}

/// Parse a docker-style image name such as `alpine`, `quay.io/org/app:1.2` or
/// `localhost:5000/app@sha256:...`.
pub fn parse_image(name: &str) -> Result<Image> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RegistryError::Validation(
            "Image name cannot be empty".to_string(),
        ));
    }

    let (rest, manifest_digest) = match name.split_once('@') {
        Some((rest, digest)) => {
            if !digest.contains(':') {
                return Err(RegistryError::Validation(format!(
                    "Invalid digest in image name: {}",
                    name
                )));
            }
            (rest, digest.to_string())
        }
        None => (name, String::new()),
    };

    let (mut domain, remainder) = match rest.split_once('/') {
        Some((first, remainder))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (first.to_string(), remainder)
        }
        _ => (DEFAULT_DOMAIN.to_string(), rest),
    };
    if domain == LEGACY_DEFAULT_DOMAIN {
        domain = DEFAULT_DOMAIN.to_string();
    }

    // A colon after the last slash separates the tag
    let (path, tag) = match remainder.rfind(':') {
        Some(pos) if !remainder[pos..].contains('/') => {
            let tag = &remainder[pos + 1..];
            if tag.is_empty() {
                return Err(RegistryError::Validation(format!(
                    "Empty tag in image name: {}",
                    name
                )));
            }
            (&remainder[..pos], tag.to_string())
        }
        _ => (remainder, String::new()),
    };

    if path.is_empty() || path.starts_with('/') || path.ends_with('/') || path.contains("//") {
        return Err(RegistryError::Validation(format!(
            "Invalid repository path in image name: {}",
            name
        )));
    }
    if path.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(RegistryError::Validation(format!(
            "Repository path must be lowercase: {}",
            path
        )));
    }

    let path = if domain == DEFAULT_DOMAIN && !path.contains('/') {
        format!("{}{}", OFFICIAL_REPO_PREFIX, path)
    } else {
        path.to_string()
    };

    let tag = if tag.is_empty() && manifest_digest.is_empty() {
        DEFAULT_TAG.to_string()
    } else {
        tag
    };

    Ok(Image {
        domain,
        path,
        tag,
        manifest_digest,
        digest: String::new(),
    })
}
