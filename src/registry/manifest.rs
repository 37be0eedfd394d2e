//! Manifest retrieval
//!
//! Resolves the config digest of an image from its schema 2 manifest
//! (`GET /v2/{name}/manifests/{reference}`).

use crate::error::Result;
use crate::registry::client::{Registry, expect_status, read_body};
use crate::registry::image::Image;
use serde::{Deserialize, Serialize};

/// Docker image manifest, schema 2
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageManifest {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub config: Descriptor,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
}

/// `sha256:` followed by 64 hex characters
pub fn is_canonical_digest(digest: &str) -> bool {
    digest
        .strip_prefix("sha256:")
        .is_some_and(|hex| hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

impl Registry {
    /// Config digest of `image`.
    ///
    /// A digest already present on the image is returned without any request. A `404`
    /// from the registry yields an empty digest.
    pub async fn digest(&self, image: &Image, token: &str) -> Result<String> {
        if image.is_resolved() {
            return Ok(image.digest.clone());
        }

        let url = self.digest_url(image);
        self.output.info(&format!("registry.manifests.get url={}", url));

        let response = self.manifest_get(&url, token).send().await?;
        expect_status(&response, &url, &[200, 404])?;

        if response.status().as_u16() == 404 {
            self.output
                .warning(&format!("Manifest not found for {}, no digest", image));
            return Ok(String::new());
        }

        let body = read_body(response).await?;
        let manifest: ImageManifest = serde_json::from_slice(&body)?;
        self.output.verbose(&format!(
            "Manifest {} has {} layers, config {}",
            manifest.media_type,
            manifest.layers.len(),
            manifest.config.digest
        ));

        Ok(manifest.config.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_schema2_manifest() {
        let body = r#"{
            "schemaVersion": 2,
            "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
            "config": {
                "mediaType": "application/vnd.docker.container.image.v1+json",
                "size": 1472,
                "digest": "sha256:c1aabb73d2339c5ebaa3681de2e9d9c18d57485045a4e311d9f8004bec208d67"
            },
            "layers": [
                {
                    "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                    "size": 3408729,
                    "digest": "sha256:31e352740f534f9ad170f75378a84fe453d6156e40700b882d737a8f4a6988a3"
                }
            ]
        }"#;
        let manifest: ImageManifest = serde_json::from_str(body).unwrap();
        assert_eq!(manifest.schema_version, 2);
        assert_eq!(manifest.layers.len(), 1);
        assert!(is_canonical_digest(&manifest.config.digest));
    }

    #[test]
    fn test_canonical_digest() {
        assert!(is_canonical_digest(
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        ));
        assert!(!is_canonical_digest("sha256:invalid"));
        assert!(!is_canonical_digest(
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        ));
    }
}
