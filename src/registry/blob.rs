//! Blob retrieval (`GET /v2/{name}/blobs/{digest}`)

use crate::error::Result;
use crate::registry::client::{Registry, expect_status, read_body};
use crate::registry::image::Image;
use crate::registry::manifest::is_canonical_digest;
use sha2::{Digest, Sha256};

impl Registry {
    /// Raw, gzip-decoded blob content for `image.digest`
    pub async fn blob(&self, image: &Image, token: &str) -> Result<Vec<u8>> {
        let url = self.blob_url(image);
        self.output.info(&format!("registry.blobs.get url={}", url));

        let response = self.manifest_get(&url, token).send().await?;
        expect_status(&response, &url, &[200, 404])?;
        let found = response.status().as_u16() == 200;

        let body = read_body(response).await?;
        self.output.detail(&format!(
            "Blob body {}",
            self.output.format_size(body.len() as u64)
        ));

        if found && is_canonical_digest(&image.digest) {
            let actual = format!("sha256:{}", hex::encode(Sha256::digest(&body)));
            if actual != image.digest {
                self.output.warning(&format!(
                    "Digest mismatch! Expected: {}, Actual: {}",
                    image.digest, actual
                ));
            }
        }

        Ok(body)
    }
}
