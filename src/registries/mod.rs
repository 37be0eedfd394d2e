//! Registry inspection used by the console: image config lookup and login verification

pub mod models;
pub mod secret;

pub use models::{
    AuthInfo, ContainerConfig, History, ImageBlob, ImageBlobInfo, ImageNameAndSecret, Rootfs,
    STATUS_FAILED, STATUS_SUCCEEDED,
};
pub use secret::{DockerConfigEntry, DockerConfigJson, docker_entry_from_secret};

use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::{Registry, RegistryOptions, parse_image};

/// Look up the config blob of an image.
///
/// `options` provides transport settings; its domain is replaced by the image's. Failures are
/// logged and reported as a failed [`ImageBlobInfo`].
pub async fn registry_image_blob(
    request: &ImageNameAndSecret,
    options: &RegistryOptions,
    output: Logger,
) -> ImageBlobInfo {
    match fetch_image_blob(request, options, &output).await {
        Ok(image) => ImageBlobInfo::succeeded(image),
        Err(e) => {
            output.error(&format!(
                "Failed to inspect image {}: {}",
                request.image_name, e
            ));
            ImageBlobInfo::failed()
        }
    }
}

async fn fetch_image_blob(
    request: &ImageNameAndSecret,
    options: &RegistryOptions,
    output: &Logger,
) -> Result<ImageBlob> {
    let entry = docker_entry_from_secret(&request.secret)?;
    let image = parse_image(&request.image_name)?;

    let mut options = options.clone();
    options.domain = image.domain.clone();

    let registry = Registry::create(
        "",
        &entry.username,
        &entry.password,
        options,
        output.clone(),
    )?;

    let token = registry.token(&registry.digest_url(&image)).await?;
    let digest = registry.digest(&image, &token).await?;
    if digest.is_empty() {
        return Err(RegistryError::Validation(format!("no manifest for {}", image)));
    }
    let image = image.with_digest(digest);

    let body = registry.blob(&image, &token).await?;
    let blob: ImageBlob = serde_json::from_slice(&body)?;
    output.verbose(&format!(
        "Image {} is {}/{} with {} layers",
        image,
        blob.os,
        blob.architecture,
        blob.rootfs.diff_ids.len()
    ));
    Ok(blob)
}

/// Verify that `auth` can log in to its registry
pub async fn registry_verify(
    auth: &AuthInfo,
    options: &RegistryOptions,
    output: Logger,
) -> Result<()> {
    let mut options = options.clone();
    options.domain = auth.server_host.clone();

    let registry = Registry::create(
        &auth.server_host,
        &auth.username,
        &auth.password,
        options,
        output,
    )?;
    registry.login().await
}
