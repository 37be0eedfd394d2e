//! Registry credentials from Kubernetes `kubernetes.io/dockerconfigjson` secrets

use crate::error::{RegistryError, Result};
use base64::Engine;
use k8s_openapi::api::core::v1::Secret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SECRET_TYPE_DOCKER_CONFIG_JSON: &str = "kubernetes.io/dockerconfigjson";
pub const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockerConfigJson {
    #[serde(default)]
    pub auths: BTreeMap<String, DockerConfigEntry>,
}

/// One registry entry of a docker config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerConfigEntry {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "serverAddress", default, skip_serializing_if = "String::is_empty")]
    pub server_address: String,
    /// Base64 of `username:password`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth: String,
}

impl DockerConfigEntry {
    /// Fill username and password from the `auth` field when they are absent
    fn resolve_credentials(mut self) -> Result<Self> {
        if self.username.is_empty() && !self.auth.is_empty() {
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(self.auth.trim())
                .map_err(|e| RegistryError::Secret(format!("invalid auth field: {}", e)))?;
            let decoded = String::from_utf8(decoded)
                .map_err(|e| RegistryError::Secret(format!("invalid auth field: {}", e)))?;
            let (username, password) = decoded.split_once(':').ok_or_else(|| {
                RegistryError::Secret("auth field is not username:password".to_string())
            })?;
            self.username = username.to_string();
            self.password = password.to_string();
        }
        Ok(self)
    }
}

/// Registry credentials carried by a pull secret.
///
/// A secret without a type stands for anonymous access. The first registry entry, in address
/// order, is used.
pub fn docker_entry_from_secret(secret: &Secret) -> Result<DockerConfigEntry> {
    let secret_type = secret.type_.as_deref().unwrap_or_default();
    if secret_type.is_empty() {
        return Ok(DockerConfigEntry::default());
    }

    if secret_type != SECRET_TYPE_DOCKER_CONFIG_JSON {
        return Err(RegistryError::Secret(format!(
            "secret {} in ns {} type should be {}",
            secret.metadata.name.as_deref().unwrap_or_default(),
            secret.metadata.namespace.as_deref().unwrap_or_default(),
            SECRET_TYPE_DOCKER_CONFIG_JSON
        )));
    }

    let data = secret
        .data
        .as_ref()
        .and_then(|data| data.get(DOCKER_CONFIG_JSON_KEY))
        .ok_or_else(|| {
            RegistryError::Secret(format!("could not get data {}", DOCKER_CONFIG_JSON_KEY))
        })?;

    let config: DockerConfigJson = serde_json::from_slice(&data.0)?;
    let (address, entry) = config
        .auths
        .into_iter()
        .next()
        .ok_or_else(|| RegistryError::Secret("docker config auth len should not be 0".to_string()))?;

    let mut entry = entry.resolve_credentials()?;
    entry.server_address = address;
    Ok(entry)
}
