//! Request and response types of the registry inspection API

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Secret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STATUS_FAILED: &str = "failed";
pub const STATUS_SUCCEEDED: &str = "succeeded";

/// Credentials to verify against a registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthInfo {
    pub username: String,
    pub password: String,
    #[serde(rename = "serverhost")]
    pub server_host: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNameAndSecret {
    /// Full image name
    pub image_name: String,
    /// Pull secret; a secret without a type means anonymous access
    #[serde(default)]
    pub secret: Secret,
}

/// Outcome of an image lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageBlobInfo {
    /// "succeeded" or "failed"
    pub status: String,
    #[serde(rename = "imageBlob", skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageBlob>,
}

impl ImageBlobInfo {
    pub fn failed() -> Self {
        Self {
            status: STATUS_FAILED.to_string(),
            image: None,
        }
    }

    pub fn succeeded(image: ImageBlob) -> Self {
        Self {
            status: STATUS_SUCCEEDED.to_string(),
            image: Some(image),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCEEDED
    }
}

/// Image configuration blob
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageBlob {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,
    #[serde(default)]
    pub config: ContainerConfig,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container: String,
    #[serde(default)]
    pub container_config: ContainerConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub docker_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<History>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os: String,
    #[serde(default)]
    pub rootfs: Rootfs,
}

/// Runtime configuration of a container created from the image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domainname: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(default)]
    pub attach_stdin: bool,
    #[serde(default)]
    pub attach_stdout: bool,
    #[serde(default)]
    pub attach_stderr: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed_ports: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub tty: bool,
    #[serde(default)]
    pub open_stdin: bool,
    #[serde(default)]
    pub stdin_once: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<Vec<String>>,
    #[serde(default)]
    pub args_escaped: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_dir: String,
    /// String or list of strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_build: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stop_signal: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,
    #[serde(default)]
    pub empty_layer: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rootfs {
    /// Always "layers"
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diff_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_image_config_blob() {
        let blob = r#"{
            "architecture": "amd64",
            "config": {
                "Env": ["PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"],
                "Cmd": ["/bin/sh"],
                "Entrypoint": null,
                "ExposedPorts": {"80/tcp": {}},
                "Labels": {"maintainer": "NGINX Docker Maintainers"},
                "StopSignal": "SIGQUIT"
            },
            "created": "2023-08-07T19:20:20.894140623Z",
            "history": [
                {"created": "2023-08-07T19:20:20.71894984Z", "created_by": "/bin/sh -c #(nop) ADD file:32ff5e7a78b890996ee4681cc0a26185d3e9acdb4eb1e2aaccb2411f922fed6b in / "},
                {"created": "2023-08-07T19:20:20.894140623Z", "created_by": "/bin/sh -c #(nop)  CMD [\"/bin/sh\"]", "empty_layer": true}
            ],
            "os": "linux",
            "rootfs": {
                "type": "layers",
                "diff_ids": ["sha256:4693057ce2364720d39e57e85a5b8e0bd9ac3573716237736d6470ec5b7b7230"]
            }
        }"#;

        let image: ImageBlob = serde_json::from_str(blob).unwrap();
        assert_eq!(image.architecture, "amd64");
        assert_eq!(image.os, "linux");
        assert_eq!(image.config.cmd.as_deref(), Some(&["/bin/sh".to_string()][..]));
        assert_eq!(image.config.stop_signal, "SIGQUIT");
        assert!(image.config.exposed_ports.unwrap().contains_key("80/tcp"));
        assert_eq!(image.history.len(), 2);
        assert!(image.history[1].empty_layer);
        assert_eq!(image.rootfs.kind, "layers");
        assert_eq!(image.rootfs.diff_ids.len(), 1);
        assert!(image.created.is_some());
    }

    #[test]
    fn test_status_helpers() {
        assert!(!ImageBlobInfo::failed().is_success());
        let ok = ImageBlobInfo::succeeded(ImageBlob::default());
        assert!(ok.is_success());
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "succeeded");
        assert!(json.get("imageBlob").is_some());
    }
}
