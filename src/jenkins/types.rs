//! API response types for the Jenkins API

use serde::{Deserialize, Serialize};

/// Root of `/api/json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorResponse {
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub node_description: String,
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub num_executors: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub jobs: Vec<InnerJob>,
    #[serde(default)]
    pub use_crumbs: bool,
    #[serde(default)]
    pub use_security: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InnerJob {
    #[serde(rename = "_class", default)]
    pub class: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildRef {
    pub number: i64,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    #[serde(rename = "_class", default)]
    pub class: String,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub buildable: bool,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub in_queue: bool,
    #[serde(default)]
    pub next_build_number: i64,
    #[serde(default)]
    pub last_build: Option<BuildRef>,
    #[serde(default)]
    pub builds: Vec<BuildRef>,
    /// Children, for folder-like jobs
    #[serde(default)]
    pub jobs: Vec<InnerJob>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderResponse {
    #[serde(rename = "_class", default)]
    pub class: String,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub jobs: Vec<InnerJob>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    pub number: i64,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    /// `SUCCESS`, `FAILURE`, `ABORTED`...; absent while building
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub building: bool,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub full_display_name: Option<String>,
}

impl BuildResponse {
    pub fn is_good(&self) -> bool {
        !self.building && self.result.as_deref() == Some("SUCCESS")
    }
}
