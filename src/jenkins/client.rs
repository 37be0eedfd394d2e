//! Jenkins API client: connection check, folders, jobs, builds and script execution

use crate::error::{JenkinsError, JenkinsResult};
use crate::jenkins::requester::{JenkinsConfig, Requester};
use crate::jenkins::types::{BuildResponse, ExecutorResponse, FolderResponse, JobResponse};
use crate::logging::Logger;
use regex::Regex;
use reqwest::header::LOCATION;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const FOLDER_MODE: &str = "com.cloudbees.hudson.plugins.folder.Folder";

static QUEUE_ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/queue/item/(\d+)/?").expect("valid queue item regex"));

/// Arguments of [`Jenkins::create_job`]
#[derive(Debug, Clone, Default)]
pub struct CreateJobOptions {
    pub name: String,
    /// Job `config.xml`
    pub config: String,
    /// Enclosing folders, outermost first
    pub parents: Vec<String>,
}

impl CreateJobOptions {
    pub fn new(name: &str, config: &str) -> Self {
        Self {
            name: name.to_string(),
            config: config.to_string(),
            parents: Vec::new(),
        }
    }

    pub fn in_folder(mut self, folder: &str) -> Self {
        self.parents.push(folder.to_string());
        self
    }
}

/// Arguments of [`Jenkins::build_job`]
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub parameters: Option<BTreeMap<String, String>>,
}

impl BuildOptions {
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }
}

/// `/job/a/job/b` for a list of folders
pub fn folder_path<S: AsRef<str>>(parents: &[S]) -> String {
    parents
        .iter()
        .map(|p| format!("/job/{}", p.as_ref()))
        .collect()
}

/// Path of `name` inside `parents`
pub fn job_path<S: AsRef<str>>(parents: &[S], name: &str) -> String {
    format!("{}/job/{}", folder_path(parents), name)
}

/// Path of a `folder/job` style full name
pub fn encode_job_name(full_name: &str) -> String {
    let parts: Vec<&str> = full_name.split('/').filter(|p| !p.is_empty()).collect();
    folder_path(&parts)
}

/// Queue item id from the `Location` header of a build trigger
pub fn parse_queue_id(location: &str) -> Option<i64> {
    QUEUE_ITEM_REGEX
        .captures(location)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Client for one Jenkins server
#[derive(Debug, Clone)]
pub struct Jenkins {
    pub server: String,
    /// Server version from the `X-Jenkins` header, set by [`Jenkins::init`]
    pub version: String,
    pub raw: ExecutorResponse,
    pub(crate) requester: Requester,
    pub(crate) output: Logger,
}

impl Jenkins {
    pub fn new(config: &JenkinsConfig, output: Logger) -> JenkinsResult<Self> {
        let output = output.with_component("jenkins");
        let requester = Requester::new(config, output.clone())?;
        Ok(Self {
            server: requester.base_url().to_string(),
            version: String::new(),
            raw: ExecutorResponse::default(),
            requester,
            output,
        })
    }

    /// Check the connection and record the server version
    pub async fn init(mut self) -> JenkinsResult<Self> {
        let response = self.requester.get_json("/", &[]).await?.ensure_ok()?;
        self.version = response.header("X-Jenkins").unwrap_or_default().to_string();
        self.raw = response.json()?;
        self.output.info(&format!(
            "Connected to Jenkins {} at {}",
            self.version, self.server
        ));
        Ok(self)
    }

    /// Free request slots of the connection gate
    pub fn available_connections(&self) -> usize {
        self.requester.available_connections()
    }

    /// Status of `/api/json`
    pub async fn poll(&self) -> JenkinsResult<u16> {
        Ok(self.requester.get_json("/", &[]).await?.status)
    }

    pub async fn create_folder(
        &self,
        name: &str,
        description: &str,
        parents: &[&str],
    ) -> JenkinsResult<FolderResponse> {
        let json = serde_json::json!({
            "name": name,
            "mode": FOLDER_MODE,
            "description": description,
        })
        .to_string();

        self.requester
            .post_form(
                &format!("{}/createItem", folder_path(parents)),
                &[],
                &[
                    ("name", name),
                    ("mode", FOLDER_MODE),
                    ("Submit", "OK"),
                    ("json", json.as_str()),
                ],
            )
            .await?
            .ensure_ok()?;

        self.output.verbose(&format!("Created folder {}", name));
        self.get_folder(name, parents).await
    }

    pub async fn create_job(&self, options: &CreateJobOptions) -> JenkinsResult<JobResponse> {
        if options.name.is_empty() {
            return Err(JenkinsError::Validation(
                "Error Creating Job, job name is missing".to_string(),
            ));
        }

        self.requester
            .post_xml(
                &format!("{}/createItem", folder_path(options.parents.as_slice())),
                &[("name", options.name.as_str())],
                &options.config,
            )
            .await?
            .ensure_ok()?;

        self.output.verbose(&format!("Created job {}", options.name));
        self.get_job(&options.name, options.parents.as_slice()).await
    }

    pub async fn rename_job(&self, job: &str, new_name: &str) -> JenkinsResult<()> {
        self.requester
            .post_form(
                &format!("{}/doRename", encode_job_name(job)),
                &[("newName", new_name)],
                &[],
            )
            .await?
            .ensure_ok()?;
        Ok(())
    }

    /// Copy `copy_from` to a new top-level job; the source must exist
    pub async fn copy_job(&self, copy_from: &str, new_name: &str) -> JenkinsResult<JobResponse> {
        let no_parents: [&str; 0] = [];
        self.get_job(copy_from, &no_parents).await?;

        self.requester
            .post_form(
                "/createItem",
                &[("name", new_name), ("mode", "copy"), ("from", copy_from)],
                &[],
            )
            .await?
            .ensure_ok()?;

        self.get_job(new_name, &no_parents).await
    }

    pub async fn delete_job(&self, name: &str, parents: &[&str]) -> JenkinsResult<()> {
        self.requester
            .post_form(&format!("{}/doDelete", job_path(parents, name)), &[], &[])
            .await?
            .ensure_ok()?;
        self.output.verbose(&format!("Deleted job {}", name));
        Ok(())
    }

    /// Trigger a build of `name` (a `folder/job` full name); returns the queue item id
    pub async fn build_job(&self, name: &str, options: &BuildOptions) -> JenkinsResult<i64> {
        let (endpoint, query): (&str, Vec<(&str, &str)>) = match &options.parameters {
            Some(parameters) if !parameters.is_empty() => (
                "buildWithParameters",
                parameters
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect(),
            ),
            _ => ("build", Vec::new()),
        };

        let response = self
            .requester
            .post_form(
                &format!("{}/{}", encode_job_name(name), endpoint),
                &query,
                &[],
            )
            .await?;
        if response.status != 200 && response.status != 201 {
            return Err(JenkinsError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let location = response.header(LOCATION.as_str()).unwrap_or_default();
        parse_queue_id(location).ok_or_else(|| {
            JenkinsError::NotFound(format!("queue item for build of {}", name))
        })
    }

    pub async fn get_job<S: AsRef<str>>(
        &self,
        id: &str,
        parents: &[S],
    ) -> JenkinsResult<JobResponse> {
        self.requester
            .get_json(&job_path(parents, id), &[])
            .await?
            .ensure_ok()?
            .json()
    }

    pub async fn get_folder(&self, id: &str, parents: &[&str]) -> JenkinsResult<FolderResponse> {
        self.requester
            .get_json(&job_path(parents, id), &[])
            .await?
            .ensure_ok()?
            .json()
    }

    /// Build `number` of `job` (a `folder/job` full name)
    pub async fn get_build(&self, job: &str, number: i64) -> JenkinsResult<BuildResponse> {
        self.requester
            .get_json(&format!("{}/{}", encode_job_name(job), number), &[])
            .await?
            .ensure_ok()?
            .json()
    }

    /// Run a Groovy script in the script console and return its output
    pub async fn execute_script(&self, script: &str) -> JenkinsResult<String> {
        let response = self
            .requester
            .post_form("/scriptText", &[], &[("script", script)])
            .await?
            .ensure_ok()?;
        Ok(response.body)
    }
}
