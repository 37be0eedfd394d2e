//! Jenkins client used by the DevOps console
//!
//! Requests go through a [`Requester`] that bounds the number of simultaneous connections and
//! attaches CSRF crumbs to POSTs.

pub mod client;
pub mod credentials;
pub mod requester;
pub mod roles;
pub mod types;

pub use client::{BuildOptions, CreateJobOptions, Jenkins, encode_job_name, job_path};
pub use credentials::Credential;
pub use requester::{JenkinsConfig, JenkinsResponse, Requester};
pub use roles::{GlobalPermissionIds, GlobalRole, ProjectPermissionIds, ProjectRole, RoleType};
pub use types::{BuildResponse, ExecutorResponse, FolderResponse, JobResponse};
