//! DevOps Clients Library
//!
//! Client side of a DevOps console: a Docker Registry HTTP API v2 client (bearer token
//! negotiation, manifest digests, config blobs), registry inspection driven by Kubernetes pull
//! secrets, and a Jenkins client for jobs, credentials, roles and script execution.

pub mod cli;
pub mod config;
pub mod devops;
pub mod error;
pub mod jenkins;
pub mod logging;
pub mod registries;
pub mod registry;

pub use config::AppConfig;
pub use error::{AppError, JenkinsError, JenkinsResult, RegistryError, Result};
pub use jenkins::Jenkins;
pub use logging::Logger;
pub use registry::{Image, Registry, RegistryOptions, parse_image};
