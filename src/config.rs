//! Configuration shared by the registry and Jenkins clients

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Per-request timeout in seconds
    pub timeout: u64,
    pub use_ssl: bool,
    pub skip_tls: bool,
    pub verbose: bool,
    pub jenkins_max_connections: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            use_ssl: true,
            skip_tls: false,
            verbose: false,
            jenkins_max_connections: 10,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            return Err(RegistryError::Validation(
                "timeout must be greater than 0".to_string(),
            ));
        }
        if self.jenkins_max_connections == 0 {
            return Err(RegistryError::Validation(
                "jenkins_max_connections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Create config from environment variables and defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(timeout) = lookup("DEVOPS_CLIENT_TIMEOUT").and_then(|v| v.parse().ok()) {
            config.timeout = timeout;
        }
        if let Some(val) = lookup("DEVOPS_CLIENT_USE_SSL") {
            config.use_ssl = parse_flag(&val);
        }
        if let Some(val) = lookup("DEVOPS_CLIENT_SKIP_TLS") {
            config.skip_tls = parse_flag(&val);
        }
        if let Some(val) = lookup("DEVOPS_CLIENT_VERBOSE") {
            config.verbose = parse_flag(&val);
        }
        if let Some(max) = lookup("DEVOPS_CLIENT_JENKINS_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            config.jenkins_max_connections = max;
        }

        config
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}
