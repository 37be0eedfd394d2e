//! Error types for registry and Jenkins operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

pub type JenkinsResult<T> = std::result::Result<T, JenkinsError>;

/// Any failure surfaced by the command line tool
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Jenkins(#[from] JenkinsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Transport level failure, propagated as-is
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The registry answered with a status the operation does not accept
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The registry asked for HTTP Basic instead of a bearer token
    #[error("basic auth required")]
    BasicAuthRequired,

    #[error("Malformed auth challenge header: '{0}'")]
    MalformedChallenge(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Pull secret is unusable
    #[error("Secret error: {0}")]
    Secret(String),
}

impl From<url::ParseError> for RegistryError {
    fn from(err: url::ParseError) -> Self {
        RegistryError::Validation(err.to_string())
    }
}

impl RegistryError {
    pub fn is_basic_auth_required(&self) -> bool {
        matches!(self, RegistryError::BasicAuthRequired)
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistryError::UnexpectedStatus { status, .. } => Some(*status),
            RegistryError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum JenkinsError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Jenkins answered with a non-success status
    #[error("Jenkins returned status {status}")]
    Status { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The connection gate was closed
    #[error("Jenkins unavailable: {0}")]
    Unavailable(String),
}

impl JenkinsError {
    /// Status code a caller should surface for this error
    pub fn status_code(&self) -> u16 {
        match self {
            JenkinsError::Status { status, .. } => *status,
            JenkinsError::Validation(_) => 400,
            JenkinsError::NotFound(_) => 404,
            JenkinsError::Network(err) => err.status().map(|s| s.as_u16()).unwrap_or(503),
            JenkinsError::Unavailable(_) => 503,
            JenkinsError::Parse(_) => 500,
        }
    }
}
