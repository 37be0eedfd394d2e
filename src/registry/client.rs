// Registry client: owns the HTTP transport, the normalized base URL and the
// credentials of one registry host, and builds Docker Registry API v2 URLs.

use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::image::Image;
use flate2::read::GzDecoder;
use reqwest::header::{ACCEPT, CONTENT_ENCODING};
use reqwest::{Client, RequestBuilder, Response};
use std::collections::BTreeMap;
use std::io::Read;
use std::time::Duration;

/// Canonical Docker Hub registry host
pub const DEFAULT_DOCKER_REGISTRY: &str = "https://registry-1.docker.io";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Docker image manifest, schema 2
pub const MEDIA_TYPE_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Registry credentials and the address of the server that issues tokens
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub server_address: String,
}

impl AuthConfig {
    /// Credentials are kept only when both username and password are set;
    /// otherwise the registry is used anonymously.
    pub fn new(username: &str, password: &str, registry: &str) -> Self {
        let server_address = default_registry(registry);
        if !username.is_empty() && !password.is_empty() {
            Self {
                username: username.to_string(),
                password: password.to_string(),
                server_address,
            }
        } else {
            Self {
                server_address,
                ..Self::default()
            }
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }
}

/// Options for a new registry client
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub domain: String,
    pub timeout: Duration,
    /// Extra headers sent with every registry request
    pub headers: BTreeMap<String, String>,
    pub use_ssl: bool,
    pub skip_tls: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            domain: String::new(),
            timeout: DEFAULT_TIMEOUT,
            headers: BTreeMap::new(),
            use_ssl: true,
            skip_tls: false,
        }
    }
}

impl RegistryOptions {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_use_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
}

/// Client for retrieving information from one registry's API
#[derive(Debug, Clone)]
pub struct Registry {
    /// Base URL including scheme, no trailing slash
    pub url: String,
    /// Base URL without scheme
    pub domain: String,
    pub username: String,
    pub password: String,
    pub options: RegistryOptions,
    pub(crate) client: Client,
    pub(crate) output: Logger,
}

impl Registry {
    /// Create a registry client from credentials and options.
    ///
    /// An empty or `docker.io` domain falls back to the auth server address.
    pub fn new(auth: AuthConfig, mut options: RegistryOptions, output: Logger) -> Result<Self> {
        if options.domain.is_empty() || options.domain == "docker.io" {
            options.domain = default_registry(&auth.server_address);
        }

        let url = normalize_url(&options.domain, options.use_ssl);
        let client = Client::builder().timeout(options.timeout);
        let client = if options.skip_tls {
            client
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
        } else {
            client
        }
        .build()?;

        Ok(Self {
            domain: strip_scheme(&url).to_string(),
            url,
            username: auth.username,
            password: auth.password,
            options,
            client,
            output: output.with_component("registry"),
        })
    }

    /// Create a client for `options.domain`, with tokens issued by `auth_url`
    /// (or by the registry itself when `auth_url` is empty).
    pub fn create(
        auth_url: &str,
        username: &str,
        password: &str,
        options: RegistryOptions,
        output: Logger,
    ) -> Result<Self> {
        let auth_domain = if auth_url.is_empty() {
            options.domain.as_str()
        } else {
            auth_url
        };
        let auth = AuthConfig::new(username, password, auth_domain);

        output.verbose(&format!("domain: {}", options.domain));
        output.verbose(&format!("server address: {}", auth.server_address));
        if !auth.has_credentials() {
            output.info(&format!(
                "Using registry {} with no authentication",
                auth.server_address
            ));
        }

        Self::new(auth, options, output)
    }

    pub fn digest_url(&self, image: &Image) -> String {
        self.url(&format!("/v2/{}/manifests/{}", image.path, image.reference()))
    }

    pub fn blob_url(&self, image: &Image) -> String {
        self.url(&format!("/v2/{}/blobs/{}", image.path, image.digest))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    pub(crate) fn has_credentials(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }

    /// GET with the configured extra headers
    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.options
            .headers
            .iter()
            .fold(self.client.get(url), |request, (name, value)| {
                request.header(name, value)
            })
    }

    /// GET for manifest-shaped resources; the bearer header is omitted for an empty token
    pub(crate) fn manifest_get(&self, url: &str, token: &str) -> RequestBuilder {
        let request = self.get(url).header(ACCEPT, MEDIA_TYPE_MANIFEST_V2);
        if token.is_empty() {
            request
        } else {
            request.bearer_auth(token)
        }
    }
}

/// Shorthand for [`Registry::create`] with default options for `domain`
pub fn create_registry_client(
    auth_url: &str,
    username: &str,
    password: &str,
    domain: &str,
    output: Logger,
) -> Result<Registry> {
    Registry::create(auth_url, username, password, RegistryOptions::new(domain), output)
}

/// Map an empty or `docker.io` address to the canonical Docker Hub host
pub fn default_registry(server_address: &str) -> String {
    if server_address.is_empty() || server_address == "docker.io" {
        DEFAULT_DOCKER_REGISTRY.to_string()
    } else {
        server_address.to_string()
    }
}

/// Trim a trailing slash and add a scheme when missing
pub fn normalize_url(address: &str, use_ssl: bool) -> String {
    let address = address.trim().trim_end_matches('/');
    if has_scheme(address) {
        address.to_string()
    } else if use_ssl {
        format!("https://{}", address)
    } else {
        format!("http://{}", address)
    }
}

fn has_scheme(address: &str) -> bool {
    address.starts_with("https://") || address.starts_with("http://")
}

fn strip_scheme(address: &str) -> &str {
    address
        .strip_prefix("https://")
        .or_else(|| address.strip_prefix("http://"))
        .unwrap_or(address)
}

/// Read a response body, transparently decompressing `Content-Encoding: gzip`
pub async fn read_body(response: Response) -> Result<Vec<u8>> {
    let encoding = response
        .headers()
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let raw = response.bytes().await?;
    decode_body(encoding.as_deref(), &raw)
}

pub fn decode_body(content_encoding: Option<&str>, raw: &[u8]) -> Result<Vec<u8>> {
    match content_encoding {
        Some(encoding) if encoding.trim().eq_ignore_ascii_case("gzip") => {
            let mut decoded = Vec::new();
            GzDecoder::new(raw).read_to_end(&mut decoded)?;
            Ok(decoded)
        }
        _ => Ok(raw.to_vec()),
    }
}

/// Reject anything but the listed statuses
pub(crate) fn expect_status(response: &Response, url: &str, accepted: &[u16]) -> Result<()> {
    let status = response.status().as_u16();
    if accepted.contains(&status) {
        Ok(())
    } else {
        Err(RegistryError::UnexpectedStatus {
            status,
            url: url.to_string(),
        })
    }
}
