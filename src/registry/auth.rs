//! Bearer token negotiation for Docker Registry HTTP API v2
//!
//! The registry is probed without credentials. A `401` carrying a
//! `WWW-Authenticate: Bearer realm=...,service=...,scope=...` challenge is exchanged at the
//! realm for a token; a `Basic` challenge is reported as [`RegistryError::BasicAuthRequired`].

use crate::error::{RegistryError, Result};
use crate::registry::client::{Registry, expect_status, read_body};
use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::WWW_AUTHENTICATE;
use serde::Deserialize;
use std::sync::LazyLock;
use url::Url;

static BEARER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*Bearer\s+(.*)$").expect("valid bearer regex"));

static BASIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*Basic(\s+.*)?$").expect("valid basic regex"));

static GCR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://([a-z]+\.|)gcr\.io/").expect("valid gcr regex"));

/// Parameters of a bearer challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub realm: Url,
    pub service: String,
    pub scope: Vec<String>,
}

impl AuthChallenge {
    /// Token endpoint URL: the realm with `service` and one `scope` per scope appended
    pub fn token_url(&self) -> Url {
        let mut url = self.realm.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("service", &self.service);
            for scope in &self.scope {
                query.append_pair("scope", scope);
            }
        }
        url
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> String {
        match self.token {
            Some(token) if !token.is_empty() => token,
            _ => self.access_token.unwrap_or_default(),
        }
    }
}

/// Parse a `WWW-Authenticate` header value.
///
/// Parameter values may be quoted; commas inside quotes do not split parameters.
/// Unknown parameters are ignored.
pub fn parse_challenge(header: &str) -> Result<AuthChallenge> {
    if BASIC_REGEX.is_match(header) {
        return Err(RegistryError::BasicAuthRequired);
    }

    let params = BEARER_REGEX
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| RegistryError::MalformedChallenge(header.to_string()))?;

    let mut realm = None;
    let mut service = String::new();
    let mut scope = Vec::new();

    for param in split_params(params) {
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| RegistryError::MalformedChallenge(header.to_string()))?;
        let value = unquote(value.trim());
        match key.trim().to_ascii_lowercase().as_str() {
            "realm" => realm = Some(value),
            "service" => service = value,
            "scope" => scope = value.split_whitespace().map(str::to_string).collect(),
            _ => {}
        }
    }

    let realm = realm.ok_or_else(|| RegistryError::MalformedChallenge(header.to_string()))?;
    let realm = Url::parse(&realm)?;

    Ok(AuthChallenge {
        realm,
        service,
        scope,
    })
}

fn split_params(params: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in params.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&params[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&params[start..]);

    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

/// GCR answers 403 rather than 401 when credentials are missing
fn is_gcr_forbidden(status: StatusCode, url: &str) -> bool {
    status == StatusCode::FORBIDDEN && GCR_REGEX.is_match(url)
}

fn challenge_header(response: &reqwest::Response) -> Result<String> {
    response
        .headers()
        .get(WWW_AUTHENTICATE)
        .ok_or_else(|| RegistryError::MalformedChallenge(String::new()))?
        .to_str()
        .map(str::to_string)
        .map_err(|e| RegistryError::MalformedChallenge(e.to_string()))
}

impl Registry {
    /// Resolve a bearer token for `url`.
    ///
    /// An empty token means the registry serves `url` anonymously.
    pub async fn token(&self, url: &str) -> Result<String> {
        self.output.verbose(&format!("registry.token url={}", url));

        let response = self.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::OK {
            self.output.verbose("registry.token no authentication required");
            return Ok(String::new());
        }
        if is_gcr_forbidden(status, url) {
            return Err(RegistryError::BasicAuthRequired);
        }
        if status != StatusCode::UNAUTHORIZED {
            return Err(RegistryError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let challenge = parse_challenge(&challenge_header(&response)?)?;
        self.output.detail(&format!(
            "Auth challenge: realm={}, service={}, scope={:?}",
            challenge.realm, challenge.service, challenge.scope
        ));

        self.fetch_token(&challenge).await
    }

    async fn fetch_token(&self, challenge: &AuthChallenge) -> Result<String> {
        let token_url = challenge.token_url();
        let mut request = self.get(token_url.as_str());
        if self.has_credentials() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }

        let response = request.send().await?;
        expect_status(&response, token_url.as_str(), &[200])?;

        let body = read_body(response).await?;
        let token = serde_json::from_slice::<TokenResponse>(&body)?.into_token();
        if token.is_empty() {
            return Err(RegistryError::Auth("Auth token cannot be empty".to_string()));
        }

        self.output
            .detail(&format!("Token obtained (length: {} chars)", token.len()));
        Ok(token)
    }

    /// Check that the configured credentials are accepted by the registry
    pub async fn login(&self) -> Result<()> {
        let url = format!("{}/v2/", self.url);
        self.output.verbose(&format!("registry.login url={}", url));

        let response = self.get(&url).send().await?;
        match response.status() {
            StatusCode::OK => {
                self.output.success("Login Succeeded");
                Ok(())
            }
            StatusCode::UNAUTHORIZED => match parse_challenge(&challenge_header(&response)?) {
                Ok(challenge) => {
                    if !self.has_credentials() {
                        return Err(RegistryError::Auth(
                            "registry requires credentials".to_string(),
                        ));
                    }
                    match self.fetch_token(&challenge).await {
                        Ok(_) => {
                            self.output.success("Login Succeeded");
                            Ok(())
                        }
                        Err(RegistryError::UnexpectedStatus { status, .. }) => Err(
                            RegistryError::Auth(format!("login failed with status {}", status)),
                        ),
                        Err(e) => Err(e),
                    }
                }
                Err(RegistryError::BasicAuthRequired) => self.basic_login(&url).await,
                Err(e) => Err(e),
            },
            status => Err(RegistryError::Auth(format!(
                "login failed with status {}",
                status.as_u16()
            ))),
        }
    }

    async fn basic_login(&self, url: &str) -> Result<()> {
        if !self.has_credentials() {
            return Err(RegistryError::Auth(
                "registry requires credentials".to_string(),
            ));
        }

        let response = self
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if response.status() == StatusCode::OK {
            self.output.success("Login Succeeded");
            Ok(())
        } else {
            Err(RegistryError::Auth(format!(
                "login failed with status {}",
                response.status().as_u16()
            )))
        }
    }
}
