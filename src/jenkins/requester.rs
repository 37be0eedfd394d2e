//! HTTP plumbing for the Jenkins client
//!
//! Every exchange with the server holds one permit of a fixed-size [`Semaphore`] from sending
//! the request until the body has been read, so at most `max_connections` requests are in
//! flight at any time. POSTs carry a CSRF crumb when the server issues one.

use crate::error::{JenkinsError, JenkinsResult};
use crate::logging::Logger;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// Connection settings for a Jenkins server
#[derive(Debug, Clone)]
pub struct JenkinsConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Upper bound of simultaneous requests to the server
    pub max_connections: usize,
    pub timeout: Duration,
    pub skip_tls: bool,
}

impl JenkinsConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            username: String::new(),
            password: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            timeout: Duration::from_secs(30),
            skip_tls: false,
        }
    }

    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }
}

/// A fully read Jenkins response
#[derive(Debug, Clone)]
pub struct JenkinsResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl JenkinsResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Fail with [`JenkinsError::Status`] unless the status is 200
    pub fn ensure_ok(self) -> JenkinsResult<Self> {
        if self.status == 200 {
            Ok(self)
        } else {
            Err(JenkinsError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> JenkinsResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Crumb {
    crumb: String,
    crumb_request_field: String,
}

#[derive(Debug, Clone)]
struct BasicAuth {
    username: String,
    password: String,
}

#[derive(Debug, Clone)]
pub struct Requester {
    base: String,
    auth: Option<BasicAuth>,
    client: Client,
    gate: Arc<Semaphore>,
    output: Logger,
}

impl Requester {
    pub fn new(config: &JenkinsConfig, output: Logger) -> JenkinsResult<Self> {
        if config.max_connections == 0 {
            return Err(JenkinsError::Validation(
                "max_connections must be greater than 0".to_string(),
            ));
        }

        let client = Client::builder().timeout(config.timeout);
        let client = if config.skip_tls {
            client.danger_accept_invalid_certs(true)
        } else {
            client
        }
        .build()?;

        let auth = if config.username.is_empty() && config.password.is_empty() {
            None
        } else {
            Some(BasicAuth {
                username: config.username.clone(),
                password: config.password.clone(),
            })
        };

        Ok(Self {
            base: config.base_url.trim_end_matches('/').to_string(),
            auth,
            client,
            gate: Arc::new(Semaphore::new(config.max_connections)),
            output,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Free connection slots right now
    pub fn available_connections(&self) -> usize {
        self.gate.available_permits()
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{}", self.base, endpoint));
        match &self.auth {
            Some(auth) => request.basic_auth(&auth.username, Some(&auth.password)),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> JenkinsResult<JenkinsResponse> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| JenkinsError::Unavailable(e.to_string()))?;

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(JenkinsResponse {
            status,
            headers,
            body,
        })
    }

    pub async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> JenkinsResult<JenkinsResponse> {
        self.output.verbose(&format!("jenkins GET {}", endpoint));
        self.execute(self.request(Method::GET, endpoint).query(query))
            .await
    }

    /// GET `{endpoint}/api/json`
    pub async fn get_json(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> JenkinsResult<JenkinsResponse> {
        let endpoint = format!("{}/api/json", endpoint.trim_end_matches('/'));
        self.get(&endpoint, query).await
    }

    async fn crumb(&self) -> JenkinsResult<Option<Crumb>> {
        let response = self.get_json("/crumbIssuer", &[]).await?;
        match response.status {
            // CSRF protection disabled
            404 => Ok(None),
            _ => Ok(Some(response.ensure_ok()?.json()?)),
        }
    }

    async fn post(&self, endpoint: &str, query: &[(&str, &str)]) -> JenkinsResult<RequestBuilder> {
        let request = self.request(Method::POST, endpoint).query(query);
        Ok(match self.crumb().await? {
            Some(crumb) => request.header(crumb.crumb_request_field, crumb.crumb),
            None => request,
        })
    }

    /// POST url-encoded `form`
    pub async fn post_form(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
        form: &[(&str, &str)],
    ) -> JenkinsResult<JenkinsResponse> {
        self.output.verbose(&format!("jenkins POST {}", endpoint));
        let request = self.post(endpoint, query).await?.form(form);
        self.execute(request).await
    }

    /// POST an XML document
    pub async fn post_xml(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
        xml: &str,
    ) -> JenkinsResult<JenkinsResponse> {
        self.output.verbose(&format!("jenkins POST {} (xml)", endpoint));
        let request = self
            .post(endpoint, query)
            .await?
            .header(CONTENT_TYPE, "application/xml")
            .body(xml.to_string());
        self.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_connections_rejected() {
        let config = JenkinsConfig::new("http://jenkins.local").with_max_connections(0);
        assert!(matches!(
            Requester::new(&config, Logger::new_quiet()),
            Err(JenkinsError::Validation(_))
        ));
    }

    #[test]
    fn test_base_url_trimmed() {
        let config = JenkinsConfig::new("http://jenkins.local:8080/").with_max_connections(3);
        let requester = Requester::new(&config, Logger::new_quiet()).unwrap();
        assert_eq!(requester.base_url(), "http://jenkins.local:8080");
        assert_eq!(requester.available_connections(), 3);
    }

    #[test]
    fn test_ensure_ok() {
        let response = JenkinsResponse {
            status: 403,
            headers: HeaderMap::new(),
            body: "denied".to_string(),
        };
        match response.ensure_ok() {
            Err(JenkinsError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "denied");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
