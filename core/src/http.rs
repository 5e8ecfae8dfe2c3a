//! HTTP request/response data and the executor seam.
//!
//! # Design
//! `Transport` builds `HttpRequest` values and interprets `HttpResponse`
//! values as plain data. The round-trip in between is delegated to an
//! `HttpExecutor`, so tests can script responses without a network and
//! callers can bring their own pre-configured agent.
//!
//! Executors must hand back every status as data. Only failures that left
//! no response at all are reported, as `NetworkError`.

use tracing::warn;

use crate::config::ClientConfig;
use crate::error::{NetworkError, NetworkErrorKind};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` carries no query string; `query` pairs are encoded by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value matching `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Headers are kept in arrival order; repeated names appear repeatedly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Performs one HTTP round-trip. No retries.
pub trait HttpExecutor: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError>;
}

/// Default executor backed by a blocking `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqExecutor {
    agent: ureq::Agent,
}

impl UreqExecutor {
    /// Agent honoring the configured overall and connect timeouts.
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout_limit())
            .timeout_connect(config.connect_timeout_limit())
            .build()
            .new_agent();
        Self { agent }
    }

    /// Wrap a pre-built agent. It must not treat HTTP statuses as errors.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl HttpExecutor for UreqExecutor {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        let url = request.url.as_str();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => decorate(self.agent.get(url), request).call(),
            (HttpMethod::Delete, _) => decorate(self.agent.delete(url), request).call(),
            (HttpMethod::Post, Some(body)) => {
                decorate(self.agent.post(url), request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => decorate(self.agent.post(url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                decorate(self.agent.put(url), request).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => decorate(self.agent.put(url), request).send_empty(),
        };

        let mut response = result.map_err(|e| to_network_error(&e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| to_network_error(&e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn decorate<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key.as_str(), value.as_str());
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn to_network_error(err: &ureq::Error) -> NetworkError {
    let kind = match err {
        ureq::Error::Timeout(_) => NetworkErrorKind::Timeout,
        ureq::Error::HostNotFound => NetworkErrorKind::Dns,
        ureq::Error::ConnectionFailed => NetworkErrorKind::Connect,
        ureq::Error::Io(_) => NetworkErrorKind::Io,
        _ => NetworkErrorKind::Other,
    };
    warn!(?kind, error = %err, "transport failure");
    NetworkError::new(kind, err.to_string())
}
