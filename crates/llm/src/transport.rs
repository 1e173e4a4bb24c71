//! HTTP transport seam for provider backends.
//!
//! Backends describe a request as an [`HttpRequest`] and interpret the
//! [`HttpReply`]; they never touch `reqwest` directly. [`ReqwestTransport`] is
//! the production implementation, tests substitute a scripted one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use thiserror::Error;

/// Per-request timeout applied by [`ReqwestTransport`].
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A JSON `POST` request.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    /// Absolute endpoint URL.
    pub url: String,
    /// Extra request headers (content type is always JSON).
    pub headers: Vec<(&'static str, String)>,
    /// JSON body.
    pub body: serde_json::Value,
}

impl std::fmt::Debug for HttpRequest {
    // Header values carry credentials; only their names are printed.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.headers.iter().map(|(name, _)| *name).collect();
        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("headers", &names)
            .field("body", &self.body)
            .finish()
    }
}

/// The parts of an HTTP response the retry policy needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Raw `Retry-After` header value, if present.
    pub retry_after: Option<String>,
    /// Response body text.
    pub body: String,
}

impl HttpReply {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// No HTTP response was obtained (connect failure, timeout, broken body).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Sends JSON requests on behalf of a provider backend.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs one `POST`. Non-2xx statuses are returned as `Ok`.
    async fn post_json(&self, request: &HttpRequest) -> Result<HttpReply, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a client with the standard timeout and user agent.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sheetllm/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        let mut builder = self
            .client
            .post(&request.url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpReply {
            status,
            retry_after,
            body,
        })
    }
}
