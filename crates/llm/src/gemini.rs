//! Google AI Studio (Gemini) `generateContent` backend.
//!
//! Requests go to the `v1` surface first. Some model slugs only exist on the
//! older `v1beta` surface, so a 400 or 404 from `v1` is followed by exactly
//! one `v1beta` request within the same attempt; its reply is what the retry
//! policy sees.

use std::time::Duration;

use pipeline::ProviderError;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::backoff::parse_proto_duration;
use crate::transport::{HttpReply, HttpRequest, HttpTransport, TransportError};
use crate::SYSTEM_INSTRUCTION;

/// API host.
pub const BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const RETRY_INFO_TYPE: &str = "google.rpc.RetryInfo";

/// Gemini request builder and response parser.
#[derive(Debug)]
pub struct Gemini {
    api_key: SecretString,
    model: String,
    base_url: Url,
}

impl Gemini {
    /// Creates a backend, rejecting an empty key before any request is made.
    pub fn new(api_key: &str, model: impl Into<String>) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::Configuration {
                message: "GOOGLE_AI_API_KEY is not set or empty".into(),
            });
        }
        let base_url = Url::parse(BASE_URL).map_err(|e| ProviderError::Configuration {
            message: format!("invalid Gemini base URL {BASE_URL}: {e}"),
        })?;
        Ok(Self {
            api_key: SecretString::from(api_key),
            model: model.into(),
            base_url,
        })
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    /// `{base}/{version}/models/{model}:generateContent`, with the model
    /// percent-encoded as a single path segment.
    fn endpoint(&self, version: &str) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(version)
                .push("models")
                .push(&format!("{}:generateContent", self.model));
        }
        url.into()
    }

    pub(crate) fn request(&self, version: &str, text: &str, prompt: &str) -> HttpRequest {
        HttpRequest {
            url: self.endpoint(version),
            headers: vec![("x-goog-api-key", self.api_key().to_owned())],
            body: json!({
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": format!("{SYSTEM_INSTRUCTION}\n\n{prompt}\n\n{text}") }],
                }],
            }),
        }
    }

    pub(crate) async fn send(
        &self,
        transport: &dyn HttpTransport,
        text: &str,
        prompt: &str,
    ) -> Result<HttpReply, TransportError> {
        let reply = transport.post_json(&self.request("v1", text, prompt)).await?;
        if matches!(reply.status, 400 | 404) {
            debug!(status = reply.status, model = %self.model, "v1 rejected model, retrying on v1beta");
            return transport.post_json(&self.request("v1beta", text, prompt)).await;
        }
        Ok(reply)
    }

    /// Reads `RetryInfo.retryDelay` from a structured error body.
    pub(crate) fn server_delay(&self, reply: &HttpReply) -> Option<Duration> {
        let envelope: ErrorEnvelope = serde_json::from_str(&reply.body).ok()?;
        envelope
            .error?
            .details
            .iter()
            .filter(|d| {
                d.get("@type")
                    .and_then(|t| t.as_str())
                    .is_some_and(|t| t.contains(RETRY_INFO_TYPE))
            })
            .find_map(|d| d.get("retryDelay").and_then(|v| v.as_str()))
            .and_then(parse_proto_duration)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Extracts `candidates[0].content.parts[0].text`, or `""` when absent.
pub(crate) fn extract_text(body: &str) -> String {
    serde_json::from_str::<GenerateResponse>(body)
        .ok()
        .and_then(|r| r.candidates.into_iter().next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .unwrap_or_default()
}
