//! OpenRouter chat-completions backend (OpenAI-compatible wire format).

use std::time::Duration;

use pipeline::ProviderError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::backoff::parse_retry_after;
use crate::transport::{HttpReply, HttpRequest, HttpTransport, TransportError};
use crate::SYSTEM_INSTRUCTION;

/// OpenRouter chat-completions endpoint.
pub const ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model slug.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Default `HTTP-Referer` sent for OpenRouter app attribution.
pub const DEFAULT_REFERER: &str = "https://github.com/openrouter-sheets";

const APP_TITLE: &str = "Google Sheets OpenRouter Integration";
const TEMPERATURE: f64 = 0.3;

/// OpenRouter request builder and response parser.
#[derive(Debug)]
pub struct OpenRouter {
    api_key: SecretString,
    model: String,
    referer: String,
}

impl OpenRouter {
    /// Creates a backend, rejecting an empty key before any request is made.
    pub fn new(
        api_key: &str,
        model: impl Into<String>,
        referer: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::Configuration {
                message: "OPENROUTER_KEY is not set or empty".into(),
            });
        }
        Ok(Self {
            api_key: SecretString::from(api_key),
            model: model.into(),
            referer: referer.into(),
        })
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn request(&self, text: &str, prompt: &str) -> HttpRequest {
        HttpRequest {
            url: ENDPOINT.to_owned(),
            headers: vec![
                ("Authorization", format!("Bearer {}", self.api_key())),
                ("HTTP-Referer", self.referer.clone()),
                ("X-Title", APP_TITLE.to_owned()),
            ],
            body: json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": SYSTEM_INSTRUCTION },
                    { "role": "user", "content": format!("{prompt}\n\n{text}") },
                ],
                "temperature": TEMPERATURE,
            }),
        }
    }

    pub(crate) async fn send(
        &self,
        transport: &dyn HttpTransport,
        text: &str,
        prompt: &str,
    ) -> Result<HttpReply, TransportError> {
        transport.post_json(&self.request(text, prompt)).await
    }

    pub(crate) fn server_delay(&self, reply: &HttpReply) -> Option<Duration> {
        reply.retry_after.as_deref().and_then(parse_retry_after)
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Extracts `choices[0].message.content`, or `""` when absent or malformed.
pub(crate) fn extract_text(body: &str) -> String {
    serde_json::from_str::<ChatResponse>(body)
        .ok()
        .and_then(|r| r.choices.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_default()
}
