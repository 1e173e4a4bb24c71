//! Cached, retrying completion client.
//!
//! [`LlmClient`] owns one [`Backend`] and implements
//! [`pipeline::CompletionProvider`]. Every call checks the shared
//! [`ResponseCache`] first; only successful completions are stored.
//!
//! ## Failure policy
//!
//! | Status | Policy |
//! |--------|--------|
//! | 401 | fatal, redacted key diagnostic logged |
//! | 429 | retry after `max(backoff, server delay)` |
//! | 5xx / no response | retry after `base × 2^attempt` |
//! | other non-2xx | fatal |

use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{CacheKey, CompletionProvider, ProviderError, ProviderKind, ResponseCache, RetryPolicy};
use tracing::{debug, error, warn};

use crate::backoff::RetrySchedule;
use crate::gemini::{self, Gemini};
use crate::openrouter::{self, OpenRouter};
use crate::transport::{HttpReply, HttpTransport, TransportError};

/// The closed set of provider backends, dispatched by enum.
#[derive(Debug)]
pub enum Backend {
    /// OpenRouter chat completions.
    OpenRouter(OpenRouter),
    /// Gemini `generateContent` with `v1beta` fallback.
    Gemini(Gemini),
}

impl Backend {
    /// Provider family of this backend.
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenRouter(_) => ProviderKind::OpenRouter,
            Self::Gemini(_) => ProviderKind::Gemini,
        }
    }

    /// Model sent with each request.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenRouter(b) => b.model(),
            Self::Gemini(b) => b.model(),
        }
    }

    fn api_key(&self) -> &str {
        match self {
            Self::OpenRouter(b) => b.api_key(),
            Self::Gemini(b) => b.api_key(),
        }
    }

    async fn send(
        &self,
        transport: &dyn HttpTransport,
        text: &str,
        prompt: &str,
    ) -> Result<HttpReply, TransportError> {
        match self {
            Self::OpenRouter(b) => b.send(transport, text, prompt).await,
            Self::Gemini(b) => b.send(transport, text, prompt).await,
        }
    }

    fn server_delay(&self, reply: &HttpReply) -> Option<std::time::Duration> {
        match self {
            Self::OpenRouter(b) => b.server_delay(reply),
            Self::Gemini(b) => b.server_delay(reply),
        }
    }

    fn extract_text(&self, body: &str) -> String {
        match self {
            Self::OpenRouter(_) => openrouter::extract_text(body),
            Self::Gemini(_) => gemini::extract_text(body),
        }
    }
}

/// Masks a credential for diagnostics: only a short prefix and suffix of a
/// long key survive.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 20 {
        return "***".to_owned();
    }
    let prefix: String = chars[..10].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}

/// Completion client with caching and bounded retries.
pub struct LlmClient {
    backend: Backend,
    transport: Arc<dyn HttpTransport>,
    cache: Arc<ResponseCache>,
    schedule: RetrySchedule,
}

impl LlmClient {
    /// Creates a client using the default retry schedule.
    pub fn new(backend: Backend, transport: Arc<dyn HttpTransport>, cache: Arc<ResponseCache>) -> Self {
        Self {
            backend,
            transport,
            cache,
            schedule: RetrySchedule::default(),
        }
    }

    /// Maps a non-2xx reply to the error surfaced if no retry happens.
    fn classify(&self, reply: &HttpReply) -> ProviderError {
        let provider = self.backend.kind().display_name().to_owned();
        match reply.status {
            401 => {
                let key = self.backend.api_key();
                error!(
                    provider = %provider,
                    status = reply.status,
                    response = %reply.body,
                    key_length = key.chars().count(),
                    key_preview = %mask_key(key),
                    "authorization rejected; check that the key is current, has no stray characters, and the account has credit"
                );
                ProviderError::Auth {
                    provider,
                    status: reply.status,
                    message: reply.body.clone(),
                }
            }
            429 => ProviderError::RateLimitExceeded {
                attempts: self.schedule.max_retries,
            },
            500..=599 => ProviderError::Server {
                provider,
                status: reply.status,
                body: reply.body.clone(),
            },
            status => ProviderError::Api {
                provider,
                status,
                body: reply.body.clone(),
            },
        }
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    fn kind(&self) -> ProviderKind {
        self.backend.kind()
    }

    fn model(&self) -> &str {
        self.backend.model()
    }

    async fn complete(&self, text: &str, prompt: &str) -> Result<String, ProviderError> {
        let key = CacheKey::new(self.backend.kind(), prompt, text);
        if let Some(hit) = self.cache.get(&key) {
            let preview: String = text.chars().take(50).collect();
            debug!(provider = %self.backend.kind(), text = %preview, "cache hit");
            return Ok(hit);
        }

        let mut attempt = 0;
        loop {
            let (failure, server_delay) =
                match self.backend.send(&*self.transport, text, prompt).await {
                    Ok(reply) if reply.is_success() => {
                        let result = self.backend.extract_text(&reply.body);
                        self.cache.set(key, result.clone());
                        return Ok(result);
                    }
                    Ok(reply) => {
                        let server_delay = if reply.status == 429 {
                            self.backend.server_delay(&reply)
                        } else {
                            None
                        };
                        (self.classify(&reply), server_delay)
                    }
                    Err(err) => (ProviderError::Network { message: err.0 }, None),
                };

            let policy = match failure.retry_policy() {
                RetryPolicy::Retryable { .. } => RetryPolicy::Retryable {
                    after: server_delay,
                },
                RetryPolicy::NonRetryable => RetryPolicy::NonRetryable,
            };
            match policy {
                RetryPolicy::Retryable { after } if attempt < self.schedule.max_retries => {
                    let delay = self.schedule.delay(attempt, after);
                    warn!(
                        provider = %self.backend.kind(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        reason = %failure,
                        "retrying completion request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                _ => return Err(failure),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_keys_keep_prefix_and_suffix() {
        assert_eq!(
            mask_key("sk-or-v1-0123456789abcdefWXYZ"),
            "sk-or-v1-0...WXYZ"
        );
    }

    #[test]
    fn short_keys_are_fully_masked() {
        assert_eq!(mask_key("sk-short"), "***");
    }
}
