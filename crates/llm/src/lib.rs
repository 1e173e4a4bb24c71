//! LLM provider infrastructure adapter.
//!
//! Implements the [`pipeline::CompletionProvider`] trait for OpenRouter and
//! Google AI Studio (Gemini). Further providers are added as new [`Backend`]
//! variants without any changes to the `pipeline` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, request formatting, response
//! parsing, retry-delay extraction, and exponential back-off live here. The
//! [`pipeline`] crate sees only [`pipeline::CompletionProvider`].

pub mod backoff;
pub mod client;
pub mod gemini;
pub mod openrouter;
pub mod select;
pub mod transport;

pub use backoff::RetrySchedule;
pub use client::{mask_key, Backend, LlmClient};
pub use gemini::Gemini;
pub use openrouter::OpenRouter;
pub use select::{build_backend, build_client, select_provider, ProviderSettings};
pub use transport::{HttpReply, HttpRequest, HttpTransport, ReqwestTransport, TransportError};

/// Fixed system instruction sent ahead of every prompt.
pub const SYSTEM_INSTRUCTION: &str = "You analyze news. Answer briefly and precisely.";
