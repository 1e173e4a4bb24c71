//! Provider selection from configured credentials.

use std::sync::Arc;

use pipeline::{ProviderError, ProviderKind, ResponseCache};
use secrecy::{ExposeSecret, SecretString};

use crate::client::{Backend, LlmClient};
use crate::gemini::{self, Gemini};
use crate::openrouter::{self, OpenRouter};
use crate::transport::HttpTransport;

/// Credentials and model choices for both provider families.
#[derive(Debug)]
pub struct ProviderSettings {
    /// OpenRouter key, already normalised (trimmed, quotes stripped).
    pub openrouter_key: Option<SecretString>,
    /// Gemini key, already normalised.
    pub gemini_key: Option<SecretString>,
    /// Model slug for OpenRouter.
    pub openrouter_model: String,
    /// Model name for Gemini.
    pub gemini_model: String,
    /// `HTTP-Referer` value for OpenRouter.
    pub referer: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openrouter_key: None,
            gemini_key: None,
            openrouter_model: openrouter::DEFAULT_MODEL.to_owned(),
            gemini_model: gemini::DEFAULT_MODEL.to_owned(),
            referer: openrouter::DEFAULT_REFERER.to_owned(),
        }
    }
}

fn present(key: &Option<SecretString>) -> Option<&str> {
    key.as_ref()
        .map(|k| k.expose_secret())
        .filter(|k| !k.trim().is_empty())
}

/// Picks the provider family: Gemini when its key is present, otherwise
/// OpenRouter, otherwise a configuration error.
pub fn select_provider(settings: &ProviderSettings) -> Result<ProviderKind, ProviderError> {
    if present(&settings.gemini_key).is_some() {
        Ok(ProviderKind::Gemini)
    } else if present(&settings.openrouter_key).is_some() {
        Ok(ProviderKind::OpenRouter)
    } else {
        Err(ProviderError::Configuration {
            message: "at least one key is required: GOOGLE_AI_API_KEY (Gemini) or OPENROUTER_KEY"
                .into(),
        })
    }
}

/// Builds the backend chosen by [`select_provider`].
pub fn build_backend(settings: &ProviderSettings) -> Result<Backend, ProviderError> {
    let backend = match select_provider(settings)? {
        ProviderKind::Gemini => Backend::Gemini(Gemini::new(
            present(&settings.gemini_key).unwrap_or_default(),
            settings.gemini_model.as_str(),
        )?),
        ProviderKind::OpenRouter => Backend::OpenRouter(OpenRouter::new(
            present(&settings.openrouter_key).unwrap_or_default(),
            settings.openrouter_model.as_str(),
            settings.referer.as_str(),
        )?),
    };
    Ok(backend)
}

/// Builds a ready-to-use client for the selected provider.
pub fn build_client(
    settings: &ProviderSettings,
    transport: Arc<dyn HttpTransport>,
    cache: Arc<ResponseCache>,
) -> Result<LlmClient, ProviderError> {
    Ok(LlmClient::new(build_backend(settings)?, transport, cache))
}
