//! Environment configuration.
//!
//! [`Config::from_lookup`] is a pure function over a key lookup so parsing
//! rules can be tested without touching the process environment.

use std::time::Duration;

use batch::{DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, DEFAULT_INTERVAL};
use llm::{gemini, openrouter, ProviderSettings};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// A configuration value could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric option held something other than a valid number.
    #[error("{key} must be {expected} (got {value:?})")]
    InvalidNumber {
        /// Environment key.
        key: &'static str,
        /// What was expected.
        expected: &'static str,
        /// The raw value.
        value: String,
    },
}

/// Everything the job reads from the environment.
#[derive(Debug)]
pub struct Config {
    /// Provider credentials and models.
    pub providers: ProviderSettings,
    /// Raw `GOOGLE_APPLICATION_CREDENTIALS` (path or inline JSON).
    pub google_credentials: Option<SecretString>,
    /// Rows per batch.
    pub batch_size: usize,
    /// Workers per batch.
    pub concurrency: usize,
    /// Per-worker pause between LLM requests.
    pub request_interval: Duration,
}

/// Trims a credential and strips quotes pasted around it by accident.
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_owned()
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let credential = |raw: Option<String>| {
            raw.map(|v| normalize_key(&v))
                .filter(|v| !v.is_empty())
                .map(|v| SecretString::from(v.as_str()))
        };

        let providers = ProviderSettings {
            openrouter_key: credential(
                lookup("OPENROUTER_KEY").or_else(|| lookup("OPENROUTER_API_KEY")),
            ),
            gemini_key: credential(lookup("GOOGLE_AI_API_KEY")),
            openrouter_model: non_empty("OPENROUTER_MODEL")
                .unwrap_or_else(|| openrouter::DEFAULT_MODEL.to_owned()),
            gemini_model: non_empty("GEMINI_MODEL")
                .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_owned()),
            referer: non_empty("HTTP_REFERER")
                .unwrap_or_else(|| openrouter::DEFAULT_REFERER.to_owned()),
        };

        let batch_size = match non_empty("BATCH_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or(ConfigError::InvalidNumber {
                    key: "BATCH_SIZE",
                    expected: "an integer >= 1",
                    value: raw,
                })?,
            None => DEFAULT_BATCH_SIZE,
        };

        let concurrency = match non_empty("LLM_CONCURRENCY") {
            Some(raw) => {
                let n = raw.trim().parse::<i64>().map_err(|_| ConfigError::InvalidNumber {
                    key: "LLM_CONCURRENCY",
                    expected: "an integer",
                    value: raw.clone(),
                })?;
                usize::try_from(n.max(1)).unwrap_or(DEFAULT_CONCURRENCY)
            }
            None => DEFAULT_CONCURRENCY,
        };

        let request_interval = match non_empty("LLM_REQUEST_INTERVAL_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidNumber {
                    key: "LLM_REQUEST_INTERVAL_MS",
                    expected: "a non-negative number of milliseconds",
                    value: raw.clone(),
                })?,
            None => DEFAULT_INTERVAL,
        };

        Ok(Self {
            providers,
            google_credentials: non_empty("GOOGLE_APPLICATION_CREDENTIALS")
                .map(|v| SecretString::from(v.as_str())),
            batch_size,
            concurrency,
            request_interval,
        })
    }
}

/// Returns the first characters of an OpenRouter key that lacks the usual
/// `sk-` prefix, for a warning. `None` when the key looks normal or Gemini is
/// in use.
pub fn unexpected_key_prefix(providers: &ProviderSettings) -> Option<String> {
    if providers.gemini_key.is_some() {
        return None;
    }
    let key = providers.openrouter_key.as_ref()?.expose_secret();
    if key.starts_with("sk-") {
        None
    } else {
        Some(key.chars().take(4).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn exposed(key: &Option<SecretString>) -> Option<&str> {
        key.as_ref().map(|k| k.expose_secret())
    }

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.batch_size, 20);
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.request_interval, Duration::from_millis(6500));
        assert_eq!(cfg.providers.openrouter_model, "openai/gpt-4o-mini");
        assert_eq!(cfg.providers.gemini_model, "gemini-2.5-flash");
        assert!(cfg.providers.openrouter_key.is_none());
        assert!(cfg.google_credentials.is_none());
    }

    #[test]
    fn keys_are_trimmed_and_unquoted() {
        let cfg = config(&[
            ("OPENROUTER_API_KEY", "  \"sk-or-v1-abc\" "),
            ("GOOGLE_AI_API_KEY", "'AIza123'"),
        ])
        .unwrap();
        assert_eq!(exposed(&cfg.providers.openrouter_key), Some("sk-or-v1-abc"));
        assert_eq!(exposed(&cfg.providers.gemini_key), Some("AIza123"));
    }

    #[test]
    fn openrouter_key_takes_precedence_over_alias() {
        let cfg = config(&[
            ("OPENROUTER_KEY", "sk-primary"),
            ("OPENROUTER_API_KEY", "sk-alias"),
        ])
        .unwrap();
        assert_eq!(exposed(&cfg.providers.openrouter_key), Some("sk-primary"));
    }

    #[test]
    fn quote_only_key_counts_as_missing() {
        let cfg = config(&[("OPENROUTER_KEY", "\"\"")]).unwrap();
        assert!(cfg.providers.openrouter_key.is_none());
    }

    #[test]
    fn debug_output_hides_credentials() {
        let cfg = config(&[
            ("OPENROUTER_KEY", "sk-or-v1-SECRET"),
            ("GOOGLE_APPLICATION_CREDENTIALS", r#"{"private_key":"SECRET"}"#),
        ])
        .unwrap();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("SECRET"), "{printed}");
        assert!(exposed(&cfg.google_credentials).is_some_and(|v| v.contains("private_key")));
    }

    #[test]
    fn numeric_options_are_parsed() {
        let cfg = config(&[
            ("BATCH_SIZE", "5"),
            ("LLM_CONCURRENCY", "0"),
            ("LLM_REQUEST_INTERVAL_MS", "250"),
        ])
        .unwrap();
        assert_eq!(cfg.batch_size, 5);
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.request_interval, Duration::from_millis(250));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = config(&[("BATCH_SIZE", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "BATCH_SIZE", .. }));
        let err = config(&[("LLM_REQUEST_INTERVAL_MS", "soon")]).unwrap_err();
        assert!(err.to_string().starts_with("LLM_REQUEST_INTERVAL_MS must be"));
    }

    #[test]
    fn prefix_warning_only_for_unusual_openrouter_keys() {
        let mut providers = ProviderSettings {
            openrouter_key: Some(SecretString::from("abcd-1234")),
            ..ProviderSettings::default()
        };
        assert_eq!(unexpected_key_prefix(&providers).as_deref(), Some("abcd"));
        providers.openrouter_key = Some(SecretString::from("sk-or-v1-1234"));
        assert_eq!(unexpected_key_prefix(&providers), None);
        providers.openrouter_key = Some(SecretString::from("abcd"));
        providers.gemini_key = Some(SecretString::from("AIza"));
        assert_eq!(unexpected_key_prefix(&providers), None);
    }
}
