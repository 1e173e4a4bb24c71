//! Error taxonomy and retry-policy types for the batch job.
//!
//! Three families of error exist:
//!
//! - [`ProviderError`] — one completion request failed. Inside a batch this is
//!   recoverable: the item degrades to an inline placeholder.
//! - [`SheetError`] — reading or writing the spreadsheet failed. Always fatal.
//! - [`JobError`] — conditions that stop the whole run before or during
//!   processing (bad configuration, invalid parameters, sheet failures).
//!
//! [`RetryPolicy`] is the cross-cutting classification every provider failure
//! maps onto; the retry loop in the `llm` crate consults it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    ///
    /// `after` optionally specifies the minimum delay before retrying (e.g.
    /// derived from a `Retry-After` header or a structured retry-info field).
    Retryable {
        /// Minimum back-off before the next attempt. `None` means apply the
        /// caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Unrecoverable failure of a single completion request.
///
/// Produced only after the retry loop has given up (or decided not to try).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// The provider credential is missing or empty. Raised before any request.
    #[error("provider configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The provider rejected the credential (HTTP 401). Never retried.
    #[error("{provider} auth error ({status}): {message}")]
    Auth {
        /// Display name of the provider family.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        message: String,
    },

    /// HTTP 429 persisted past the retry ceiling.
    #[error("Rate limit exceeded after {attempts} retries")]
    RateLimitExceeded {
        /// Number of retries performed before giving up.
        attempts: u32,
    },

    /// HTTP 5xx persisted past the retry ceiling.
    #[error("{provider} server error: {status} - {body}")]
    Server {
        /// Display name of the provider family.
        provider: String,
        /// HTTP status code of the last response.
        status: u16,
        /// Raw body of the last response.
        body: String,
    },

    /// No HTTP response was received, repeatedly, past the retry ceiling.
    #[error("network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// Any other non-success status. Never retried.
    #[error("{provider} API error: {status} - {body}")]
    Api {
        /// Display name of the provider family.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl ProviderError {
    /// Retry classification of the underlying condition.
    ///
    /// `RateLimitExceeded`, `Server`, and `Network` are transient. The retry
    /// loop in `llm` fills in `after` from the server's requested delay.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RateLimitExceeded { .. } | Self::Server { .. } | Self::Network { .. } => {
                RetryPolicy::Retryable { after: None }
            }
            Self::Configuration { .. } | Self::Auth { .. } | Self::Api { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Sheet errors
// ---------------------------------------------------------------------------

/// Failure talking to the spreadsheet service. Never retried internally.
#[derive(Debug, Error)]
pub enum SheetError {
    /// The service-account credential could not be loaded or parsed.
    #[error("invalid Google credentials: {message}")]
    Credentials {
        /// Description of the credential problem.
        message: String,
    },

    /// Exchanging the service-account assertion for an access token failed.
    #[error("Google auth failed: {message}")]
    Auth {
        /// Description of the token exchange failure.
        message: String,
    },

    /// Reading the source column failed.
    #[error("failed to read data from sheet: {message}")]
    Read {
        /// Description of the read failure.
        message: String,
    },

    /// Writing a result range failed.
    #[error("failed to write results to {range}: {message}")]
    Write {
        /// The A1 range that was being written.
        range: String,
        /// Description of the write failure.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Job errors
// ---------------------------------------------------------------------------

/// One rejected job parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Parameter name as it appears in the invocation payload.
    pub field: &'static str,
    /// Why the value was rejected.
    pub reason: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

/// Errors that stop the whole run.
#[derive(Debug, Error)]
pub enum JobError {
    /// Credentials or settings are missing or invalid.
    ///
    /// Raised before any network activity.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// One or more job parameters were invalid. All violations are reported
    /// together.
    #[error("validation failed:\n{}", format_violations(.violations))]
    Validation {
        /// Every rejected parameter.
        violations: Vec<Violation>,
    },

    /// The spreadsheet could not be read or written.
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

impl JobError {
    /// Returns `true` if `field` is among the validation violations.
    pub fn names_field(&self, field: &str) -> bool {
        match self {
            Self::Validation { violations } => violations.iter().any(|v| v.field == field),
            _ => false,
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}
