//! Service-account key loading.
//!
//! `GOOGLE_APPLICATION_CREDENTIALS` holds either a path to the downloaded key
//! file or the key JSON itself (as CI secrets usually do). A value naming an
//! existing file is treated as a path; anything else is parsed as JSON.

use std::path::Path;

use pipeline::SheetError;
use serde::Deserialize;

/// Default OAuth2 token endpoint for service accounts.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_owned()
}

/// The fields of a service-account key this adapter needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service-account identity, used as the assertion issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Token exchange endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Loads a key from a file path or inline JSON.
    pub fn load(value: &str) -> Result<Self, SheetError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SheetError::Credentials {
                message: "GOOGLE_APPLICATION_CREDENTIALS environment variable is required".into(),
            });
        }

        let path = Path::new(value);
        if path.is_file() {
            let raw = std::fs::read_to_string(path).map_err(|e| SheetError::Credentials {
                message: format!("failed to read credentials file: {e}"),
            })?;
            return Self::from_json(&raw);
        }
        Self::from_json(value)
    }

    /// Parses key JSON, requiring non-empty `client_email` and `private_key`.
    pub fn from_json(raw: &str) -> Result<Self, SheetError> {
        let key: Self = serde_json::from_str(raw).map_err(|e| SheetError::Credentials {
            message: format!("invalid GOOGLE_APPLICATION_CREDENTIALS JSON: {e}"),
        })?;
        if key.client_email.trim().is_empty() {
            return Err(SheetError::Credentials {
                message: "credentials do not contain client_email".into(),
            });
        }
        if key.private_key.trim().is_empty() {
            return Err(SheetError::Credentials {
                message: "credentials do not contain private_key".into(),
            });
        }
        Ok(key)
    }
}
