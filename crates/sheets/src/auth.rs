//! OAuth2 access tokens for a service account (JWT-bearer grant).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use pipeline::SheetError;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::credentials::ServiceAccountKey;

/// OAuth scope granting read/write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now
    }
}

/// Exchanges signed assertions for access tokens and caches the result.
pub struct TokenSource {
    key: ServiceAccountKey,
    http: reqwest::Client,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenSource {
    /// Creates a token source for `key`.
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Self {
        Self {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Service-account email the tokens are issued for.
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Returns a valid access token, refreshing it when close to expiry.
    pub async fn token(&self) -> Result<String, SheetError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, SheetError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes()).map_err(|e| {
            SheetError::Credentials {
                message: format!("private_key is not a valid RSA PEM key: {e}"),
            }
        })?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key).map_err(|e| {
            SheetError::Auth {
                message: format!("failed to sign assertion: {e}"),
            }
        })
    }

    async fn fetch(&self) -> Result<AccessToken, SheetError> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;
        debug!(client_email = %self.key.client_email, "requesting access token");

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| SheetError::Auth {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SheetError::Auth {
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(SheetError::Auth {
                message: format!("token endpoint returned {status}: {body}"),
            });
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| SheetError::Auth {
            message: format!("unexpected token response: {e}"),
        })?;
        Ok(AccessToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}
