//! Access tokens for the Firestore REST API.
//!
//! Production access uses a Google service account: a short-lived JWT signed with the
//! account's private key is exchanged at the account's token URI for an OAuth2 access
//! token, which is cached until shortly before it expires. Tools running against the
//! emulator, or with a token minted elsewhere, use a static token instead.

use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::StoreError;

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this many seconds before they expire.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Fields of a Google service account key file used for the token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        serde_json::from_str(raw)
            .map_err(|e| StoreError::Auth(format!("invalid service account JSON: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Credentials {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }
}

/// Where the bearer token attached to each request comes from.
pub enum TokenSource {
    /// No `Authorization` header.
    Anonymous,
    /// A fixed token, e.g. `owner` for the emulator or a token minted by `gcloud`.
    Static(String),
    /// Tokens obtained through the service-account JWT bearer flow.
    ServiceAccount(ServiceAccountTokens),
}

impl TokenSource {
    pub fn service_account(key: ServiceAccountKey, client: reqwest::Client) -> Self {
        Self::ServiceAccount(ServiceAccountTokens::new(key, client))
    }

    /// The token to send, or `None` for anonymous access.
    pub async fn bearer(&self) -> Result<Option<String>, StoreError> {
        match self {
            Self::Anonymous => Ok(None),
            Self::Static(token) => Ok(Some(token.clone())),
            Self::ServiceAccount(tokens) => tokens.access_token().await.map(Some),
        }
    }
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

pub struct ServiceAccountTokens {
    key: ServiceAccountKey,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
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

impl ServiceAccountTokens {
    pub fn new(key: ServiceAccountKey, client: reqwest::Client) -> Self {
        Self {
            key,
            client,
            cached: Mutex::new(None),
        }
    }

    /// Returns a cached access token, exchanging a fresh assertion when needed.
    pub async fn access_token(&self) -> Result<String, StoreError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - REFRESH_MARGIN_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.sign_assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!(
                "token exchange returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(
            "Obtained access token for {} valid for {}s",
            self.key.client_email,
            token.expires_in
        );

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: now + token.expires_in,
        });

        Ok(token.access_token)
    }

    fn sign_assertion(&self, now: i64) -> Result<String, StoreError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &key,
        )?)
    }
}
