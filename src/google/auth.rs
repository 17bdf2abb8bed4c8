//! OAuth2 access tokens for Google APIs
//!
//! Supports two credential kinds:
//! - Service account key with domain-wide delegation (JWT bearer grant,
//!   impersonating an administrator)
//! - Pre-issued access token

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{Result, SyncError};

/// Scopes requested for the directory and the mapping sheet
pub const SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/admin.directory.user",
    "https://www.googleapis.com/auth/admin.directory.group.readonly",
    "https://www.googleapis.com/auth/spreadsheets.readonly",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Service account key file contents
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Reads and parses a key file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            SyncError::Credentials(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
    }

    /// Parses key JSON, rejecting non-service-account credentials
    pub fn parse(json: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(json)
            .map_err(|e| SyncError::Credentials(format!("Invalid service account key: {e}")))?;

        if key.key_type != "service_account" {
            return Err(SyncError::Credentials(format!(
                "Unsupported credential type '{}', expected 'service_account'",
                key.key_type
            )));
        }

        Ok(key)
    }
}

/// How access tokens are obtained
#[derive(Clone)]
pub enum Credentials {
    /// Service account acting on behalf of `subject`
    ServiceAccount {
        key: ServiceAccountKey,
        subject: String,
    },
    /// Token issued out of band; used as is
    AccessToken(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ServiceAccount { key, subject } => f
                .debug_struct("ServiceAccount")
                .field("key", key)
                .field("subject", subject)
                .finish(),
            Credentials::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

/// JWT claims of the bearer assertion
#[derive(Debug, Serialize, PartialEq, Eq)]
struct Claims {
    iss: String,
    sub: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl Claims {
    fn new(key: &ServiceAccountKey, subject: &str, issued_at: DateTime<Utc>) -> Self {
        let iat = issued_at.timestamp();
        Self {
            iss: key.client_email.clone(),
            sub: subject.to_string(),
            scope: SCOPES.join(" "),
            aud: key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Returns true if the token is expired or will expire within the grace period.
    fn is_expired(&self, grace_period: Duration) -> bool {
        Utc::now() + grace_period >= self.expires_at
    }
}

/// Access token provider with caching
#[derive(Debug)]
pub struct TokenCache {
    credentials: Credentials,
    http_client: reqwest::Client,
    cached_token: RwLock<Option<CachedToken>>,
    /// Refresh this long before expiry (default: 5 minutes)
    grace_period: Duration,
}

impl TokenCache {
    pub fn new(credentials: Credentials, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            http_client,
            cached_token: RwLock::new(None),
            grace_period: Duration::minutes(5),
        }
    }

    /// Gets a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> Result<String> {
        let (key, subject) = match &self.credentials {
            Credentials::AccessToken(token) => return Ok(token.clone()),
            Credentials::ServiceAccount { key, subject } => (key, subject),
        };

        {
            let cache = self.cached_token.read().await;
            if let Some(ref token) = *cache {
                if !token.is_expired(self.grace_period) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        debug!("Refreshing access token");
        let token = self.acquire_token(key, subject).await?;

        let mut cache = self.cached_token.write().await;
        *cache = Some(token.clone());
        Ok(token.access_token)
    }

    /// Drops the cached token so the next call acquires a fresh one
    pub async fn invalidate(&self) {
        let mut cache = self.cached_token.write().await;
        *cache = None;
    }

    #[instrument(skip(self, key), fields(client = %key.client_email))]
    async fn acquire_token(&self, key: &ServiceAccountKey, subject: &str) -> Result<CachedToken> {
        use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

        let claims = Claims::new(key, subject, Utc::now());

        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SyncError::Credentials(format!("Invalid private key: {e}")))?;
        let assertion = encode(&header, &claims, &encoding_key)
            .map_err(|e| SyncError::Credentials(format!("Failed to sign assertion: {e}")))?;

        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = self
            .http_client
            .post(&key.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| SyncError::Auth(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Auth(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Auth(format!("Failed to parse token response: {e}")))?;

        let expires_at = Utc::now() + Duration::seconds(token.expires_in);
        debug!(%expires_at, "Acquired access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at,
        })
    }
}
