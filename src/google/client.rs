//! Authenticated JSON client shared by the Google API wrappers

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};
use url::Url;

use super::auth::{Credentials, TokenCache};
use crate::error::{is_transient_status, Result, SyncError};

/// Error envelope returned by Google APIs
#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
}

/// Transport settings for [`GoogleClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Timeout applied to every single HTTP request
    pub request_timeout: Duration,
    /// Retries for transient statuses and connection failures
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each further retry
    pub initial_backoff: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Google API client with bearer token injection and retry handling
#[derive(Debug)]
pub struct GoogleClient {
    http_client: reqwest::Client,
    token_cache: Arc<TokenCache>,
    max_retries: u32,
    initial_backoff: Duration,
}

impl GoogleClient {
    /// Creates a client authenticating with `credentials`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(credentials: Credentials, options: &ClientOptions) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to create HTTP client: {e}")))?;

        let token_cache = Arc::new(TokenCache::new(credentials, http_client.clone()));

        Ok(Self {
            http_client,
            token_cache,
            max_retries: options.max_retries,
            initial_backoff: options.initial_backoff,
        })
    }

    /// Performs a GET request and decodes the JSON body
    #[instrument(skip(self), fields(path = %url.path()))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send(Method::GET, &url, None::<&()>).await?;
        Ok(response.json().await?)
    }

    /// Performs a PUT request with a JSON body, discarding the response body
    #[instrument(skip(self, body), fields(path = %url.path()))]
    pub async fn put_json<B: Serialize>(&self, url: Url, body: &B) -> Result<()> {
        self.send(Method::PUT, &url, Some(body)).await?;
        Ok(())
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let mut retries = 0;
        let mut delay = self.initial_backoff;
        let mut token_refreshed = false;

        loop {
            let token = self.token_cache.get_token().await?;

            let mut request = self
                .http_client
                .request(method.clone(), url.clone())
                .bearer_auth(&token);

            if let Some(b) = body {
                request = request.json(b);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) if (err.is_timeout() || err.is_connect()) && retries < self.max_retries => {
                    retries += 1;
                    warn!(
                        "Request to {} failed ({}), retry {}/{} after {:?}",
                        url.path(),
                        err,
                        retries,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            // An expired or revoked token gets one refresh
            if status == StatusCode::UNAUTHORIZED && !token_refreshed {
                token_refreshed = true;
                self.token_cache.invalidate().await;
                continue;
            }

            if is_transient_status(status.as_u16()) && retries < self.max_retries {
                retries += 1;
                warn!(
                    "Transient status {} from {}, retry {}/{} after {:?}",
                    status,
                    url.path(),
                    retries,
                    self.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                continue;
            }

            let error_body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, url.path(), &error_body));
        }
    }
}

/// Maps a non-success status to a typed error
fn error_for_status(status: StatusCode, resource: &str, body: &str) -> SyncError {
    let message = serde_json::from_str::<GoogleErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::NOT_FOUND => SyncError::NotFound(format!("{resource}: {message}")),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SyncError::PermissionDenied(format!("{resource}: {message}"))
        }
        _ => SyncError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Appends percent-encoded path segments to `base`
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| SyncError::Config(format!("Base URL cannot carry a path: {base}")))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}
