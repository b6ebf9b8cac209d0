//! HTTP client with retry logic for the Plex API
//!
//! This module provides the transport layer of the exporter: a reqwest
//! wrapper that authenticates every request, retries transient failures
//! with exponential backoff and surfaces terminal rejections with enough
//! context to be actionable. It also hosts [`Pacer`], the injectable delay
//! strategy used between paginated requests.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{ExportError, Result};

/// Client version reported in the identification headers
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of retry attempts for transient errors
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// Status codes that are retried with backoff
const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Injectable delay strategy between consecutive requests.
///
/// Ensures requests are spaced at least `min_interval` apart so the
/// exporter respects the server's rate expectations. A zero interval
/// (see [`Pacer::none`]) never waits, which is what tests substitute.
pub struct Pacer {
    /// Minimum interval between requests
    min_interval: Duration,
    /// Timestamp of the last paced request
    last_request: Arc<Mutex<Instant>>,
}

impl Pacer {
    /// Create a pacer with the given minimum interval between requests.
    ///
    /// The first call to [`Pacer::pause`] never waits.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Arc::new(Mutex::new(
                Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now),
            )),
        }
    }

    /// A pacer that never waits (zero-delay policy for tests).
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Wait until the minimum interval since the previous paced request
    /// has elapsed.
    pub async fn pause(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }

    /// Get the minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Configuration for the Plex HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, e.g. `http://localhost:32400`
    pub base_url: String,
    /// Authentication token sent as `X-Plex-Token`
    pub token: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Base delay for retry backoff in milliseconds (default: 1000)
    pub retry_base_delay_ms: u64,
}

impl ClientConfig {
    /// Configuration for a server at `base_url` authenticated by `token`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout_secs: 30,
            retry_base_delay_ms: BASE_RETRY_DELAY_MS,
        }
    }
}

/// HTTP client for a Plex-style media server
///
/// This client automatically:
/// - Authenticates every request with the configured token
/// - Requests XML payloads and identifies itself to the server
/// - Retries transient failures (429, 5xx, connection errors) with
///   exponential backoff, up to a bounded attempt count
pub struct PlexClient {
    /// Underlying HTTP client
    client: reqwest::Client,
    base_url: String,
    retry_base_delay: Duration,
}

impl PlexClient {
    /// Create a new client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created or the token
    /// contains characters that are not valid in a header value.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/xml"),
        );
        let token_value = reqwest::header::HeaderValue::from_str(&config.token)
            .map_err(|_| ExportError::Xml("token is not a valid header value".to_string()))?;
        headers.insert("X-Plex-Token", token_value);
        headers.insert(
            "X-Plex-Product",
            reqwest::header::HeaderValue::from_static("Plexport"),
        );

        let client = reqwest::Client::builder()
            .user_agent(format!("plexport/{}", CLIENT_VERSION))
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    /// Fetch an XML document from a server path.
    ///
    /// Retries transparently on transient failures; see the module docs.
    ///
    /// # Arguments
    /// * `path` - Relative path, e.g. `/library/sections`
    /// * `query` - Query parameters appended to the request
    ///
    /// # Errors
    /// - `ExportError::Rejected` - non-transient 4xx (bad token, not found)
    /// - `ExportError::RetriesExhausted` - transient status after all retries
    /// - `ExportError::Http` - connection failure after all retries
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        self.get_with_retry(&url, query, 0).await
    }

    /// Internal method implementing the retry loop
    fn get_with_retry<'a>(
        &'a self,
        url: &'a str,
        query: &'a [(&'a str, String)],
        attempt: u32,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let response = match self.client.get(url).query(query).send().await {
                Ok(response) => response,
                Err(err) => {
                    // Connection-level failure; retry until the budget runs out
                    if attempt < MAX_RETRIES {
                        sleep(self.backoff_delay(attempt)).await;
                        return self.get_with_retry(url, query, attempt + 1).await;
                    }
                    return Err(ExportError::Http(err));
                }
            };

            let status = response.status();

            if status.is_success() {
                return Ok(response.text().await?);
            }

            if TRANSIENT_STATUSES.contains(&status.as_u16()) {
                if attempt < MAX_RETRIES {
                    sleep(self.backoff_delay(attempt)).await;
                    return self.get_with_retry(url, query, attempt + 1).await;
                }
                return Err(ExportError::RetriesExhausted {
                    status,
                    url: url.to_string(),
                    attempts: attempt + 1,
                });
            }

            // Remaining 4xx/3xx are terminal: bad token, unknown path, etc.
            Err(ExportError::Rejected {
                status,
                url: url.to_string(),
            })
        })
    }

    /// Calculate exponential backoff delay for a retry
    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay * 2u32.pow(attempt)
    }
}
