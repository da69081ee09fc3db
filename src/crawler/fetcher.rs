//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the pooled HTTP client with the configured user agent and timeouts
//! - GET requests with retry and exponential backoff
//! - Error classification into `FetchError` kinds

use crate::config::HttpConfig;
use crate::crawler::retry::RetryPolicy;
use crate::FetchError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// A successfully fetched response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    /// Response body
    pub body: String,
}

impl FetchedPage {
    /// Returns true unless the server declared a non-HTML content type
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map_or(true, |ct| ct.to_ascii_lowercase().contains("html"))
    }
}

/// Builds the HTTP client shared by every request of a run
///
/// Redirects are followed by the client (reqwest's default limit of 10 hops).
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Resilient GET over a single connection pool
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Status in `retry_statuses` (429, 5xx by default) | Retry with backoff |
/// | Timeout | Retry with backoff |
/// | Connection failure | Retry with backoff |
/// | Any other non-success status | Immediate `FetchError::Http` |
/// | Body decoding failure | Immediate `FetchError::Other` |
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    retry_statuses: Vec<u16>,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy, retry_statuses: Vec<u16>) -> Self {
        Self {
            client,
            policy,
            retry_statuses,
        }
    }

    /// Builds a fetcher from the `[http]` configuration section
    pub fn from_config(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        let policy = RetryPolicy::exponential(
            config.max_retries,
            Duration::from_millis(config.backoff_factor_ms),
        );
        Ok(Self::new(client, policy, config.retry_statuses.clone()))
    }

    /// Returns the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - A 2xx response with its body
    /// * `Err(FetchError)` - The last failure once the retry budget is spent, or the first
    ///   non-retryable failure
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.policy
            .run(
                move |attempt| self.fetch_once(url, attempt),
                |e| self.is_retryable(e),
            )
            .await
            .map_err(|e| {
                tracing::debug!("Giving up on {}: {}", url, e);
                e
            })
    }

    fn is_retryable(&self, error: &FetchError) -> bool {
        match error {
            FetchError::Timeout { .. } | FetchError::Connection { .. } => true,
            FetchError::Http { status, .. } => self.retry_statuses.contains(status),
            FetchError::Other { .. } => false,
        }
    }

    async fn fetch_once(&self, url: &Url, attempt: u32) -> Result<FetchedPage, FetchError> {
        tracing::trace!("GET {} (attempt {})", url, attempt);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                tracing::debug!("Rate limited by {}", url);
            }
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, e))?;

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connection {
            url,
            message: error.to_string(),
        }
    } else {
        FetchError::Other {
            url,
            message: error.to_string(),
        }
    }
}
