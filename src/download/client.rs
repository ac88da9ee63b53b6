//! HTTP client wrapper for fetching image bytes.
//!
//! This module provides the `HttpClient` struct which performs a single GET
//! per image URL and classifies the outcome as body bytes or a typed
//! [`DownloadError`].

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;

/// User-Agent sent with every image request.
fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("sku-images/{version}")
}

/// HTTP client for fetching images.
///
/// Created once per run and reused for every row, taking advantage of
/// connection pooling. There is no retry: each call is exactly one attempt.
///
/// # Example
///
/// ```no_run
/// use sku_images_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let bytes = client.fetch("https://cdn.example.com/products/A100.png").await?;
/// println!("fetched {} bytes", bytes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = build_client(connect_timeout_secs, read_timeout_secs)
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Fetches the full response body for `url`.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns a non-2xx status
    /// - The body cannot be read to completion
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        debug!("starting fetch");

        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_url(url));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "server returned error status");
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        debug!(bytes = body.len(), "fetch complete");
        Ok(body.to_vec())
    }
}

fn classify_transport_error(url: &str, error: reqwest::Error) -> DownloadError {
    if error.is_timeout() {
        DownloadError::timeout(url, error)
    } else {
        DownloadError::network(url, error)
    }
}

fn build_client(
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    ClientBuilder::new()
        .user_agent(default_user_agent())
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .read_timeout(Duration::from_secs(read_timeout_secs))
        .gzip(true)
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent_includes_version() {
        let ua = default_user_agent();
        assert!(ua.starts_with("sku-images/"));
        assert!(ua.contains(env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn test_fetch_rejects_unparseable_url() {
        let client = HttpClient::new();
        let result = client.fetch("not a url").await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_scheme() {
        let client = HttpClient::new();
        let result = client.fetch("ftp://example.com/a.jpg").await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty_url() {
        let client = HttpClient::new();
        let result = client.fetch("").await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }
}
