//! Error types for the download module.
//!
//! Fetch errors carry the URL, storage errors carry the path. Both are
//! row-local: the engine records them in the error ledger and moves on.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching an image over HTTP.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}: {source}")]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response.
    #[error("HTTP {status} {reason} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status, e.g. `Not Found`.
        reason: String,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error, filling in the canonical reason phrase.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("Unknown Status")
            .to_string();
        Self::HttpStatus {
            url: url.into(),
            status,
            reason,
        }
    }

    /// Creates a timeout error from a reqwest error.
    pub fn timeout(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Timeout {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

/// Errors from probing the output directory or writing an image to it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File system error while probing or writing.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs
// the URL or path, which the source errors don't carry.
