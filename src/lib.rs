//! SKU Images Core Library
//!
//! Downloads the product images listed in a `;`-delimited CSV file, names
//! them `<sku>_<n><ext>` without overwriting earlier files, re-encodes
//! non-web formats as JPEG, and writes an error log for rows that failed.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`input`] - Lazy CSV row reader
//! - [`download`] - HTTP fetch, filename allocation, writing, batch engine
//! - [`normalize`] - Format sniffing and JPEG transcoding
//! - [`failure`] - Failure categories and the error log

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod failure;
pub mod input;
pub mod normalize;

// Re-export commonly used types
pub use download::{
    DEFAULT_CONCURRENCY, DownloadEngine, DownloadError, EngineError, HttpClient, ItemError,
    RunSummary, SavedImage, StorageError, Throttle,
};
pub use failure::{DEFAULT_ERROR_LOG, ErrorLedger, ErrorRecord, FailureKind};
pub use input::{InputError, Row, RowSource};
pub use normalize::{DetectedFormat, NormalizeError, NormalizedImage, detect_format, normalize};
