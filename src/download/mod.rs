//! HTTP fetch, filename allocation and the batch engine.
//!
//! # Features
//!
//! - One GET per image, no retry
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Fixed pre-fetch delay
//! - `<sku>_<n><ext>` naming that never reuses an existing file
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use sku_images_core::download::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let bytes = client.fetch("https://cdn.example.com/A100.png").await?;
//! println!("fetched {} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod error;
mod filename;
mod storage;
mod throttle;

pub use client::HttpClient;
pub use constants::DEFAULT_CONCURRENCY;
pub use engine::{
    DownloadEngine, EngineError, ItemError, RowState, RunSummary, SavedImage,
};
pub use error::{DownloadError, StorageError};
pub use filename::allocate_path;
pub use storage::write_image;
pub use throttle::Throttle;

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
