//! Batch driver: row in, image file (or error record) out.
//!
//! The engine pulls rows in file order and runs each one through
//! delay → fetch → normalize → allocate → write. Rows are admitted into an
//! in-flight set until it holds `concurrency` rows; the engine then stops
//! admitting and waits for the whole set to resolve before admitting the
//! next batch. This is a full barrier, not a sliding window.
//!
//! In-flight rows are futures polled on the caller's task (no spawning), so
//! they interleave at I/O suspension points but never run in parallel.
//! Failures are recorded in completion order; with the default concurrency
//! of 1 that is also file order.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use sku_images_core::download::{DownloadEngine, HttpClient, Throttle};
//! use sku_images_core::input::RowSource;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(1, Throttle::disabled(), "./images/batch")?;
//! let rows = RowSource::open(Path::new("products.csv"))?;
//! let summary = engine
//!     .run(rows, &HttpClient::new(), Path::new("error_log.csv"))
//!     .await?;
//! println!("completed: {}, failed: {}", summary.completed(), summary.failed());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::constants::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use super::error::{DownloadError, StorageError};
use super::filename::allocate_path;
use super::storage::write_image;
use super::{HttpClient, Throttle};
use crate::failure::{ErrorLedger, ErrorRecord, FailureKind};
use crate::input::{InputError, Row};
use crate::normalize::{NormalizeError, normalize};

/// Error type for engine operations that abort the whole run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The input stopped being readable mid-run.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// The error log could not be written.
    #[error("failed to write error log {path}: {source}")]
    ErrorLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single row failed. Never aborts the run.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] DownloadError),

    #[error(transparent)]
    Transcode(#[from] NormalizeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Input(InputError),
}

impl ItemError {
    /// Returns the failure category for logging and reporting.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Fetch(_) => FailureKind::Network,
            Self::Transcode(_) => FailureKind::Transcode,
            Self::Storage(_) => FailureKind::Io,
            Self::Input(_) => FailureKind::Input,
        }
    }

    /// Builds the error log entry for the row that failed.
    #[must_use]
    pub fn to_record(&self, sku: &str, image_url: &str) -> ErrorRecord {
        ErrorRecord::new(
            sku,
            image_url,
            format!("error downloading image for SKU {sku}: {self}"),
        )
    }
}

/// Lifecycle of one row inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Pending,
    Fetching,
    Normalizing,
    Writing,
    Done,
    Failed,
}

impl RowState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Normalizing => "normalizing",
            Self::Writing => "writing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row that made it to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub sku: String,
    pub path: PathBuf,
    pub bytes_written: usize,
    /// Whether the bytes were re-encoded as JPEG.
    pub transcoded: bool,
}

/// Counters from one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    completed: usize,
    failed: usize,
    transcoded: usize,
}

impl RunSummary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows written to disk.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Rows recorded in the error ledger.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Completed rows that were re-encoded as JPEG.
    #[must_use]
    pub fn transcoded(&self) -> usize {
        self.transcoded
    }

    /// Rows that reached an end state (completed + failed).
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }
}

/// Sequences rows through fetch, normalize and write.
#[derive(Debug)]
pub struct DownloadEngine {
    /// Rows admitted per batch.
    concurrency: usize,
    /// Delay before each fetch.
    throttle: Throttle,
    /// Directory receiving `<sku>_<n><ext>` files. Never created by the engine.
    output_dir: PathBuf,
}

impl DownloadEngine {
    /// Creates a new engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if `concurrency` is outside
    /// the valid range (1-100).
    ///
    /// # Example
    ///
    /// ```
    /// use sku_images_core::download::{DownloadEngine, Throttle};
    ///
    /// let engine = DownloadEngine::new(1, Throttle::disabled(), "./images/batch").unwrap();
    /// assert_eq!(engine.concurrency(), 1);
    /// ```
    #[instrument(level = "debug", skip(throttle, output_dir))]
    pub fn new(
        concurrency: usize,
        throttle: Throttle,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }
        let output_dir = output_dir.into();

        debug!(
            concurrency,
            delay_ms = throttle.delay().as_millis(),
            output_dir = %output_dir.display(),
            "creating download engine"
        );

        if concurrency > 1 {
            warn!(
                concurrency,
                "filename allocation is check-then-act; rows sharing a SKU within one batch may overwrite each other"
            );
        }

        Ok(Self {
            concurrency,
            throttle,
            output_dir,
        })
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Processes every row, flushes the error log if anything failed, and
    /// reports completion.
    ///
    /// Row failures never abort the run; they end up in the error log.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Input`] if the input becomes unreadable and
    /// [`EngineError::ErrorLog`] if the error log cannot be written.
    #[instrument(skip(self, rows, client), fields(output_dir = %self.output_dir.display()))]
    pub async fn run<I>(
        &self,
        rows: I,
        client: &HttpClient,
        error_log: &Path,
    ) -> Result<RunSummary, EngineError>
    where
        I: IntoIterator<Item = Result<Row, InputError>>,
    {
        let (summary, ledger) = self.process_rows(rows, client, ErrorLedger::new()).await?;

        ledger
            .flush(error_log)
            .await
            .map_err(|source| EngineError::ErrorLog {
                path: error_log.to_path_buf(),
                source,
            })?;

        info!(
            completed = summary.completed(),
            failed = summary.failed(),
            transcoded = summary.transcoded(),
            total = summary.total(),
            "image download finished"
        );
        Ok(summary)
    }

    /// Processes every row, appending failures to `ledger`.
    ///
    /// Returns the counters and the ledger. Does not write the error log.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Input`] if the row source reports a
    /// non-recoverable read error. In-flight rows are drained first.
    pub async fn process_rows<I>(
        &self,
        rows: I,
        client: &HttpClient,
        mut ledger: ErrorLedger,
    ) -> Result<(RunSummary, ErrorLedger), EngineError>
    where
        I: IntoIterator<Item = Result<Row, InputError>>,
    {
        let mut summary = RunSummary::new();
        let mut in_flight = FuturesUnordered::new();

        info!(concurrency = self.concurrency, "starting image download");

        for item in rows {
            match item {
                Ok(row) => {
                    debug!(sku = %row.sku, state = %RowState::Pending, "admitted row");
                    in_flight.push(self.process_owned_row(client, row));
                }
                Err(err) if err.is_row_local() => {
                    let (sku, image_url) = match &err {
                        InputError::Malformed { sku, image_url, .. } => {
                            (sku.clone(), image_url.clone())
                        }
                        _ => (String::new(), String::new()),
                    };
                    let err = ItemError::Input(err);
                    record_failure(&mut summary, &mut ledger, &sku, &image_url, &err);
                }
                Err(err) => {
                    drain(&mut in_flight, &mut summary, &mut ledger).await;
                    return Err(EngineError::Input(err));
                }
            }

            if in_flight.len() >= self.concurrency {
                drain(&mut in_flight, &mut summary, &mut ledger).await;
            }
        }
        drain(&mut in_flight, &mut summary, &mut ledger).await;

        Ok((summary, ledger))
    }

    /// Runs one row through delay, fetch, normalize, allocate and write.
    ///
    /// # Errors
    ///
    /// Returns the [`ItemError`] of the first stage that failed.
    #[instrument(skip(self, client, row), fields(sku = %row.sku, url = %row.image_url))]
    pub async fn process_row(
        &self,
        client: &HttpClient,
        row: &Row,
    ) -> Result<SavedImage, ItemError> {
        self.throttle.wait().await;

        debug!(state = %RowState::Fetching, "fetching image");
        let bytes = client.fetch(&row.image_url).await?;

        debug!(state = %RowState::Normalizing, bytes = bytes.len(), "normalizing image");
        let normalized = normalize(bytes)?;

        debug!(state = %RowState::Writing, extension = %normalized.extension, "writing image");
        let path = allocate_path(&self.output_dir, &row.sku, &normalized.extension).await?;
        write_image(&path, &normalized.bytes).await?;

        Ok(SavedImage {
            sku: row.sku.clone(),
            path,
            bytes_written: normalized.bytes.len(),
            transcoded: normalized.transcoded,
        })
    }

    async fn process_owned_row(
        &self,
        client: &HttpClient,
        row: Row,
    ) -> (Row, Result<SavedImage, ItemError>) {
        let result = self.process_row(client, &row).await;
        (row, result)
    }
}

/// Waits for every in-flight row and folds the results into the counters.
async fn drain<F>(
    in_flight: &mut FuturesUnordered<F>,
    summary: &mut RunSummary,
    ledger: &mut ErrorLedger,
) where
    F: Future<Output = (Row, Result<SavedImage, ItemError>)>,
{
    while let Some((row, result)) = in_flight.next().await {
        match result {
            Ok(saved) => {
                if saved.transcoded {
                    summary.transcoded += 1;
                    info!(
                        sku = %saved.sku,
                        path = %saved.path.display(),
                        bytes = saved.bytes_written,
                        state = %RowState::Done,
                        "image downloaded and converted to JPEG"
                    );
                } else {
                    info!(
                        sku = %saved.sku,
                        path = %saved.path.display(),
                        bytes = saved.bytes_written,
                        state = %RowState::Done,
                        "image downloaded"
                    );
                }
                summary.completed += 1;
            }
            Err(err) => {
                record_failure(summary, ledger, &row.sku, &row.image_url, &err);
            }
        }
    }
}

fn record_failure(
    summary: &mut RunSummary,
    ledger: &mut ErrorLedger,
    sku: &str,
    image_url: &str,
    err: &ItemError,
) {
    let record = err.to_record(sku, image_url);
    warn!(
        sku,
        url = image_url,
        kind = %err.kind(),
        state = %RowState::Failed,
        error = %record.error,
        "image download failed"
    );
    summary.failed += 1;
    ledger.record(record);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_rejects_zero_concurrency() {
        let err = DownloadEngine::new(0, Throttle::disabled(), "out").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConcurrency { value: 0 }));
        assert!(err.to_string().contains("between 1 and 100"));
    }

    #[test]
    fn test_engine_rejects_excessive_concurrency() {
        assert!(DownloadEngine::new(101, Throttle::disabled(), "out").is_err());
    }

    #[test]
    fn test_engine_accepts_bounds() {
        assert_eq!(
            DownloadEngine::new(1, Throttle::disabled(), "out")
                .unwrap()
                .concurrency(),
            1
        );
        assert_eq!(
            DownloadEngine::new(100, Throttle::disabled(), "out")
                .unwrap()
                .concurrency(),
            100
        );
    }

    #[test]
    fn test_item_error_kinds() {
        assert_eq!(
            ItemError::from(DownloadError::http_status("u", 404)).kind(),
            FailureKind::Network
        );
        let io = std::io::Error::other("disk full");
        assert_eq!(
            ItemError::from(StorageError::io("p", io)).kind(),
            FailureKind::Io
        );
        let malformed = InputError::Malformed {
            line: 3,
            sku: "A".into(),
            image_url: String::new(),
            reason: "missing field".into(),
        };
        assert_eq!(ItemError::Input(malformed).kind(), FailureKind::Input);
    }

    #[test]
    fn test_item_error_record_message() {
        let err = ItemError::from(DownloadError::http_status("https://x/a.jpg", 500));
        let record = err.to_record("SKU9", "https://x/a.jpg");
        assert_eq!(record.sku, "SKU9");
        assert_eq!(record.image_url, "https://x/a.jpg");
        assert!(record.error.starts_with("error downloading image for SKU SKU9: "));
        assert!(record.error.contains("Internal Server Error"));
    }

    #[test]
    fn test_row_state_labels() {
        assert_eq!(RowState::Done.to_string(), "done");
        assert_eq!(RowState::Failed.to_string(), "failed");
        assert_eq!(RowState::Normalizing.to_string(), "normalizing");
    }

    #[test]
    fn test_run_summary_total() {
        let summary = RunSummary {
            completed: 2,
            failed: 1,
            transcoded: 1,
        };
        assert_eq!(summary.total(), 3);
    }

    #[tokio::test]
    async fn test_malformed_rows_are_recorded_without_fetching() {
        let dir = tempfile::TempDir::new().unwrap();
        let engine = DownloadEngine::new(1, Throttle::disabled(), dir.path()).unwrap();
        let rows = vec![Err(InputError::Malformed {
            line: 2,
            sku: "B".into(),
            image_url: String::new(),
            reason: "missing field `image_url`".into(),
        })];

        let (summary, ledger) = engine
            .process_rows(rows, &HttpClient::new(), ErrorLedger::new())
            .await
            .unwrap();

        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.completed(), 0);
        assert_eq!(ledger.records()[0].sku, "B");
        assert!(ledger.records()[0].error.contains("line 2"));
    }

    #[tokio::test]
    async fn test_invalid_url_row_is_recorded_and_run_continues() {
        let dir = tempfile::TempDir::new().unwrap();
        let engine = DownloadEngine::new(1, Throttle::disabled(), dir.path()).unwrap();
        let rows = vec![
            Ok(Row::new("A", "not a url")),
            Ok(Row::new("B", "")),
        ];

        let (summary, ledger) = engine
            .process_rows(rows, &HttpClient::new(), ErrorLedger::new())
            .await
            .unwrap();

        assert_eq!(summary.failed(), 2);
        let skus: Vec<_> = ledger.records().iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, ["A", "B"]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
