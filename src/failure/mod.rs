//! Per-row failure records and the end-of-run error log.
//!
//! The [`ErrorLedger`] is an owned accumulator: the engine takes it by value,
//! appends to it as rows fail, and hands it back when the run is over. It is
//! flushed once, and only if something failed.
//!
//! The log is `;`-delimited with header `sku;image_url;error_message`.
//! Values are written verbatim. A `;` or newline inside a value is not
//! escaped and will shift or split that row.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, instrument};

/// Header line of the error log.
pub const ERROR_LOG_HEADER: &str = "sku;image_url;error_message";

/// Field separator of the error log.
pub const ERROR_LOG_DELIMITER: char = ';';

/// Default error log file name, relative to the working directory.
pub const DEFAULT_ERROR_LOG: &str = "error_log.csv";

/// Which stage a row failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureKind {
    /// Invalid URL, transport error, timeout, or non-2xx status.
    Network,
    /// Decoding or JPEG encoding failed.
    Transcode,
    /// Probing the output directory or writing the file failed.
    Io,
    /// The CSV record could not be read into a row.
    Input,
}

impl FailureKind {
    /// Returns the stable lowercase label used in log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Transcode => "transcode",
            Self::Io => "io",
            Self::Input => "input",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed row as it appears in the error log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub sku: String,
    pub image_url: String,
    pub error: String,
}

impl ErrorRecord {
    #[must_use]
    pub fn new(
        sku: impl Into<String>,
        image_url: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            sku: sku.into(),
            image_url: image_url.into(),
            error: error.into(),
        }
    }

    fn to_line(&self) -> String {
        let d = ERROR_LOG_DELIMITER;
        format!("{}{d}{}{d}{}", self.sku, self.image_url, self.error)
    }
}

/// Append-only list of failed rows for a single run.
#[derive(Debug, Default)]
pub struct ErrorLedger {
    records: Vec<ErrorRecord>,
}

impl ErrorLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record, keeping insertion order.
    pub fn record(&mut self, record: ErrorRecord) {
        debug!(sku = %record.sku, total = self.records.len() + 1, "recorded failure");
        self.records.push(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recorded failures in insertion order.
    #[must_use]
    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Renders the full log: header, then one line per record, `\n`-separated
    /// with no trailing newline.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from(ERROR_LOG_HEADER);
        for record in &self.records {
            out.push('\n');
            out.push_str(&record.to_line());
        }
        out
    }

    /// Writes the log to `path` if any failure was recorded.
    ///
    /// Overwrites an existing file. With no records this is a no-op and the
    /// file is neither created nor touched.
    ///
    /// Returns `true` when a file was written.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if the file cannot be written.
    #[instrument(skip(self), fields(path = %path.display(), records = self.records.len()))]
    pub async fn flush(&self, path: &Path) -> std::io::Result<bool> {
        if self.is_empty() {
            debug!("no failures recorded, skipping error log");
            return Ok(false);
        }
        tokio::fs::write(path, self.render()).await?;
        info!(path = %path.display(), failures = self.records.len(), "error log written");
        Ok(true)
    }
}
