//! Lazy row reader for the `;`-delimited product image list.
//!
//! The input must have a header row containing at least `sku` and
//! `image_url`; other columns are ignored. Records are read one at a time
//! as the engine pulls them, in file order.
//!
//! # Example
//!
//! ```
//! use sku_images_core::input::RowSource;
//!
//! let data = "sku;image_url\nA100;https://cdn.example.com/a100.png\n";
//! let rows: Vec<_> = RowSource::from_reader(data.as_bytes())
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(rows[0].sku, "A100");
//! ```

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Field delimiter of the input file.
pub const INPUT_DELIMITER: u8 = b';';

/// Required column holding the product SKU.
pub const SKU_COLUMN: &str = "sku";

/// Required column holding the image URL.
pub const IMAGE_URL_COLUMN: &str = "image_url";

/// One product image to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Row {
    pub sku: String,
    pub image_url: String,
}

impl Row {
    #[must_use]
    pub fn new(sku: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            image_url: image_url.into(),
        }
    }
}

/// Errors produced while reading the input file.
#[derive(Debug, Error)]
pub enum InputError {
    /// The input file could not be opened or its header could not be read.
    #[error("failed to open input {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The header row lacks a required column.
    #[error("input {path} is missing required column `{column}`")]
    MissingColumn { path: PathBuf, column: &'static str },

    /// A single record could not be turned into a row. Carries whatever
    /// fields could be salvaged so the failure can still be logged.
    #[error("malformed record at line {line}: {reason}")]
    Malformed {
        line: u64,
        sku: String,
        image_url: String,
        reason: String,
    },

    /// The underlying reader failed mid-stream.
    #[error("failed to read input {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl InputError {
    /// Whether this error only affects one record and reading can continue.
    #[must_use]
    pub fn is_row_local(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// Iterator over the rows of an input file.
pub struct RowSource<R = File> {
    path: PathBuf,
    headers: StringRecord,
    sku_index: usize,
    url_index: usize,
    records: StringRecordsIntoIter<R>,
    failed: bool,
}

impl RowSource<File> {
    /// Opens `path` and validates its header row.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Open`] if the file cannot be opened or its
    /// header read, and [`InputError::MissingColumn`] if `sku` or
    /// `image_url` is absent.
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, InputError> {
        let reader = builder()
            .from_path(path)
            .map_err(|source| InputError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Self::with_reader(path.to_path_buf(), reader)
    }
}

impl<R: io::Read> RowSource<R> {
    /// Reads rows from any reader, e.g. an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Same as [`RowSource::open`].
    pub fn from_reader(reader: R) -> Result<Self, InputError> {
        Self::with_reader(PathBuf::from("<reader>"), builder().from_reader(reader))
    }

    fn with_reader(path: PathBuf, mut reader: csv::Reader<R>) -> Result<Self, InputError> {
        let headers = reader
            .headers()
            .map_err(|source| InputError::Open {
                path: path.clone(),
                source,
            })?
            .clone();
        let sku_index = column_index(&headers, SKU_COLUMN).ok_or_else(|| {
            InputError::MissingColumn {
                path: path.clone(),
                column: SKU_COLUMN,
            }
        })?;
        let url_index = column_index(&headers, IMAGE_URL_COLUMN).ok_or_else(|| {
            InputError::MissingColumn {
                path: path.clone(),
                column: IMAGE_URL_COLUMN,
            }
        })?;
        debug!(columns = headers.len(), "input header validated");

        Ok(Self {
            path,
            headers,
            sku_index,
            url_index,
            records: reader.into_records(),
            failed: false,
        })
    }

    /// Path the rows are read from (`<reader>` for in-memory sources).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, record: &StringRecord) -> Result<Row, InputError> {
        record
            .deserialize::<Row>(Some(&self.headers))
            .map_err(|e| InputError::Malformed {
                line: record.position().map_or(0, csv::Position::line),
                sku: record.get(self.sku_index).unwrap_or_default().to_string(),
                image_url: record.get(self.url_index).unwrap_or_default().to_string(),
                reason: e.to_string(),
            })
    }
}

impl<R: io::Read> Iterator for RowSource<R> {
    type Item = Result<Row, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.records.next()? {
            Ok(record) => Some(self.parse(&record)),
            Err(source) if source.is_io_error() => {
                // The reader cannot make progress after an IO error.
                self.failed = true;
                Some(Err(InputError::Read {
                    path: self.path.clone(),
                    source,
                }))
            }
            Err(source) => {
                let line = source.position().map_or(0, csv::Position::line);
                Some(Err(InputError::Malformed {
                    line,
                    sku: String::new(),
                    image_url: String::new(),
                    reason: source.to_string(),
                }))
            }
        }
    }
}

fn builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(INPUT_DELIMITER)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All);
    builder
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}
