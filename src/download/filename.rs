//! SKU-based filename sanitization and collision-free path allocation.
//!
//! Output files are named `<sku>_<n><ext>` with `n` starting at 1. The
//! allocator probes the output directory and returns the first candidate
//! that does not exist yet.
//!
//! Allocation is check-then-act: the probe and the later write are separate
//! steps. With more than one row in flight, two rows sharing a SKU can probe
//! the same free candidate and the second write overwrites the first.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use super::error::StorageError;

/// Stem used when a SKU sanitizes down to nothing.
const EMPTY_SKU_STEM: &str = "unnamed";

/// Returns the first `<output_dir>/<sku>_<n><extension>` that does not exist.
///
/// `extension` includes the leading dot (e.g. `.png`).
///
/// # Errors
///
/// Returns [`StorageError::Io`] if an existence probe fails (for example a
/// permission error on the output directory).
pub async fn allocate_path(
    output_dir: &Path,
    sku: &str,
    extension: &str,
) -> Result<PathBuf, StorageError> {
    let stem = sanitize_sku(sku);
    let mut index: u64 = 1;
    loop {
        let candidate = output_dir.join(format!("{stem}_{index}{extension}"));
        let exists = tokio::fs::try_exists(&candidate)
            .await
            .map_err(|e| StorageError::io(candidate.clone(), e))?;
        if !exists {
            debug!(sku, path = %candidate.display(), "allocated output path");
            return Ok(candidate);
        }
        trace!(path = %candidate.display(), "candidate taken");
        index += 1;
    }
}

/// Sanitizes a SKU for use as a filename stem.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |`) and control characters with `_`.
pub(crate) fn sanitize_sku(sku: &str) -> String {
    let sanitized: String = sku
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return EMPTY_SKU_STEM.to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
