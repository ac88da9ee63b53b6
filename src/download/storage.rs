//! Writes finished image bytes to their allocated path.

use std::path::Path;

use tracing::{debug, instrument};

use super::error::StorageError;

/// Writes `bytes` to `path`, creating or truncating the file.
///
/// This is a direct write without temp-file-and-rename; the allocator has
/// already picked a path that did not exist.
///
/// # Errors
///
/// Returns [`StorageError::Io`] if the file cannot be created or written
/// (missing directory, permission denied, disk full).
#[instrument(level = "debug", skip(bytes), fields(path = %path.display(), bytes = bytes.len()))]
pub async fn write_image(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    debug!("image written");
    Ok(())
}
