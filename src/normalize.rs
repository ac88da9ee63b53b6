//! Image format detection and JPEG normalization.
//!
//! The format is sniffed from the downloaded bytes, never from the URL.
//! Web formats (JPEG, PNG, GIF) are stored untouched; any other recognized
//! image format is decoded and re-encoded as JPEG. Bytes with no recognized
//! image signature are stored untouched under `.jpg`, so non-JPEG content
//! in that bucket ends up mis-tagged.
//!
//! AVIF and HEIF are sniffed as images but the `image` crate cannot decode
//! them, so those rows fail with [`NormalizeError::Transcode`].

use image::ImageError;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;
use tracing::{debug, instrument};

/// Extensions stored without transcoding.
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

/// Extension used for transcoded and unrecognized content.
pub const FALLBACK_EXTENSION: &str = ".jpg";

/// JPEG quality used when transcoding.
pub const JPEG_QUALITY: u8 = 80;

/// Image type sniffed from content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedFormat {
    /// Extension without the leading dot, e.g. `png`.
    pub extension: String,
    /// Whether the bytes can be stored as-is.
    pub accepted: bool,
}

/// Bytes ready to be written, plus the extension to write them under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// Final file content.
    pub bytes: Vec<u8>,
    /// Extension including the leading dot, e.g. `.png`.
    pub extension: String,
    /// Whether `bytes` were produced by re-encoding to JPEG.
    pub transcoded: bool,
}

/// Errors produced while normalizing image bytes.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Decoding the source image or encoding the JPEG failed.
    #[error("failed to convert {format} image to JPEG: {source}")]
    Transcode {
        /// Detected source format.
        format: String,
        /// The underlying codec error.
        #[source]
        source: ImageError,
    },
}

/// Sniffs the image type from magic numbers.
///
/// Returns `None` when the content carries no known image signature
/// (including non-image signatures such as PDF or ZIP).
#[must_use]
pub fn detect_format(bytes: &[u8]) -> Option<DetectedFormat> {
    let kind = infer::get(bytes)?;
    if kind.matcher_type() != infer::MatcherType::Image {
        return None;
    }
    let extension = kind.extension().to_string();
    let accepted = ACCEPTED_EXTENSIONS.contains(&extension.as_str());
    Some(DetectedFormat {
        extension,
        accepted,
    })
}

/// Decides the final bytes and extension for downloaded image content.
///
/// # Errors
///
/// Returns [`NormalizeError::Transcode`] if a recognized non-web format
/// cannot be decoded or re-encoded.
#[instrument(level = "debug", skip(bytes), fields(input_bytes = bytes.len()))]
pub fn normalize(bytes: Vec<u8>) -> Result<NormalizedImage, NormalizeError> {
    let Some(format) = detect_format(&bytes) else {
        debug!("no image signature found, storing as-is");
        return Ok(NormalizedImage {
            bytes,
            extension: FALLBACK_EXTENSION.to_string(),
            transcoded: false,
        });
    };

    if format.accepted {
        debug!(format = %format.extension, "accepted format, storing as-is");
        return Ok(NormalizedImage {
            bytes,
            extension: format!(".{}", format.extension),
            transcoded: false,
        });
    }

    debug!(format = %format.extension, "transcoding to JPEG");
    let jpeg = transcode_to_jpeg(&bytes).map_err(|source| NormalizeError::Transcode {
        format: format.extension.clone(),
        source,
    })?;
    Ok(NormalizedImage {
        bytes: jpeg,
        extension: FALLBACK_EXTENSION.to_string(),
        transcoded: true,
    })
}

/// Decodes any format the `image` crate supports and encodes it as JPEG.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
fn transcode_to_jpeg(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = decoded.to_rgb8();
    let mut out = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))?;
    Ok(out)
}
