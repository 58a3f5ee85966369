//! Image encoding: page image file → base64 string.
//!
//! Vision APIs accept images as base64 data-URIs embedded in the JSON
//! request body. The rasteriser that produced the PNG lives outside this
//! crate; this stage only reads the finished file and encodes it. The read
//! is async (`tokio::fs`) so a completion call suspends here rather than
//! blocking the runtime on disk I/O.

use crate::error::CompletionError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Read an image file and return its base64 representation.
///
/// # Errors
/// [`CompletionError::ImageRead`] when the file is missing or unreadable;
/// the underlying `io::Error` is preserved as `source`.
pub async fn encode_image_to_base64(path: &Path) -> Result<String, CompletionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CompletionError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;

    let b64 = STANDARD.encode(&bytes);
    debug!("Encoded {} → {} bytes base64", path.display(), b64.len());
    Ok(b64)
}
