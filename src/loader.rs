//! Program image reading.
//!
//! Images are flat sequences of 32-bit words stored big-endian on
//! disk. Byte order inside the simulated memory is the memory's own
//! little-endian contract; the conversion happens here, once, at load
//! time.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::LoaderError;

/// Reads a big-endian program image into host-order words.
pub fn read_image(path: &Path) -> Result<Vec<u32>, LoaderError> {
    let bytes = fs::read(path)
        .map_err(|e| LoaderError::FileReadError(path.to_path_buf(), e))?;

    if bytes.len() % 4 != 0 {
        return Err(LoaderError::TruncatedImage(path.to_path_buf(), bytes.len()));
    }

    let words = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect::<Vec<_>>();
    info!(path = %path.display(), words = words.len(), "image read");
    Ok(words)
}
