//! Zlib (deflate) payload compression.
//!
//! `compressed` records and offpage `snapshot` segments both store
//! zlib-wrapped deflate streams at the default compression level.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use log::trace;

use crate::spage::types::error::{Result, SpageError};

/// Compresses a payload into a zlib stream.
pub fn compress(payload: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(payload.len() / 2 + 16), Compression::default());
    encoder
        .write_all(payload)
        .map_err(|e| SpageError::CompressionError(format!("Zlib compression failed: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| SpageError::CompressionError(format!("Zlib compression failed: {}", e)))?;
    trace!("Compressed with Zlib: {} bytes -> {} bytes", payload.len(), compressed.len());
    Ok(compressed)
}

/// Inflates a zlib stream.
///
/// # Errors
/// Returns [`SpageError::DecompressionError`] if the payload is not a complete zlib stream.
pub fn decompress(payload: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(payload.len() * 2);
    let mut decoder = ZlibDecoder::new(payload);
    decoder
        .read_to_end(&mut output)
        .map_err(|e| SpageError::DecompressionError(format!("Zlib decompression failed: {}", e)))?;
    trace!("Decompressed with Zlib: {} bytes -> {} bytes", payload.len(), output.len());
    Ok(output)
}
