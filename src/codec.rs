//! Gzip codec primitive for single in-memory blocks.
//!
//! The rest of the pipeline treats this module as opaque: one buffer in, one
//! buffer out. Each block is a complete gzip member, so blocks can be encoded
//! and decoded independently of each other.

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Direction of an operation. Selects the distributor variant and the codec
/// direction for every worker of that operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Raw source bytes in, gzip members out.
    Compress,
    /// Gzip members in, raw bytes out.
    Decompress,
}

/// Compresses one block into a standalone gzip member.
pub fn compress_block(payload: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    encoder.finish()
}

/// Decompresses one gzip member back into raw bytes.
///
/// The whole member is consumed; trailing garbage or a failed CRC check
/// surfaces as an error.
pub fn decompress_block(payload: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(payload);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Applies the codec in the given direction.
pub fn apply(mode: Mode, payload: &[u8]) -> io::Result<Vec<u8>> {
    match mode {
        Mode::Compress => compress_block(payload),
        Mode::Decompress => decompress_block(payload),
    }
}
