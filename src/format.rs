//! # Archive Format
//!
//! This module defines the on-disk layout of a blockzip archive and the logic
//! for encoding and decoding its header and block records.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! offset 0:  u8 length | check-string bytes ("BlockzipArchive")
//! next 4:    i32 block_count
//! repeated block_count times:
//!     i64 compressed_len
//!     compressed_len bytes of codec output
//! ```
//!
//! Compression writes a placeholder header first (spaces instead of the check
//! string, block count 0), streams the block records, then seeks back to
//! offset 0 and rewrites the real header. The placeholder occupies exactly
//! [`HEADER_LEN`] bytes, so the rewrite never shifts block data.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::BlockzipError;

/// Marker written at the start of every archive. A stream that does not
/// begin with this string is rejected before any block is read.
pub const CHECK_STRING: &str = "BlockzipArchive";

/// Total header size: length byte + check string + i32 block count.
pub const HEADER_LEN: u64 = 1 + CHECK_STRING.len() as u64 + 4;

/// Writes the placeholder header reserving space for the final one.
pub fn write_placeholder_header<W: Write>(writer: &mut W) -> io::Result<()> {
    writer.write_all(&[CHECK_STRING.len() as u8])?;
    writer.write_all(&vec![b' '; CHECK_STRING.len()])?;
    writer.write_all(&0i32.to_le_bytes())
}

/// Seeks back to offset 0 and overwrites the placeholder with the check
/// string and the final block count.
pub fn write_final_header<W: Write + Seek>(
    writer: &mut W,
    block_count: u64,
) -> Result<(), BlockzipError> {
    let count = i32::try_from(block_count).map_err(|_| BlockzipError::TooManyBlocks(block_count))?;
    writer.seek(SeekFrom::Start(0))?;
    writer.write_all(&[CHECK_STRING.len() as u8])?;
    writer.write_all(CHECK_STRING.as_bytes())?;
    writer.write_all(&count.to_le_bytes())?;
    Ok(())
}

/// Reads and validates the archive header, returning the recorded block
/// count.
///
/// Any mismatch (wrong length byte, wrong check string, short read, or a
/// negative count) is reported as [`BlockzipError::NotAnArchive`]; a
/// damaged header and a non-archive file are indistinguishable here.
pub fn read_header<R: Read>(reader: &mut R) -> Result<u64, BlockzipError> {
    let mut len_buf = [0u8; 1];
    reader
        .read_exact(&mut len_buf)
        .map_err(|_| BlockzipError::NotAnArchive)?;
    if len_buf[0] as usize != CHECK_STRING.len() {
        return Err(BlockzipError::NotAnArchive);
    }

    let mut check_buf = vec![0u8; CHECK_STRING.len()];
    reader
        .read_exact(&mut check_buf)
        .map_err(|_| BlockzipError::NotAnArchive)?;
    if check_buf != CHECK_STRING.as_bytes() {
        return Err(BlockzipError::NotAnArchive);
    }

    let mut count_buf = [0u8; 4];
    reader
        .read_exact(&mut count_buf)
        .map_err(|_| BlockzipError::NotAnArchive)?;
    let count = i32::from_le_bytes(count_buf);
    if count < 0 {
        return Err(BlockzipError::NotAnArchive);
    }
    Ok(count as u64)
}

/// Writes one block record: i64 length prefix followed by the payload.
pub fn write_block_record<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    writer.write_all(&(payload.len() as i64).to_le_bytes())?;
    writer.write_all(payload)
}

/// Reads the next block record, or `None` on a clean end of stream.
///
/// End of stream is only clean *before* the length prefix; a truncated
/// prefix or payload is a mid-stream I/O error, not a sentinel.
pub fn read_block_record<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, BlockzipError> {
    let mut len_buf = [0u8; 8];
    if !read_exact_or_eof(reader, &mut len_buf)? {
        return Ok(None);
    }

    let len = i64::from_le_bytes(len_buf);
    if len < 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("negative block length {len} in archive"),
        )
        .into());
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    Ok(Some(payload))
}

/// Fills `buf` completely, or returns `Ok(false)` if the stream ended before
/// the first byte. A partial fill is an `UnexpectedEof` error.
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "archive ended in the middle of a block record",
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}
