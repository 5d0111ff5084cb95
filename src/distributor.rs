//! # Block Distributor
//!
//! Hands out blocks to the worker pool, one at a time, with strictly
//! increasing, gap-free indices. The two variants share one contract:
//!
//! - `Compress`: slices a raw source stream into fixed-size blocks.
//! - `Decompress`: walks the block records of an archive stream that is
//!   already positioned past the file header.
//!
//! Callers share a distributor behind a `Mutex`; the critical section covers
//! only the read and the index bump, never a codec call. Because the cursor
//! advance happens under the same lock as the read, no two callers can see
//! the same index or overlapping bytes.

use std::io::Read;

use crate::format;
use crate::BlockzipError;

/// One unit of parallel work: a contiguous byte range of the logical source
/// and its position in the overall stream.
#[derive(Debug)]
pub struct Block {
    /// 0-based position of this block in the source. Output is ordered by
    /// this index regardless of which worker finishes first.
    pub index: u64,
    pub payload: Vec<u8>,
}

/// Sequential block issuer shared by all workers of one operation.
pub enum BlockDistributor {
    Compress {
        reader: Box<dyn Read + Send>,
        source_len: u64,
        position: u64,
        block_size: u64,
        next_index: u64,
    },
    Decompress {
        reader: Box<dyn Read + Send>,
        next_index: u64,
    },
}

impl BlockDistributor {
    /// Distributor over a raw source stream of known length, issuing blocks
    /// of `block_size` bytes (the final block may be shorter).
    pub fn for_compress<R>(reader: R, source_len: u64, block_size: u64) -> Self
    where
        R: Read + Send + 'static,
    {
        BlockDistributor::Compress {
            reader: Box::new(reader),
            source_len,
            position: 0,
            block_size,
            next_index: 0,
        }
    }

    /// Distributor over an archive stream positioned just past the header.
    pub fn for_decompress<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        BlockDistributor::Decompress {
            reader: Box::new(reader),
            next_index: 0,
        }
    }

    /// Returns the next unclaimed block, or `None` once the source is
    /// exhausted. Indices start at 0 and increase by exactly one per issued
    /// block.
    pub fn next_block(&mut self) -> Result<Option<Block>, BlockzipError> {
        match self {
            BlockDistributor::Compress {
                reader,
                source_len,
                position,
                block_size,
                next_index,
            } => {
                let remaining = source_len.saturating_sub(*position);
                if remaining == 0 {
                    return Ok(None);
                }

                let real_block_size = remaining.min(*block_size);
                let mut payload = vec![0u8; real_block_size as usize];
                reader.read_exact(&mut payload)?;
                *position += real_block_size;

                let index = *next_index;
                *next_index += 1;
                Ok(Some(Block { index, payload }))
            }
            BlockDistributor::Decompress { reader, next_index } => {
                let payload = match format::read_block_record(reader)? {
                    Some(payload) => payload,
                    None => return Ok(None),
                };

                let index = *next_index;
                *next_index += 1;
                Ok(Some(Block { index, payload }))
            }
        }
    }
}
