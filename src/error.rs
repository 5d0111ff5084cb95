use thiserror::Error;

/// The primary error type for all operations in the `blockzip` crate.
#[derive(Debug, Error)]
pub enum BlockzipError {
    /// An I/O error occurred, typically while reading or writing a stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source stream does not start with a valid blockzip header.
    #[error("source file is not a valid archive or is corrupted")]
    NotAnArchive,

    /// The codec failed on one block. The index identifies the block that
    /// could not be processed.
    #[error("codec failure on block {index}: {source}")]
    Codec {
        index: u64,
        source: std::io::Error,
    },

    /// The requested block size cannot be used to split a stream.
    #[error("block size must be at least 1")]
    InvalidBlockSize,

    /// The source produced more blocks than the archive header can record.
    #[error("source produced {0} blocks, which exceeds the archive format limit")]
    TooManyBlocks(u64),

    /// A worker thread panicked instead of reporting a result.
    #[error("a worker thread panicked")]
    WorkerPanic,

    /// An expected user mistake (missing source, pre-existing destination, ...).
    /// Carries a clean, short message.
    #[error("{0}")]
    User(String),
}

impl BlockzipError {
    /// True for errors a user can act on directly (bad invocation, bad input
    /// file). Everything else is unexpected: codec failures, mid-stream I/O
    /// errors, worker panics.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            BlockzipError::User(_) | BlockzipError::NotAnArchive | BlockzipError::InvalidBlockSize
        )
    }
}
