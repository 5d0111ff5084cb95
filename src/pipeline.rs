//! # Parallel Pipeline
//!
//! This module implements the orchestrator: the single-threaded coordinator
//! that turns one source stream into one destination stream.
//!
//! ## Strategy
//!
//! 1. Size the worker pool as `min(available cores, estimated blocks)`, at
//!    least 1.
//! 2. Spawn the workers over one shared [`BlockDistributor`] and one
//!    cancellation flag, all reporting into one event channel.
//! 3. Run the reassembly loop on the calling thread: park out-of-order
//!    results, flush the contiguous prefix to the destination, and stop
//!    writing the moment any worker fails. The orchestrator is the only
//!    writer to the destination, so no write locking is needed.
//! 4. Join every worker, then surface at most one error per operation.
//!
//! Completion order across workers is unordered; output order is enforced
//! solely by the ordered-flush step here.

use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{unbounded, Receiver};
use log::{debug, trace};

use crate::codec::Mode;
use crate::distributor::BlockDistributor;
use crate::format;
use crate::reorder::ReorderBuffer;
use crate::worker::{Worker, WorkerEvent};
use crate::BlockzipError;

/// Block size used when the caller does not specify one.
pub const DEFAULT_BLOCK_SIZE: u64 = 1_000_000;

/// Holds all configuration options for a compression operation.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Size of each uncompressed block in bytes. The final block of a stream
    /// may be shorter. Must be at least 1.
    pub block_size: u64,
    /// Number of worker threads to use. [0 = auto-detect based on CPU cores
    /// and the estimated block count]
    pub workers: usize,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            workers: 0,
        }
    }
}

/// Compresses `source` into a blockzip archive written to `destination`.
///
/// The destination must be seekable: a placeholder header is written before
/// the block records and rewritten with the final block count at the end.
pub fn compress<R, W>(source: R, destination: W, block_size: u64) -> Result<(), BlockzipError>
where
    R: Read + Seek + Send + 'static,
    W: Write + Seek,
{
    compress_with_options(
        source,
        destination,
        CompressOptions {
            block_size,
            workers: 0,
        },
    )
}

/// [`compress`] with an explicit worker count. Archives are byte-identical
/// for any worker count, so the override only matters for tuning and tests.
pub fn compress_with_options<R, W>(
    mut source: R,
    destination: W,
    options: CompressOptions,
) -> Result<(), BlockzipError>
where
    R: Read + Seek + Send + 'static,
    W: Write + Seek,
{
    if options.block_size == 0 {
        return Err(BlockzipError::InvalidBlockSize);
    }

    let source_len = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(0))?;

    // large buffer to reduce syscall overhead during block flushes
    let mut writer = BufWriter::with_capacity(4 * 1024 * 1024, destination);
    format::write_placeholder_header(&mut writer)?;

    // Sizing heuristic only: the distributor decides how many blocks actually
    // exist, and a short pool merely lowers parallelism.
    let block_estimate = source_len.div_ceil(options.block_size);
    let pool_size = pool_size(options.workers, block_estimate);

    let distributor = BlockDistributor::for_compress(source, source_len, options.block_size);
    let block_count = run_pool(Mode::Compress, distributor, pool_size, &mut writer)?;

    format::write_final_header(&mut writer, block_count)?;
    writer.flush()?;
    Ok(())
}

/// Decompresses a blockzip archive from `source` into `destination`.
///
/// Fails with [`BlockzipError::NotAnArchive`] if the stream does not start
/// with a valid header; in that case not a single byte is written.
pub fn decompress<R, W>(mut source: R, destination: W) -> Result<(), BlockzipError>
where
    R: Read + Send + 'static,
    W: Write,
{
    let block_count = format::read_header(&mut source)?;
    let pool_size = pool_size(0, block_count);

    let mut writer = BufWriter::with_capacity(4 * 1024 * 1024, destination);
    let distributor = BlockDistributor::for_decompress(source);
    run_pool(Mode::Decompress, distributor, pool_size, &mut writer)?;

    writer.flush()?;
    Ok(())
}

/// `min(available parallelism, block estimate)`, minimum 1, unless the
/// caller pinned an explicit count.
fn pool_size(requested: usize, block_estimate: u64) -> usize {
    if requested > 0 {
        return requested;
    }
    (num_cpus::get() as u64).min(block_estimate).max(1) as usize
}

/// Spawns the pool, reassembles its output, joins every worker, and returns
/// the number of blocks flushed to the destination.
fn run_pool<W: Write>(
    mode: Mode,
    distributor: BlockDistributor,
    pool_size: usize,
    writer: &mut W,
) -> Result<u64, BlockzipError> {
    let distributor = Arc::new(Mutex::new(distributor));
    let cancel = Arc::new(AtomicBool::new(false));
    let (event_tx, event_rx) = unbounded::<WorkerEvent>();

    debug!("starting {pool_size} workers ({mode:?})");
    let mut handles = Vec::with_capacity(pool_size);
    for id in 0..pool_size {
        let worker = Worker::new(
            id,
            mode,
            Arc::clone(&distributor),
            Arc::clone(&cancel),
            event_tx.clone(),
        );
        handles.push(worker.start());
    }
    // The reassembly loop must end once every worker is gone.
    drop(event_tx);

    let (flushed, mut captured) = reassemble(mode, &event_rx, pool_size, &cancel, writer);

    // Confirm every worker has stopped before surfacing the error; nothing
    // can touch the destination after this point.
    for handle in handles {
        if handle.join().is_err() {
            cancel.store(true, Ordering::SeqCst);
            captured.get_or_insert(BlockzipError::WorkerPanic);
        }
    }

    match captured {
        Some(e) => Err(e),
        None => Ok(flushed),
    }
}

/// Single-threaded reassembly: waits for worker events, drains the pending
/// set in ascending index order, and captures the first error. Returns the
/// count of flushed blocks and the captured error, if any.
fn reassemble<W: Write>(
    mode: Mode,
    events: &Receiver<WorkerEvent>,
    pool_size: usize,
    cancel: &AtomicBool,
    writer: &mut W,
) -> (u64, Option<BlockzipError>) {
    let mut pending = ReorderBuffer::new();
    let mut running = pool_size;
    let mut captured: Option<BlockzipError> = None;

    while running > 0 {
        let event = match events.recv() {
            Ok(event) => event,
            // Cancelled workers exit without a final event; the dropped
            // senders end the loop instead.
            Err(_) => break,
        };

        match event {
            WorkerEvent::Result(block) => {
                if captured.is_some() {
                    continue;
                }
                pending.insert(block.index, block.payload);
                if let Err(e) = flush_ready(mode, &mut pending, writer) {
                    cancel.store(true, Ordering::SeqCst);
                    captured = Some(e);
                }
            }
            WorkerEvent::Finished => running -= 1,
            WorkerEvent::Failed(e) => {
                running -= 1;
                if captured.is_none() {
                    cancel.store(true, Ordering::SeqCst);
                    captured = Some(e);
                } else {
                    debug!("discarding secondary worker error: {e}");
                }
            }
        }
    }

    debug_assert!(
        captured.is_some() || pending.is_empty(),
        "workers finished but {} blocks never became contiguous",
        pending.len()
    );
    (pending.next_expected(), captured)
}

/// Flushes the contiguous prefix of pending results to the destination.
fn flush_ready<W: Write>(
    mode: Mode,
    pending: &mut ReorderBuffer,
    writer: &mut W,
) -> Result<(), BlockzipError> {
    while let Some((index, payload)) = pending.pop_ready() {
        match mode {
            Mode::Compress => format::write_block_record(writer, &payload)?,
            Mode::Decompress => writer.write_all(&payload)?,
        }
        trace!("flushed block {index} ({} bytes)", payload.len());
    }
    Ok(())
}
