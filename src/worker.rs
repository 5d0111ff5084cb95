//! # Worker
//!
//! One pool slot. Each worker owns a thread that repeatedly pulls a block
//! from the shared distributor, applies the codec, and reports the result to
//! the orchestrator over a channel. Cancellation is cooperative: the flag is
//! checked before fetching a block and again right after every codec call;
//! an in-flight codec call is never interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use log::debug;

use crate::codec::{self, Mode};
use crate::distributor::BlockDistributor;
use crate::BlockzipError;

/// Codec output for one block, handed to the orchestrator for ordered
/// flushing.
#[derive(Debug)]
pub struct ProcessedBlock {
    pub index: u64,
    pub payload: Vec<u8>,
}

/// Message type sent from worker threads to the orchestrator.
pub enum WorkerEvent {
    /// One block has been processed and is ready for reassembly.
    Result(ProcessedBlock),
    /// The distributor returned the sentinel; this worker is done.
    Finished,
    /// The worker hit a codec or I/O failure and has stopped.
    Failed(BlockzipError),
}

/// How a worker's processing loop ended.
enum LoopExit {
    /// Clean exit: source drained, or cancellation seen before a fetch.
    Drained,
    /// Cancellation seen right after a codec call; the result was discarded
    /// and no event may follow.
    Cancelled,
}

/// A single slot of the worker pool.
pub struct Worker {
    id: usize,
    mode: Mode,
    distributor: Arc<Mutex<BlockDistributor>>,
    cancel: Arc<AtomicBool>,
    events: Sender<WorkerEvent>,
}

impl Worker {
    pub fn new(
        id: usize,
        mode: Mode,
        distributor: Arc<Mutex<BlockDistributor>>,
        cancel: Arc<AtomicBool>,
        events: Sender<WorkerEvent>,
    ) -> Self {
        Self {
            id,
            mode,
            distributor,
            cancel,
            events,
        }
    }

    /// Begins independent execution on a new thread.
    pub fn start(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(self) {
        match self.process_blocks() {
            Ok(LoopExit::Drained) => {
                debug!("worker {} finished", self.id);
                // Send failure only means the orchestrator already went away.
                let _ = self.events.send(WorkerEvent::Finished);
            }
            Ok(LoopExit::Cancelled) => {
                debug!("worker {} stopped on cancellation", self.id);
            }
            Err(e) => {
                if self.cancel.load(Ordering::SeqCst) {
                    // Another worker already failed; this is expected shutdown noise.
                    debug!("worker {} error after cancellation: {e}", self.id);
                    return;
                }
                let _ = self.events.send(WorkerEvent::Failed(e));
            }
        }
    }

    fn process_blocks(&self) -> Result<LoopExit, BlockzipError> {
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                return Ok(LoopExit::Drained);
            }

            let block = match self.next_block()? {
                Some(block) => block,
                None => return Ok(LoopExit::Drained),
            };

            let payload = codec::apply(self.mode, &block.payload).map_err(|source| {
                BlockzipError::Codec {
                    index: block.index,
                    source,
                }
            })?;

            // Re-check after the codec call: a cancelled operation must not
            // receive further results.
            if self.cancel.load(Ordering::SeqCst) {
                return Ok(LoopExit::Cancelled);
            }

            let result = ProcessedBlock {
                index: block.index,
                payload,
            };
            if self.events.send(WorkerEvent::Result(result)).is_err() {
                return Ok(LoopExit::Cancelled);
            }
        }
    }

    fn next_block(&self) -> Result<Option<crate::distributor::Block>, BlockzipError> {
        let mut distributor = self
            .distributor
            .lock()
            .map_err(|_| BlockzipError::WorkerPanic)?;
        distributor.next_block()
    }
}
