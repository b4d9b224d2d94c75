//! Block source that reads ahead on a worker thread.
//!
//! A fixed pool of blocks cycles between two queues guarded by one mutex:
//!
//! ```text
//! free --(worker claims)--> being filled --(read ok)--> ready
//!   ^                                                     |
//!   +----(next request)---- checked out <--(consumer)-----+
//! ```
//!
//! The worker sleeps on `space_available` while every block is ready or
//! checked out, so it never runs more than the pool size ahead of the
//! consumer. The consumer sleeps on `data_available` while nothing is ready.
//! Reading from the file happens outside the lock.
//!
//! Exactly one worker exists per open source. `stop` and `open` join it before
//! touching the queues again.

use crate::reader::{FileReader, ReadOutcome};
use crate::ring::SlotQueue;
use crate::sequential::StreamState;
use crate::source::{block_offset, BlockSource, Fetch, OpenStatus};
use crate::{Error, Result};
use parking_lot::{Condvar, Mutex};
use sirisort_core::RecordBlock;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of blocks in the prefetch pool.
pub const DEFAULT_POOL_SIZE: usize = 8;

/// Configuration for [`PrefetchingBlockSource`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrefetchConfig {
    /// Number of blocks the worker may read ahead.
    pub pool_size: usize,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl PrefetchConfig {
    /// Set the pool size.
    ///
    /// Values less than 1 are clamped to 1. Use [`Self::try_with_pool_size`]
    /// to surface invalid values as an error instead.
    #[must_use]
    pub fn with_pool_size(mut self, blocks: usize) -> Self {
        self.pool_size = blocks.max(1);
        self
    }

    /// Fallible variant of [`Self::with_pool_size`].
    ///
    /// # Errors
    /// Returns an error if `blocks` is 0.
    pub fn try_with_pool_size(mut self, blocks: usize) -> Result<Self> {
        if blocks == 0 {
            return Err(Error::InvalidFormat(
                "pool_size must be at least 1".to_string(),
            ));
        }
        self.pool_size = blocks;
        Ok(self)
    }

    /// Return the configured pool size, clamped to at least 1.
    #[must_use]
    pub fn effective_pool_size(&self) -> usize {
        self.pool_size.max(1)
    }
}

struct State<B> {
    free: SlotQueue<B>,
    ready: SlotQueue<B>,
    /// Written by the consumer only.
    cancel_requested: bool,
    /// Written by the worker only.
    stream_finished: bool,
    error: Option<Error>,
}

struct Shared<B> {
    state: Mutex<State<B>>,
    space_available: Condvar,
    data_available: Condvar,
}

/// Returns a block to `queue`. Both queues hold the whole pool, so this only
/// drops the block if the pool accounting is broken.
fn recycle<B>(queue: &mut SlotQueue<B>, block: B) {
    if queue.push(block).is_err() {
        error!(capacity = queue.capacity(), "prefetch queue overflow, dropping block");
    }
}

fn worker_loop<B: RecordBlock>(shared: &Shared<B>, mut reader: FileReader) {
    debug!(path = %reader.path().display(), "prefetch worker started");
    loop {
        let mut block = {
            let mut state = shared.state.lock();
            while state.free.is_empty() && !state.cancel_requested {
                shared.space_available.wait(&mut state);
            }
            if state.cancel_requested {
                break;
            }
            // The wait above leaves at least one free block.
            let Some(block) = state.free.pop() else {
                continue;
            };
            block
        };

        let outcome = reader.read_block(block.as_bytes_mut());

        let mut state = shared.state.lock();
        let finished = match outcome {
            Ok(ReadOutcome::Filled) => {
                recycle(&mut state.ready, block);
                false
            }
            Ok(ReadOutcome::End) => {
                recycle(&mut state.free, block);
                true
            }
            Err(err) => {
                warn!(path = %reader.path().display(), error = %err, "prefetch read failed");
                recycle(&mut state.free, block);
                state.error = Some(err);
                true
            }
        };
        if finished {
            state.stream_finished = true;
        }
        drop(state);
        shared.data_available.notify_one();
        if finished {
            break;
        }
    }
    reader.close();
    debug!("prefetch worker exiting");
}

/// Reads blocks ahead of the consumer on one worker thread.
///
/// The worker is started by the first request after [`BlockSource::open`], or
/// explicitly with [`PrefetchingBlockSource::start`]. Blocks are delivered in
/// file order. The block returned by a request goes back to the pool on the
/// next request.
pub struct PrefetchingBlockSource<B: RecordBlock> {
    shared: Arc<Shared<B>>,
    checked_out: Option<B>,
    pending: Option<FileReader>,
    worker: Option<JoinHandle<()>>,
    state: StreamState,
    pool_size: usize,
    block_bytes: usize,
}

impl<B: RecordBlock> PrefetchingBlockSource<B> {
    /// Creates a closed source with a pool of blocks shaped like `template`.
    #[must_use]
    pub fn new(template: &B, config: &PrefetchConfig) -> Self {
        let pool_size = config.effective_pool_size();
        let mut free = SlotQueue::new(pool_size);
        for _ in 0..pool_size {
            recycle(&mut free, template.new_like());
        }
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    free,
                    ready: SlotQueue::new(pool_size),
                    cancel_requested: false,
                    stream_finished: false,
                    error: None,
                }),
                space_available: Condvar::new(),
                data_available: Condvar::new(),
            }),
            checked_out: None,
            pending: None,
            worker: None,
            state: StreamState::Closed,
            pool_size,
            block_bytes: template.byte_len(),
        }
    }

    /// Starts the worker if the source is open and it is not running yet.
    ///
    /// Aborts the process if the worker thread cannot be spawned.
    pub fn start(&mut self) {
        let Some(reader) = self.pending.take() else {
            return;
        };
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("sirisort-prefetch".to_string())
            .spawn(move || worker_loop(&shared, reader));
        match spawned {
            Ok(handle) => self.worker = Some(handle),
            Err(err) => {
                error!(error = %err, "failed to spawn prefetch worker");
                std::process::abort();
            }
        }
    }

    /// Stops the worker, waits for it to exit and closes the file.
    ///
    /// The source must be opened again before the next request.
    pub fn stop(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.shared.state.lock().cancel_requested = true;
            self.shared.space_available.notify_all();
            Self::join(handle);
        }
        self.pending = None;
        self.reclaim();
        self.state = StreamState::Closed;
    }

    /// Number of blocks read ahead and waiting for the consumer.
    #[must_use]
    pub fn queued_blocks(&self) -> usize {
        self.shared.state.lock().ready.len()
    }

    /// Number of blocks in the pool.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn join(handle: JoinHandle<()>) {
        if handle.join().is_err() {
            error!("prefetch worker panicked");
        }
    }

    /// Puts every block back into the free queue and clears the flags.
    /// Only called while no worker is running.
    fn reclaim(&mut self) {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        for block in state.ready.drain() {
            recycle(&mut state.free, block);
        }
        if let Some(block) = self.checked_out.take() {
            recycle(&mut state.free, block);
        }
        state.cancel_requested = false;
        state.stream_finished = false;
        state.error = None;
    }

    fn end_read(&mut self) {
        if let Some(block) = self.checked_out.take() {
            recycle(&mut self.shared.state.lock().free, block);
            self.shared.space_available.notify_one();
        }
    }

    fn begin_read(&mut self, wait: bool) -> Result<Fetch<'_, B>> {
        let mut state = self.shared.state.lock();
        if wait {
            while state.ready.is_empty() && !state.stream_finished {
                self.shared.data_available.wait(&mut state);
            }
        }
        let next = state.ready.pop();
        if let Some(block) = next {
            drop(state);
            return Ok(Fetch::Ready(self.checked_out.insert(block)));
        }
        if !state.stream_finished {
            return Ok(Fetch::RetryLater);
        }
        let failure = state.error.take();
        drop(state);

        if let Some(handle) = self.worker.take() {
            Self::join(handle);
        }
        match failure {
            Some(err) => {
                self.state = StreamState::Failed;
                Err(err)
            }
            None => {
                self.state = StreamState::Finished;
                Ok(Fetch::EndOfStream)
            }
        }
    }

    fn fetch(&mut self, wait: bool) -> Result<Fetch<'_, B>> {
        self.end_read();
        match self.state {
            StreamState::Closed => Err(Error::NotOpen),
            StreamState::Failed => Err(Error::Unusable),
            StreamState::Finished => Ok(Fetch::EndOfStream),
            StreamState::Streaming => {
                self.start();
                self.begin_read(wait)
            }
        }
    }
}

impl<B: RecordBlock> BlockSource for PrefetchingBlockSource<B> {
    type Block = B;

    fn open(&mut self, path: &Path, start_block: u64) -> Result<OpenStatus> {
        self.stop();
        let offset = block_offset(start_block, self.block_bytes)
            .ok_or_else(|| Error::InvalidFormat(format!("start block {start_block} out of range")))?;

        let mut reader = FileReader::open(path)?;
        if !reader.seek(offset)? {
            reader.close();
            self.state = StreamState::Finished;
            return Ok(OpenStatus::EndOfStream);
        }
        debug!(path = %path.display(), start_block, pool = self.pool_size, "opened prefetching source");
        self.pending = Some(reader);
        self.state = StreamState::Streaming;
        Ok(OpenStatus::Ready)
    }

    fn next_block(&mut self) -> Result<Fetch<'_, B>> {
        self.fetch(true)
    }

    fn try_next_block(&mut self) -> Result<Fetch<'_, B>> {
        self.fetch(false)
    }

    fn block_bytes(&self) -> usize {
        self.block_bytes
    }
}

impl<B: RecordBlock> Drop for PrefetchingBlockSource<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_clamps_pool_size() {
        assert_eq!(PrefetchConfig::default().effective_pool_size(), 8);
        assert_eq!(PrefetchConfig::default().with_pool_size(0).pool_size, 1);
        assert!(PrefetchConfig::default().try_with_pool_size(0).is_err());
        assert_eq!(
            PrefetchConfig::default()
                .try_with_pool_size(3)
                .unwrap()
                .effective_pool_size(),
            3
        );
    }

    #[test]
    fn test_closed_source_rejects_requests() {
        let template = sirisort_core::FixedBlock::new(4).unwrap();
        let mut source = PrefetchingBlockSource::new(&template, &PrefetchConfig::default());
        assert!(matches!(source.next_block(), Err(Error::NotOpen)));
        assert_eq!(source.queued_blocks(), 0);
        source.stop();
        assert!(matches!(source.try_next_block(), Err(Error::NotOpen)));
    }
}
