//! Sorting loop: blocks from a source, events through a decoder, into a sink.

use crate::prefetch::{PrefetchConfig, PrefetchingBlockSource};
use crate::sequential::SequentialBlockSource;
use crate::source::{BlockSource, Fetch, OpenStatus};
use crate::{Error, Result};
use sirisort_core::{Event, RecordBlock};
use sirisort_format::EventDecoder;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How blocks are read from the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FetchStrategy {
    /// Read on the sorting thread.
    Sequential,
    /// Read ahead on a worker thread.
    #[default]
    Prefetch,
}

/// Configuration for [`sort_file`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SortConfig {
    /// First block of the file to sort.
    pub start_block: u64,
    /// Maximum number of blocks to sort, `None` for the whole file.
    pub max_blocks: Option<u64>,
    /// Block source to use.
    pub strategy: FetchStrategy,
    /// Settings for [`FetchStrategy::Prefetch`].
    pub prefetch: PrefetchConfig,
}

impl SortConfig {
    /// Set the first block to sort.
    #[must_use]
    pub fn with_start_block(mut self, block: u64) -> Self {
        self.start_block = block;
        self
    }

    /// Limit the number of blocks to sort.
    #[must_use]
    pub fn with_max_blocks(mut self, blocks: u64) -> Self {
        self.max_blocks = Some(blocks);
        self
    }

    /// Set the block source strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the prefetch settings.
    #[must_use]
    pub fn with_prefetch(mut self, prefetch: PrefetchConfig) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Builds the block source selected by [`SortConfig::strategy`].
    #[must_use]
    pub fn make_source<B: RecordBlock>(&self, template: &B) -> Box<dyn BlockSource<Block = B>> {
        match self.strategy {
            FetchStrategy::Sequential => Box::new(SequentialBlockSource::new(template)),
            FetchStrategy::Prefetch => Box::new(PrefetchingBlockSource::new(template, &self.prefetch)),
        }
    }
}

/// Cooperative cancellation flag shared between a sorting loop and its caller.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true once [`CancelToken::cancel`] has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Receives every decoded event.
pub trait EventSink {
    /// Sorts one event.
    fn sort(&mut self, event: &Event);
}

impl<F: FnMut(&Event)> EventSink for F {
    fn sort(&mut self, event: &Event) {
        self(event);
    }
}

/// Counters of one sorting run.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SortSummary {
    /// Blocks read from the file.
    pub blocks: u64,
    /// Blocks whose decoding stopped on malformed data.
    pub bad_blocks: u64,
    /// Events handed to the sink.
    pub events: u64,
    /// Average number of data words per event.
    pub average_event_length: f64,
    /// True if the run stopped because of the cancel token.
    pub cancelled: bool,
}

/// Sorts the blocks of `path` into `sink`.
///
/// A block with malformed data is counted in [`SortSummary::bad_blocks`]; the
/// events decoded before the bad one are kept and sorting continues with the
/// next block. The cancel token is checked before every block and event.
///
/// # Errors
/// Returns an error if the file cannot be opened, or [`Error::Read`] if
/// reading a block fails.
pub fn sort_file<S, K>(
    source: &mut S,
    path: &Path,
    config: &SortConfig,
    sink: &mut K,
    cancel: &CancelToken,
) -> Result<SortSummary>
where
    S: BlockSource + ?Sized,
    K: EventSink + ?Sized,
{
    let mut summary = SortSummary::default();
    if source.open(path, config.start_block)? == OpenStatus::EndOfStream {
        debug!(path = %path.display(), start_block = config.start_block, "nothing to sort");
        return Ok(summary);
    }

    let mut decoder = EventDecoder::new();
    let mut event = Event::new();
    'blocks: while config.max_blocks.map_or(true, |max| summary.blocks < max) {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        let block_index = config.start_block + summary.blocks;
        let block = match source.next_block() {
            Ok(Fetch::Ready(block)) => block,
            Ok(Fetch::EndOfStream) => break,
            Ok(Fetch::RetryLater) => continue,
            Err(err) => {
                return Err(Error::Read {
                    block: block_index,
                    source: Box::new(err),
                })
            }
        };
        summary.blocks += 1;

        let mut cursor = decoder.set_block(block);
        loop {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break 'blocks;
            }
            match cursor.decode_next(&mut event) {
                Ok(true) => {
                    sink.sort(&event);
                    summary.events += 1;
                }
                Ok(false) => break,
                Err(err) => {
                    warn!(
                        block = block_index,
                        word = cursor.cursor(),
                        error = %err,
                        "bad block, skipping the rest of it"
                    );
                    summary.bad_blocks += 1;
                    break;
                }
            }
        }
    }

    summary.average_event_length = decoder.average_event_length();
    info!(
        path = %path.display(),
        blocks = summary.blocks,
        bad_blocks = summary.bad_blocks,
        events = summary.events,
        cancelled = summary.cancelled,
        "sorting finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_config_builders() {
        let config = SortConfig::default()
            .with_start_block(3)
            .with_max_blocks(10)
            .with_strategy(FetchStrategy::Sequential)
            .with_prefetch(PrefetchConfig::default().with_pool_size(2));
        assert_eq!(config.start_block, 3);
        assert_eq!(config.max_blocks, Some(10));
        assert_eq!(config.strategy, FetchStrategy::Sequential);
        assert_eq!(config.prefetch.pool_size, 2);
        assert_eq!(SortConfig::default().strategy, FetchStrategy::Prefetch);
    }

    #[test]
    fn test_closures_are_sinks() {
        let mut seen = 0;
        let mut sink = |_: &Event| seen += 1;
        sink.sort(&Event::new());
        sink.sort(&Event::new());
        assert_eq!(seen, 2);
    }
}
