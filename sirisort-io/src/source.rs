//! The block source interface.

use crate::Result;
use sirisort_core::RecordBlock;
use std::path::Path;

/// Result of opening a block source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenStatus {
    /// Blocks can be requested.
    Ready,
    /// The start position is at or past the end of the data.
    EndOfStream,
}

/// Result of requesting the next block.
#[derive(Debug)]
pub enum Fetch<'a, B> {
    /// The next block in file order. It stays valid until the next request.
    Ready(&'a B),
    /// The data is exhausted.
    EndOfStream,
    /// No block is available yet; only returned by non-blocking requests.
    RetryLater,
}

impl<'a, B> Fetch<'a, B> {
    /// The block, if one was delivered.
    #[must_use]
    pub fn block(self) -> Option<&'a B> {
        match self {
            Fetch::Ready(block) => Some(block),
            Fetch::EndOfStream | Fetch::RetryLater => None,
        }
    }
}

/// A stream of fixed-size blocks read from a data file.
///
/// A source delivers one block at a time. The block returned by a request is
/// borrowed from the source and released by the next request, so at most one
/// block is checked out at any time.
///
/// Errors are terminal: after a request fails, every further request fails
/// with [`crate::Error::Unusable`] until the source is opened again.
pub trait BlockSource {
    /// The block shape this source delivers.
    type Block: RecordBlock;

    /// Closes any current file and opens `path` positioned at `start_block`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or positioned.
    fn open(&mut self, path: &Path, start_block: u64) -> Result<OpenStatus>;

    /// Returns the next block, waiting for it if necessary.
    ///
    /// # Errors
    /// Returns an error if reading fails, the data ends inside a block, or the
    /// source is not open.
    fn next_block(&mut self) -> Result<Fetch<'_, Self::Block>>;

    /// Returns the next block if it is available without waiting.
    ///
    /// # Errors
    /// Same as [`BlockSource::next_block`].
    fn try_next_block(&mut self) -> Result<Fetch<'_, Self::Block>> {
        self.next_block()
    }

    /// Number of bytes in one block.
    fn block_bytes(&self) -> usize;
}

/// Byte offset of block `block` for blocks of `block_bytes` bytes.
pub(crate) fn block_offset(block: u64, block_bytes: usize) -> Option<u64> {
    block.checked_mul(u64::try_from(block_bytes).ok()?)
}
