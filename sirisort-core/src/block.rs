//! Fixed-size record blocks.
//!
//! A data file is a sequence of equally sized blocks. Each block is read in
//! one piece from the backing store and then handed to the decoder, which
//! addresses it as little-endian 32-bit words.

use crate::{Error, Result};
use std::fmt;

/// Number of 32-bit words in one SiRi/CACTUS buffer (128 kB).
pub const SIRIUS_BLOCK_WORDS: usize = 0x8000;

/// Size of one data word in bytes.
pub const WORD_BYTES: usize = 4;

/// A fixed-size, word-addressable block of raw file data.
///
/// The size of a block never changes after construction. Pools of blocks are
/// created from a template instance through [`RecordBlock::new_like`], so a
/// block source never needs to know the concrete block shape.
pub trait RecordBlock: Send + 'static {
    /// Number of 32-bit words in the block.
    fn word_count(&self) -> usize;

    /// Raw block contents.
    fn as_bytes(&self) -> &[u8];

    /// Mutable raw block contents, used by readers to fill the block.
    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Creates a new, zeroed block with the same shape as `self`.
    #[must_use]
    fn new_like(&self) -> Self
    where
        Self: Sized;

    /// Number of bytes in the block.
    #[inline]
    fn byte_len(&self) -> usize {
        self.word_count() * WORD_BYTES
    }

    /// Reads the word at `idx`, or `None` past the end of the block.
    #[inline]
    fn word(&self, idx: usize) -> Option<u32> {
        let start = idx.checked_mul(WORD_BYTES)?;
        let bytes = self.as_bytes().get(start..start.checked_add(WORD_BYTES)?)?;
        bytes.try_into().ok().map(u32::from_le_bytes)
    }
}

/// A heap-allocated block with a size chosen at construction.
#[derive(Clone, PartialEq, Eq)]
pub struct FixedBlock {
    words: usize,
    data: Box<[u8]>,
}

impl FixedBlock {
    /// Creates a zeroed block of `words` 32-bit words.
    ///
    /// # Errors
    /// Returns an error if `words` is 0 or the block size overflows `usize`.
    pub fn new(words: usize) -> Result<Self> {
        let bytes = match words.checked_mul(WORD_BYTES) {
            Some(bytes) if words > 0 => bytes,
            _ => return Err(Error::InvalidBlockSize(words)),
        };
        Ok(Self {
            words,
            data: vec![0u8; bytes].into_boxed_slice(),
        })
    }

    /// Creates a zeroed block with the standard SiRi/CACTUS buffer size.
    #[must_use]
    pub fn sirius() -> Self {
        Self {
            words: SIRIUS_BLOCK_WORDS,
            data: vec![0u8; SIRIUS_BLOCK_WORDS * WORD_BYTES].into_boxed_slice(),
        }
    }

    /// Creates a block holding exactly the given words.
    ///
    /// # Errors
    /// Returns an error if `words` is empty.
    pub fn from_words(words: &[u32]) -> Result<Self> {
        let mut block = Self::new(words.len())?;
        for (chunk, word) in block.data.chunks_exact_mut(WORD_BYTES).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Ok(block)
    }

    /// Iterates over all words of the block.
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.data
            .chunks_exact(WORD_BYTES)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    }
}

impl Default for FixedBlock {
    fn default() -> Self {
        Self::sirius()
    }
}

impl fmt::Debug for FixedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBlock")
            .field("words", &self.words)
            .finish_non_exhaustive()
    }
}

impl RecordBlock for FixedBlock {
    #[inline]
    fn word_count(&self) -> usize {
        self.words
    }

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn new_like(&self) -> Self {
        Self {
            words: self.words,
            data: vec![0u8; self.data.len()].into_boxed_slice(),
        }
    }
}
