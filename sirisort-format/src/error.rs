//! Decoding error types.

use thiserror::Error;

/// Result type for decoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Decoding error types.
///
/// Offsets are word indices into the block being decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A word where an event header was expected is not a header.
    #[error("invalid event header {word:#010x} at word {offset}")]
    BadHeader { offset: usize, word: u32 },

    /// The event length runs past the end of the block.
    #[error("event at word {offset} claims {length} words but only {available} remain")]
    Truncated {
        offset: usize,
        length: usize,
        available: usize,
    },

    /// A data word carries header bits.
    #[error("invalid data word {word:#010x} at word {offset}")]
    BadDataWord { offset: usize, word: u32 },

    /// The box id of a data word is not known.
    #[error("unknown box id {box_id:#04x} at word {offset}")]
    UnknownBox { offset: usize, box_id: u8 },

    /// A data word announcing an extension word is the last word of its event.
    #[error("missing extension word after word {offset}")]
    MissingExtension { offset: usize },

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] sirisort_core::Error),
}
