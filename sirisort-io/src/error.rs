//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data ended in the middle of a block.
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    /// The source was used before `open` succeeded.
    #[error("block source is not open")]
    NotOpen,

    /// A previous read failed; the source must be reopened.
    #[error("block source failed earlier and must be reopened")]
    Unusable,

    /// Invalid file or configuration.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Reading block `block` of a sorting run failed.
    #[error("failed to read block {block}: {source}")]
    Read {
        block: u64,
        #[source]
        source: Box<Error>,
    },

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] sirisort_core::Error),
}
