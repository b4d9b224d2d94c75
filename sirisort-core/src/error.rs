//! Error types for sirisort-core.

use thiserror::Error;

/// Result type alias for sirisort operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for sirisort operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A bounded event list has no room left.
    #[error("event list '{list}' is full (capacity {capacity})")]
    CapacityExceeded {
        /// Name of the list that overflowed.
        list: &'static str,
        /// Fixed capacity of that list.
        capacity: usize,
    },

    /// A block must hold at least one word.
    #[error("invalid block size: {0} words")]
    InvalidBlockSize(usize),
}
