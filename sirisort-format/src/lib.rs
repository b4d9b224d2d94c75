//! sirisort-format: SiRi/CACTUS list-mode word layout and event decoder.
//!
//! # Key Components
//!
//! - [`DataWord`] / [`BoxId`] - bit field extraction for single words
//! - [`EventDecoder`] - turns a [`RecordBlock`](sirisort_core::RecordBlock) into [`Event`](sirisort_core::Event)s
//!
//! # Block Layout
//!
//! A block is a sequence of events. Each event is a header word holding the
//! number of data words that follow, then the data words themselves. A zero
//! header word or the end of the block ends the block.

mod decoder;
mod error;
pub mod word;

pub use decoder::{BlockDecoder, DecodeStatus, EventDecoder};
pub use error::{Error, Result};
pub use word::{BoxId, DataWord};
