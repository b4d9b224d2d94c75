//! sirisort-core: Core block and event types for list-mode data sorting.
//!
//! This crate provides the fixed-size record blocks that are read from
//! data files and the event structure that the decoder fills from them.
//!

pub mod block;
pub mod error;
pub mod event;

pub use block::{FixedBlock, RecordBlock, SIRIUS_BLOCK_WORDS, WORD_BYTES};
pub use error::{Error, Result};
pub use event::{BoundedList, ChannelAdc, ChannelAdcTdc, ChannelScaler, Event};
