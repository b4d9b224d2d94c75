//! sirisort-io: Block sources and file I/O for sirisort.
//!
//! This crate reads fixed-size blocks from raw or gzip-compressed data files,
//! either on the calling thread or ahead of the consumer on a worker thread,
//! and drives the decoder over them.
//!

mod error;
pub mod pipeline;
mod prefetch;
mod reader;
mod ring;
mod sequential;
mod source;

pub use error::{Error, Result};
pub use pipeline::{sort_file, CancelToken, EventSink, FetchStrategy, SortConfig, SortSummary};
pub use prefetch::{PrefetchConfig, PrefetchingBlockSource, DEFAULT_POOL_SIZE};
pub use reader::{is_gzip, FileReader, ReadOutcome};
pub use sequential::SequentialBlockSource;
pub use source::{BlockSource, Fetch, OpenStatus};
