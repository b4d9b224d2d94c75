//! Histogram aggregation for sorted list-mode data.
//!
//! Provides uniformly binned axes with underflow and overflow bins, dense
//! 1D and 2D histograms that can be merged cell by cell, and a registry that
//! owns the histograms of a sorting session.
//!
//! # Example
//!
//! ```
//! use sirisort_hist::{AxisSpec, HistogramRegistry};
//!
//! let mut registry = HistogramRegistry::new();
//! let h = registry.create_1d("h_e", "SiRi back", AxisSpec::new(10, 0.0, 10.0, "E"));
//! registry.fill_1d(h, 4.5, 1.0);
//!
//! let hist = registry.get_1d(h).unwrap();
//! assert_eq!(hist.entry_count(), 1);
//! assert_eq!(hist.cell(5), 1.0);
//! ```

mod axis;
mod buffer;
mod hist1d;
mod hist2d;
mod registry;

pub use axis::{Axis, AxisSpec, BinEdge};
pub use buffer::DEFAULT_FILL_BUFFER;
pub use hist1d::Histogram1D;
pub use hist2d::Histogram2D;
pub use registry::{Hist1D, Hist2D, HistogramRegistry};
