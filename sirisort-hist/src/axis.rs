//! Histogram axes.
//!
//! The bin numbering convention is the one used by ROOT:
//! - bin 0 is the underflow bin,
//! - bins `1..=bin_count` are the regular bins,
//! - bin `bin_count + 1` is the overflow bin.

use std::fmt;
use tracing::warn;

/// Coordinate types that an [`Axis`] can be built over.
///
/// The bin width of an axis must be exactly representable in its coordinate
/// type; integer axes therefore get integer bin widths.
pub trait BinEdge: Copy + PartialOrd + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Widens the coordinate for arithmetic.
    fn to_f64(self) -> f64;

    /// Narrows an `f64` into the coordinate type, truncating if needed.
    fn from_f64(value: f64) -> Self;
}

impl BinEdge for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}

impl BinEdge for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl BinEdge for i32 {
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Self {
        value as i32
    }
}

impl BinEdge for i64 {
    #[inline]
    #[allow(clippy::cast_precision_loss)]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Self {
        value as i64
    }
}

/// Construction parameters for one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec<T: BinEdge = f64> {
    /// Number of regular bins.
    pub bins: usize,
    /// Lower edge of the lowest regular bin.
    pub left: T,
    /// Upper edge of the highest regular bin.
    pub right: T,
    /// Axis title.
    pub title: String,
}

impl<T: BinEdge> AxisSpec<T> {
    /// Creates an axis specification.
    pub fn new(bins: usize, left: T, right: T, title: impl Into<String>) -> Self {
        Self {
            bins,
            left,
            right,
            title: title.into(),
        }
    }
}

/// An immutable, uniformly binned axis with underflow and overflow bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis<T: BinEdge = f64> {
    name: String,
    title: String,
    bin_count: usize,
    left: T,
    right: T,
    bin_width: T,
}

impl<T: BinEdge> Axis<T> {
    /// Creates an axis.
    ///
    /// The requested parameters are normalized rather than rejected:
    /// - fewer than one bin becomes one bin,
    /// - a bin width that the coordinate type cannot hold exactly is
    ///   truncated and `right` is moved to keep all bins equally wide,
    /// - a zero or negative bin width becomes 1 and `right` is recomputed.
    ///
    /// Each adjustment is logged as a warning.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn new(name: impl Into<String>, spec: AxisSpec<T>) -> Self {
        let name = name.into();
        let AxisSpec {
            bins,
            left,
            mut right,
            title,
        } = spec;

        let bin_count = if bins < 1 {
            warn!(axis = %name, "less than one bin requested, using 1");
            1
        } else {
            bins
        };
        let n = bin_count as f64;

        let exact = (right.to_f64() - left.to_f64()) / n;
        let mut bin_width = T::from_f64(exact);
        if bin_width.to_f64() != exact {
            right = T::from_f64(left.to_f64() + n * bin_width.to_f64());
            warn!(axis = %name, %right, "bin width not representable, adjusted right edge");
        }
        if bin_width.to_f64() <= 0.0 {
            bin_width = T::from_f64(1.0);
            right = T::from_f64(left.to_f64() + n);
            warn!(
                axis = %name,
                %right,
                %bin_width,
                "zero or negative bin width, adjusted right edge and bin width"
            );
        }

        Self {
            name,
            title,
            bin_count,
            left,
            right,
            bin_width,
        }
    }

    /// Finds the bin for coordinate `x`.
    ///
    /// `left` itself falls into bin 1, `right` into the overflow bin.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn find_bin(&self, x: T) -> usize {
        if x < self.left {
            0
        } else if x < self.right {
            let offset = (x.to_f64() - self.left.to_f64()) / self.bin_width.to_f64();
            // Rounding just below `right` must not reach the overflow bin.
            (1 + offset.floor() as usize).min(self.bin_count)
        } else {
            self.bin_count + 1
        }
    }

    /// Lower edge of bin `bin`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bin_left_edge(&self, bin: usize) -> f64 {
        (bin as f64 - 1.0) * self.bin_width.to_f64() + self.left.to_f64()
    }

    /// Upper edge of bin `bin`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bin_right_edge(&self, bin: usize) -> f64 {
        bin as f64 * self.bin_width.to_f64() + self.left.to_f64()
    }

    /// Center of bin `bin`.
    #[inline]
    #[must_use]
    pub fn bin_center(&self, bin: usize) -> f64 {
        0.5 * (self.bin_left_edge(bin) + self.bin_right_edge(bin))
    }

    /// Returns true if both axes have the same edges and bin count.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.bin_count == other.bin_count && self.left == other.left && self.right == other.right
    }

    /// The axis name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The axis title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of regular bins.
    #[inline]
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Number of bins including underflow and overflow.
    #[inline]
    #[must_use]
    pub fn total_bins(&self) -> usize {
        self.bin_count + 2
    }

    /// Lower edge of the lowest regular bin.
    #[inline]
    #[must_use]
    pub fn left(&self) -> T {
        self.left
    }

    /// Upper edge of the highest regular bin.
    #[inline]
    #[must_use]
    pub fn right(&self) -> T {
        self.right
    }

    /// Width of every regular bin.
    #[inline]
    #[must_use]
    pub fn bin_width(&self) -> T {
        self.bin_width
    }
}
