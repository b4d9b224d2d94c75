//! One-dimensional histograms.

use crate::axis::{Axis, AxisSpec};
use crate::buffer::FillBuffer;
use std::borrow::Cow;

/// A one-dimensional histogram with `f64` bin contents.
///
/// Cells are indexed like the axis bins: cell 0 is the underflow bin and cell
/// `bin_count + 1` the overflow bin.
#[derive(Debug, Clone)]
pub struct Histogram1D {
    name: String,
    title: String,
    xaxis: Axis,
    entries: u64,
    data: Vec<f64>,
    buffer: Option<FillBuffer<f64>>,
}

impl Histogram1D {
    /// Creates an empty histogram. The axis is named `<name>_xaxis`.
    #[must_use]
    pub fn new(name: impl Into<String>, title: impl Into<String>, x: AxisSpec) -> Self {
        let name = name.into();
        let xaxis = Axis::new(format!("{name}_xaxis"), x);
        Self {
            data: vec![0.0; xaxis.total_bins()],
            name,
            title: title.into(),
            xaxis,
            entries: 0,
            buffer: None,
        }
    }

    /// Holds back up to `capacity` fills and applies them in batches.
    ///
    /// Every read sees buffered fills, so this only changes throughput.
    #[must_use]
    pub fn with_fill_buffer(mut self, capacity: usize) -> Self {
        self.flush();
        self.buffer = Some(FillBuffer::new(capacity));
        self
    }

    /// Adds 1 to the bin containing `x`.
    #[inline]
    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    /// Adds `weight` to the bin containing `x` and counts one entry.
    ///
    /// Coordinates outside the axis range go to the underflow or overflow bin.
    #[inline]
    pub fn fill_weighted(&mut self, x: f64, weight: f64) {
        match self.buffer.as_mut() {
            Some(buffer) => {
                if buffer.push(x, weight) {
                    self.flush();
                }
            }
            None => self.fill_direct(x, weight),
        }
    }

    /// Applies all buffered fills.
    pub fn flush(&mut self) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        for (x, weight) in buffer.drain() {
            self.data[self.xaxis.find_bin(x)] += weight;
            self.entries += 1;
        }
    }

    /// Content of cell `bin`, 0 for bins outside the histogram.
    #[must_use]
    pub fn cell(&self, bin: usize) -> f64 {
        let Some(&stored) = self.data.get(bin) else {
            return 0.0;
        };
        match &self.buffer {
            Some(buffer) if !buffer.is_empty() => {
                stored
                    + buffer
                        .iter()
                        .filter(|(x, _)| self.xaxis.find_bin(*x) == bin)
                        .map(|(_, weight)| weight)
                        .sum::<f64>()
            }
            _ => stored,
        }
    }

    /// Overwrites cell `bin`; bins outside the histogram are ignored.
    pub fn set_cell(&mut self, bin: usize, value: f64) {
        self.flush();
        if let Some(cell) = self.data.get_mut(bin) {
            *cell = value;
        }
    }

    /// All cells including underflow and overflow.
    #[must_use]
    pub fn cells(&self) -> Cow<'_, [f64]> {
        match &self.buffer {
            Some(buffer) if !buffer.is_empty() => {
                let mut data = self.data.clone();
                for &(x, weight) in buffer.iter() {
                    data[self.xaxis.find_bin(x)] += weight;
                }
                Cow::Owned(data)
            }
            _ => Cow::Borrowed(&self.data),
        }
    }

    /// Zeroes every cell and the entry count.
    pub fn reset(&mut self) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.clear();
        }
        self.data.fill(0.0);
        self.entries = 0;
    }

    /// Adds `scale` times the cells of `other`.
    ///
    /// Nothing happens unless `other` has the same name and axis shape.
    /// Returns true if the contents were added. The entry count is not changed.
    pub fn merge(&mut self, other: &Histogram1D, scale: f64) -> bool {
        if other.name != self.name || !other.xaxis.same_shape(&self.xaxis) {
            return false;
        }
        self.flush();
        for (mine, theirs) in self.data.iter_mut().zip(other.cells().iter()) {
            *mine += scale * theirs;
        }
        true
    }

    /// Sum of the regular bins.
    #[must_use]
    pub fn integral(&self) -> f64 {
        let cells = self.cells();
        cells[1..=self.xaxis.bin_count()].iter().sum()
    }

    /// Number of fill calls since creation or the last reset.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.entries + self.buffer.as_ref().map_or(0, |b| b.len() as u64)
    }

    /// The histogram name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The histogram title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The x axis.
    #[must_use]
    pub fn axis(&self) -> &Axis {
        &self.xaxis
    }

    #[inline]
    fn fill_direct(&mut self, x: f64, weight: f64) {
        self.entries += 1;
        self.data[self.xaxis.find_bin(x)] += weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hist() -> Histogram1D {
        Histogram1D::new("h_e", "SiRi back", AxisSpec::new(10, 0.0, 10.0, "E [keV]"))
    }

    #[test]
    fn test_fill_lands_in_expected_bins() {
        let mut h = hist();
        for x in [-1.0, 0.0, 9.999, 10.0, 100.0] {
            h.fill(x);
        }
        assert_relative_eq!(h.cell(0), 1.0);
        assert_relative_eq!(h.cell(1), 1.0);
        assert_relative_eq!(h.cell(10), 1.0);
        assert_relative_eq!(h.cell(11), 2.0);
        assert_eq!(h.entry_count(), 5);
        assert_eq!(h.axis().name(), "h_e_xaxis");
    }

    #[test]
    fn test_weight_does_not_change_entry_count() {
        let mut h = hist();
        h.fill_weighted(3.5, 2.5);
        h.fill_weighted(3.5, -0.5);
        assert_relative_eq!(h.cell(4), 2.0);
        assert_eq!(h.entry_count(), 2);
    }

    #[test]
    fn test_out_of_range_cells_are_ignored() {
        let mut h = hist();
        h.set_cell(12, 5.0);
        h.set_cell(usize::MAX, 5.0);
        assert_relative_eq!(h.cell(12), 0.0);
        assert_relative_eq!(h.cell(usize::MAX), 0.0);
        assert!(h.cells().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_set_cell_round_trip() {
        let mut h = hist();
        h.fill_weighted(4.2, 3.0);
        let before = h.cell(5);
        h.set_cell(5, h.cell(5));
        assert_relative_eq!(h.cell(5), before);
        assert_relative_eq!(h.cell(5), 3.0);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut h = hist();
        for x in [-5.0, 1.0, 2.0, 50.0] {
            h.fill(x);
        }
        h.reset();
        assert_eq!(h.entry_count(), 0);
        for bin in 0..h.axis().total_bins() {
            assert_relative_eq!(h.cell(bin), 0.0);
        }
    }

    #[test]
    fn test_merge_adds_all_cells() {
        let mut a = hist();
        let mut b = hist();
        for x in [-1.0, 0.5, 0.5, 20.0] {
            a.fill(x);
        }
        for x in [-3.0, 0.5, 7.5, 11.0] {
            b.fill(x);
        }
        let original = a.cells().into_owned();

        assert!(a.merge(&b, 1.0));
        for (bin, value) in original.iter().enumerate() {
            assert_relative_eq!(a.cell(bin), value + b.cell(bin));
        }
        assert_eq!(a.entry_count(), 4);
    }

    #[test]
    fn test_merge_scales() {
        let mut a = hist();
        let mut b = hist();
        b.fill_weighted(2.0, 4.0);
        assert!(a.merge(&b, -0.5));
        assert_relative_eq!(a.cell(3), -2.0);
    }

    #[test]
    fn test_merge_rejects_different_shape_or_name() {
        let mut a = hist();
        a.fill(1.0);
        let before = a.cells().into_owned();

        let mut other_bins = Histogram1D::new("h_e", "", AxisSpec::new(20, 0.0, 10.0, ""));
        other_bins.fill(1.0);
        assert!(!a.merge(&other_bins, 1.0));

        let mut other_name = Histogram1D::new("h_de", "", AxisSpec::new(10, 0.0, 10.0, ""));
        other_name.fill(1.0);
        assert!(!a.merge(&other_name, 1.0));

        assert_eq!(a.cells().into_owned(), before);
    }

    #[test]
    fn test_fill_buffer_is_invisible() {
        let mut direct = hist();
        let mut buffered = hist().with_fill_buffer(4);
        for i in 0..11 {
            let x = f64::from(i) * 1.3 - 2.0;
            direct.fill_weighted(x, 0.5);
            buffered.fill_weighted(x, 0.5);
            assert_eq!(buffered.entry_count(), direct.entry_count());
            assert_eq!(buffered.cells(), direct.cells());
        }
        assert_relative_eq!(buffered.integral(), direct.integral());

        let mut target = hist();
        assert!(target.merge(&buffered, 1.0));
        assert_eq!(target.cells(), direct.cells());

        buffered.reset();
        assert_eq!(buffered.entry_count(), 0);
        assert_relative_eq!(buffered.cell(11), 0.0);
    }
}
