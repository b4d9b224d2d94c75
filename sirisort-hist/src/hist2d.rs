//! Two-dimensional histograms.

use crate::axis::{Axis, AxisSpec};
use crate::buffer::FillBuffer;
use std::borrow::Cow;

/// A two-dimensional histogram with `f64` bin contents.
///
/// Cells are stored row by row: `cells[x_total * ybin + xbin]`, where
/// `x_total` counts the x bins including underflow and overflow.
#[derive(Debug, Clone)]
pub struct Histogram2D {
    name: String,
    title: String,
    xaxis: Axis,
    yaxis: Axis,
    entries: u64,
    data: Vec<f64>,
    buffer: Option<FillBuffer<(f64, f64)>>,
}

impl Histogram2D {
    /// Creates an empty histogram. The axes are named `<name>_xaxis` and `<name>_yaxis`.
    #[must_use]
    pub fn new(name: impl Into<String>, title: impl Into<String>, x: AxisSpec, y: AxisSpec) -> Self {
        let name = name.into();
        let xaxis = Axis::new(format!("{name}_xaxis"), x);
        let yaxis = Axis::new(format!("{name}_yaxis"), y);
        Self {
            data: vec![0.0; xaxis.total_bins() * yaxis.total_bins()],
            name,
            title: title.into(),
            xaxis,
            yaxis,
            entries: 0,
            buffer: None,
        }
    }

    /// Holds back up to `capacity` fills and applies them in batches.
    #[must_use]
    pub fn with_fill_buffer(mut self, capacity: usize) -> Self {
        self.flush();
        self.buffer = Some(FillBuffer::new(capacity));
        self
    }

    /// Adds 1 to the cell containing `(x, y)`.
    #[inline]
    pub fn fill(&mut self, x: f64, y: f64) {
        self.fill_weighted(x, y, 1.0);
    }

    /// Adds `weight` to the cell containing `(x, y)` and counts one entry.
    #[inline]
    pub fn fill_weighted(&mut self, x: f64, y: f64, weight: f64) {
        match self.buffer.as_mut() {
            Some(buffer) => {
                if buffer.push((x, y), weight) {
                    self.flush();
                }
            }
            None => {
                let idx = self.cell_index(x, y);
                self.data[idx] += weight;
                self.entries += 1;
            }
        }
    }

    /// Applies all buffered fills.
    pub fn flush(&mut self) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        let x_total = self.xaxis.total_bins();
        for ((x, y), weight) in buffer.drain() {
            let idx = x_total * self.yaxis.find_bin(y) + self.xaxis.find_bin(x);
            self.data[idx] += weight;
            self.entries += 1;
        }
    }

    /// Content of cell `(xbin, ybin)`, 0 for bins outside the histogram.
    #[must_use]
    pub fn cell(&self, xbin: usize, ybin: usize) -> f64 {
        let Some(idx) = self.flat_index(xbin, ybin) else {
            return 0.0;
        };
        let stored = self.data[idx];
        match &self.buffer {
            Some(buffer) if !buffer.is_empty() => {
                stored
                    + buffer
                        .iter()
                        .filter(|((x, y), _)| self.cell_index(*x, *y) == idx)
                        .map(|(_, weight)| weight)
                        .sum::<f64>()
            }
            _ => stored,
        }
    }

    /// Overwrites cell `(xbin, ybin)`; bins outside the histogram are ignored.
    pub fn set_cell(&mut self, xbin: usize, ybin: usize, value: f64) {
        self.flush();
        if let Some(idx) = self.flat_index(xbin, ybin) {
            self.data[idx] = value;
        }
    }

    /// All cells including underflow and overflow, row by row.
    #[must_use]
    pub fn cells(&self) -> Cow<'_, [f64]> {
        match &self.buffer {
            Some(buffer) if !buffer.is_empty() => {
                let mut data = self.data.clone();
                for &((x, y), weight) in buffer.iter() {
                    data[self.cell_index(x, y)] += weight;
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
    /// Nothing happens unless `other` has the same name and the same shape on
    /// both axes. Returns true if the contents were added.
    pub fn merge(&mut self, other: &Histogram2D, scale: f64) -> bool {
        if other.name != self.name
            || !other.xaxis.same_shape(&self.xaxis)
            || !other.yaxis.same_shape(&self.yaxis)
        {
            return false;
        }
        self.flush();
        for (mine, theirs) in self.data.iter_mut().zip(other.cells().iter()) {
            *mine += scale * theirs;
        }
        true
    }

    /// Projects the regular x bins onto the x axis, summing over regular y bins.
    #[must_use]
    pub fn project_x(&self) -> Vec<f64> {
        let cells = self.cells();
        let x_total = self.xaxis.total_bins();
        (1..=self.xaxis.bin_count())
            .map(|xbin| {
                (1..=self.yaxis.bin_count())
                    .map(|ybin| cells[x_total * ybin + xbin])
                    .sum()
            })
            .collect()
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
    pub fn x_axis(&self) -> &Axis {
        &self.xaxis
    }

    /// The y axis.
    #[must_use]
    pub fn y_axis(&self) -> &Axis {
        &self.yaxis
    }

    #[inline]
    fn cell_index(&self, x: f64, y: f64) -> usize {
        self.xaxis.total_bins() * self.yaxis.find_bin(y) + self.xaxis.find_bin(x)
    }

    #[inline]
    fn flat_index(&self, xbin: usize, ybin: usize) -> Option<usize> {
        let x_total = self.xaxis.total_bins();
        (xbin < x_total && ybin < self.yaxis.total_bins()).then(|| x_total * ybin + xbin)
    }
}
