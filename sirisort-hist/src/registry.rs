//! Name-keyed ownership of histograms.

use crate::axis::AxisSpec;
use crate::hist1d::Histogram1D;
use crate::hist2d::Histogram2D;
use indexmap::IndexMap;
use tracing::debug;

/// Handle to a one-dimensional histogram owned by a [`HistogramRegistry`].
///
/// Handles stay valid for the lifetime of the registry. Re-creating a
/// histogram under the same name keeps the handle, which then refers to the
/// replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hist1D(usize);

/// Handle to a two-dimensional histogram owned by a [`HistogramRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hist2D(usize);

/// Owns every histogram of a sorting session, keyed by name.
///
/// Names are unique per dimensionality; a 1D and a 2D histogram may share a
/// name. The registry is not synchronized. Threads that sort in parallel keep
/// one registry each and combine them with [`HistogramRegistry::merge_from`].
#[derive(Debug, Clone, Default)]
pub struct HistogramRegistry {
    one_d: IndexMap<String, Histogram1D>,
    two_d: IndexMap<String, Histogram2D>,
    fill_buffer: Option<usize>,
}

impl HistogramRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every histogram created afterwards coalesce `capacity` fills.
    #[must_use]
    pub fn with_fill_buffer(mut self, capacity: usize) -> Self {
        self.fill_buffer = Some(capacity);
        self
    }

    /// Creates a 1D histogram, replacing any 1D histogram with the same name.
    pub fn create_1d(
        &mut self,
        name: impl Into<String>,
        title: impl Into<String>,
        x: AxisSpec,
    ) -> Hist1D {
        let name = name.into();
        let mut hist = Histogram1D::new(name.clone(), title, x);
        if let Some(capacity) = self.fill_buffer {
            hist = hist.with_fill_buffer(capacity);
        }
        let (idx, old) = self.one_d.insert_full(name, hist);
        if old.is_some() {
            debug!(name = %self.one_d[idx].name(), "replaced 1D histogram");
        }
        Hist1D(idx)
    }

    /// Creates a 2D histogram, replacing any 2D histogram with the same name.
    pub fn create_2d(
        &mut self,
        name: impl Into<String>,
        title: impl Into<String>,
        x: AxisSpec,
        y: AxisSpec,
    ) -> Hist2D {
        let name = name.into();
        let mut hist = Histogram2D::new(name.clone(), title, x, y);
        if let Some(capacity) = self.fill_buffer {
            hist = hist.with_fill_buffer(capacity);
        }
        let (idx, old) = self.two_d.insert_full(name, hist);
        if old.is_some() {
            debug!(name = %self.two_d[idx].name(), "replaced 2D histogram");
        }
        Hist2D(idx)
    }

    /// Looks up a 1D histogram by name.
    #[must_use]
    pub fn find_1d(&self, name: &str) -> Option<Hist1D> {
        self.one_d.get_index_of(name).map(Hist1D)
    }

    /// Looks up a 2D histogram by name.
    #[must_use]
    pub fn find_2d(&self, name: &str) -> Option<Hist2D> {
        self.two_d.get_index_of(name).map(Hist2D)
    }

    /// The histogram behind `handle`, if it belongs to this registry.
    #[must_use]
    pub fn get_1d(&self, handle: Hist1D) -> Option<&Histogram1D> {
        self.one_d.get_index(handle.0).map(|(_, h)| h)
    }

    /// Mutable access to the histogram behind `handle`.
    pub fn get_1d_mut(&mut self, handle: Hist1D) -> Option<&mut Histogram1D> {
        self.one_d.get_index_mut(handle.0).map(|(_, h)| h)
    }

    /// The histogram behind `handle`, if it belongs to this registry.
    #[must_use]
    pub fn get_2d(&self, handle: Hist2D) -> Option<&Histogram2D> {
        self.two_d.get_index(handle.0).map(|(_, h)| h)
    }

    /// Mutable access to the histogram behind `handle`.
    pub fn get_2d_mut(&mut self, handle: Hist2D) -> Option<&mut Histogram2D> {
        self.two_d.get_index_mut(handle.0).map(|(_, h)| h)
    }

    /// Fills the 1D histogram behind `handle`; unknown handles are ignored.
    #[inline]
    pub fn fill_1d(&mut self, handle: Hist1D, x: f64, weight: f64) {
        if let Some(hist) = self.get_1d_mut(handle) {
            hist.fill_weighted(x, weight);
        }
    }

    /// Fills the 2D histogram behind `handle`; unknown handles are ignored.
    #[inline]
    pub fn fill_2d(&mut self, handle: Hist2D, x: f64, y: f64, weight: f64) {
        if let Some(hist) = self.get_2d_mut(handle) {
            hist.fill_weighted(x, y, weight);
        }
    }

    /// All 1D histograms, in creation order.
    pub fn all_1d(&self) -> impl ExactSizeIterator<Item = &Histogram1D> {
        self.one_d.values()
    }

    /// All 2D histograms, in creation order.
    pub fn all_2d(&self) -> impl ExactSizeIterator<Item = &Histogram2D> {
        self.two_d.values()
    }

    /// Number of histograms of both dimensionalities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.one_d.len() + self.two_d.len()
    }

    /// Returns true if the registry owns no histograms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.one_d.is_empty() && self.two_d.is_empty()
    }

    /// Resets every histogram.
    pub fn reset_all(&mut self) {
        self.one_d.values_mut().for_each(Histogram1D::reset);
        self.two_d.values_mut().for_each(Histogram2D::reset);
    }

    /// Applies pending buffered fills of every histogram.
    pub fn flush_all(&mut self) {
        self.one_d.values_mut().for_each(Histogram1D::flush);
        self.two_d.values_mut().for_each(Histogram2D::flush);
    }

    /// Adds every histogram of `other` that has a counterpart here.
    ///
    /// Histograms without a counterpart, or with a different shape, are
    /// skipped. Returns the number of histograms merged.
    pub fn merge_from(&mut self, other: &HistogramRegistry) -> usize {
        let mut merged = 0;
        for (name, hist) in &mut self.one_d {
            if let Some(theirs) = other.one_d.get(name) {
                merged += usize::from(hist.merge(theirs, 1.0));
            }
        }
        for (name, hist) in &mut self.two_d {
            if let Some(theirs) = other.two_d.get(name) {
                merged += usize::from(hist.merge(theirs, 1.0));
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spec() -> AxisSpec {
        AxisSpec::new(10, 0.0, 10.0, "x")
    }

    #[test]
    fn test_create_and_find() {
        let mut reg = HistogramRegistry::new();
        let h = reg.create_1d("h_e", "E", spec());
        let m = reg.create_2d("m_e_de", "E dE", spec(), spec());

        assert_eq!(reg.find_1d("h_e"), Some(h));
        assert_eq!(reg.find_2d("m_e_de"), Some(m));
        assert_eq!(reg.find_1d("m_e_de"), None);
        assert_eq!(reg.find_2d("nope"), None);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_overwrite_last_write_wins() {
        let mut reg = HistogramRegistry::new();
        let first = reg.create_1d("h", "first", spec());
        reg.fill_1d(first, 1.0, 1.0);
        let second = reg.create_1d("h", "second", AxisSpec::new(4, 0.0, 4.0, ""));

        assert_eq!(first, second);
        assert_eq!(reg.all_1d().len(), 1);
        let hist = reg.get_1d(second).unwrap();
        assert_eq!(hist.title(), "second");
        assert_eq!(hist.axis().bin_count(), 4);
        assert_eq!(hist.entry_count(), 0);
    }

    #[test]
    fn test_reset_all() {
        let mut reg = HistogramRegistry::new().with_fill_buffer(8);
        let h = reg.create_1d("h", "", spec());
        let m = reg.create_2d("m", "", spec(), spec());
        reg.fill_1d(h, 3.0, 1.0);
        reg.fill_2d(m, 3.0, 4.0, 2.0);
        reg.reset_all();

        assert_eq!(reg.get_1d(h).unwrap().entry_count(), 0);
        assert_relative_eq!(reg.get_2d(m).unwrap().cell(4, 5), 0.0);
    }

    #[test]
    fn test_merge_from_skips_missing_and_mismatched() {
        let mut mine = HistogramRegistry::new();
        let h = mine.create_1d("h", "", spec());
        let g = mine.create_1d("g", "", spec());
        let only_mine = mine.create_1d("only_mine", "", spec());

        let mut theirs = HistogramRegistry::new();
        let th = theirs.create_1d("h", "", spec());
        let tg = theirs.create_1d("g", "", AxisSpec::new(5, 0.0, 10.0, ""));
        theirs.create_1d("only_theirs", "", spec());
        theirs.fill_1d(th, 2.5, 3.0);
        theirs.fill_1d(tg, 2.5, 3.0);

        assert_eq!(mine.merge_from(&theirs), 1);
        assert_relative_eq!(mine.get_1d(h).unwrap().cell(3), 3.0);
        assert_relative_eq!(mine.get_1d(g).unwrap().integral(), 0.0);
        assert_relative_eq!(mine.get_1d(only_mine).unwrap().integral(), 0.0);
        assert!(mine.find_1d("only_theirs").is_none());
    }

    #[test]
    fn test_foreign_handle_is_ignored() {
        let mut big = HistogramRegistry::new();
        big.create_1d("a", "", spec());
        let b = big.create_1d("b", "", spec());

        let mut small = HistogramRegistry::new();
        small.create_1d("a", "", spec());
        small.fill_1d(b, 1.0, 1.0);
        assert!(small.get_1d(b).is_none());
    }
}
