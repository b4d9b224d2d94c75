//! Write coalescing for histogram fills.

/// Default number of fills held back before they are applied.
pub const DEFAULT_FILL_BUFFER: usize = 1024;

/// Pending fills of one histogram.
///
/// Fills are appended here and applied in a batch once the buffer is full or
/// before any operation that needs the stored cells.
#[derive(Debug, Clone)]
pub(crate) struct FillBuffer<C> {
    pending: Vec<(C, f64)>,
    capacity: usize,
}

impl<C: Copy> FillBuffer<C> {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Queues a fill, returning true when the buffer should be flushed.
    #[inline]
    pub(crate) fn push(&mut self, coord: C, weight: f64) -> bool {
        self.pending.push((coord, weight));
        self.pending.len() >= self.capacity
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &(C, f64)> {
        self.pending.iter()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, (C, f64)> {
        self.pending.drain(..)
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}
