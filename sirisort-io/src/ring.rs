//! Fixed-capacity FIFO used for the prefetch slot queues.

/// A ring buffer whose capacity is fixed at construction.
///
/// The prefetching source keeps every block of its pool in exactly one place:
/// the free queue, the ready queue, the worker, or the consumer. Both queues
/// are sized to the pool, so a push can only fail if that accounting is broken.
#[derive(Debug)]
pub(crate) struct SlotQueue<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    len: usize,
}

impl<T> SlotQueue<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity.max(1)).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Appends `item`, handing it back if the queue is full.
    pub(crate) fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let tail = (self.head + self.len) % self.capacity();
        self.slots[tail] = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Removes the oldest item.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        item
    }

    /// Removes all items, oldest first.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order_across_wraparound() {
        let mut q = SlotQueue::new(3);
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.pop(), Some(1));
        q.push(3).unwrap();
        q.push(4).unwrap();
        assert!(q.is_full());
        assert_eq!(q.push(5), Err(5));
        assert_eq!(q.drain().collect::<Vec<_>>(), [2, 3, 4]);
        assert!(q.is_empty());
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut q = SlotQueue::new(0);
        assert_eq!(q.capacity(), 1);
        q.push('a').unwrap();
        assert_eq!(q.len(), 1);
    }
}
