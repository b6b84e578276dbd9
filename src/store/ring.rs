//! Fixed-capacity FIFO ring buffer
//!
//! Slots are allocated once up front. `push` at capacity overwrites the
//! oldest entry in O(1); iteration is always oldest-first.

/// Bounded circular buffer
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    /// Index of the oldest entry
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` entries (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);

        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    /// Append an entry, returning the evicted oldest entry when full
    pub fn push(&mut self, item: T) -> Option<T> {
        let capacity = self.slots.len();

        if self.len < capacity {
            let tail = (self.head + self.len) % capacity;
            self.slots[tail] = Some(item);
            self.len += 1;
            None
        } else {
            // Full: the tail slot is the head slot
            let evicted = self.slots[self.head].replace(item);
            self.head = (self.head + 1) % capacity;
            evicted
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterate oldest-first
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let capacity = self.slots.len();
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % capacity].as_ref())
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copy the contents out, oldest-first
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_below_capacity() {
        let mut ring = RingBuffer::with_capacity(4);
        assert!(ring.is_empty());
        assert_eq!(ring.push(1), None);
        assert_eq!(ring.push(2), None);
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_eviction_keeps_last_capacity_values() {
        let capacity = 5;
        let mut ring = RingBuffer::with_capacity(capacity);

        for n in 0..23 {
            ring.push(n);
        }

        assert_eq!(ring.len(), capacity);
        assert_eq!(ring.to_vec(), vec![18, 19, 20, 21, 22]);
    }

    #[test]
    fn test_push_returns_evicted() {
        let mut ring = RingBuffer::with_capacity(2);
        ring.push("a");
        ring.push("b");
        assert_eq!(ring.push("c"), Some("a"));
        assert_eq!(ring.push("d"), Some("b"));
        assert_eq!(ring.to_vec(), vec!["c", "d"]);
    }

    #[test]
    fn test_every_overflow_length() {
        for capacity in 1..8 {
            for pushes in 0..(capacity * 3) {
                let mut ring = RingBuffer::with_capacity(capacity);
                for n in 0..pushes {
                    ring.push(n);
                }
                let expected: Vec<usize> = (pushes.saturating_sub(capacity)..pushes).collect();
                assert_eq!(ring.to_vec(), expected, "capacity={capacity} pushes={pushes}");
            }
        }
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut ring = RingBuffer::with_capacity(0);
        assert_eq!(ring.capacity(), 1);
        ring.push(1);
        ring.push(2);
        assert_eq!(ring.to_vec(), vec![2]);
    }
}
