use std::mem::MaybeUninit;

/// A single-threaded bounded ring buffer with overwrite bookkeeping.
///
/// Allocates one slot beyond the logical capacity as a sentinel, so
/// `head == tail` unambiguously means "empty" with no separate size field to
/// keep in sync. Storage lives in a `Box<[MaybeUninit<T>]>` — fixed-size, no
/// reallocation once built. `RingBuffer` carries no atomics: it is meant to
/// be owned by a single thread or composed under an external mutex (see
/// [`crate::backtrace::BacktraceRecorder`] and the lock queue in
/// `logqueues`).
pub struct RingBuffer<T> {
    buffer: Box<[MaybeUninit<T>]>,
    /// Logical capacity; one more slot than this is actually allocated so
    /// `head == tail` is unambiguously "empty".
    capacity: usize,
    head: usize,
    tail: usize,
    overwrite_count: u64,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let slots = capacity + 1;
        let mut buffer = Vec::with_capacity(slots);
        buffer.resize_with(slots, MaybeUninit::uninit);
        Self {
            buffer: buffer.into_boxed_slice(),
            capacity,
            head: 0,
            tail: 0,
            overwrite_count: 0,
        }
    }

    #[inline]
    fn slots(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        (self.tail + self.slots() - self.head) % self.slots()
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && (self.tail + 1) % self.slots() == self.head
    }

    pub fn overwrite_count(&self) -> u64 {
        self.overwrite_count
    }

    pub fn reset_overwrite_count(&mut self) {
        self.overwrite_count = 0;
    }

    /// Pushes `item`, overwriting the oldest element (and bumping
    /// `overwrite_count`) if the ring is already full.
    pub fn push_back(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        self.buffer[self.tail] = MaybeUninit::new(item);
        self.tail = (self.tail + 1) % self.slots();
        if self.tail == self.head {
            // SAFETY: the slot at `head` held an initialized item (the ring
            // was full), and we are about to drop it by overwriting it on
            // the next push; drop it now instead of leaking it.
            let old = std::mem::replace(&mut self.buffer[self.head], MaybeUninit::uninit());
            unsafe { old.assume_init_drop() };
            self.head = (self.head + 1) % self.slots();
            self.overwrite_count += 1;
        }
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let slot = std::mem::replace(&mut self.buffer[self.head], MaybeUninit::uninit());
        self.head = (self.head + 1) % self.slots();
        // SAFETY: a non-empty ring's head slot was written by a prior
        // `push_back` and never read since.
        Some(unsafe { slot.assume_init() })
    }

    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: see `pop_front`.
        Some(unsafe { self.buffer[self.head].assume_init_ref() })
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        while self.pop_front().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_fifo() {
        let mut ring = RingBuffer::new(3);
        ring.push_back(1);
        ring.push_back(2);
        ring.push_back(3);
        assert!(ring.is_full());
        assert_eq!(ring.pop_front(), Some(1));
        assert_eq!(ring.pop_front(), Some(2));
        assert_eq!(ring.pop_front(), Some(3));
        assert_eq!(ring.pop_front(), None);
    }

    #[test]
    fn overwrite_drops_oldest_and_counts() {
        let mut ring = RingBuffer::new(2);
        ring.push_back(1);
        ring.push_back(2);
        ring.push_back(3); // overwrites 1
        assert_eq!(ring.overwrite_count(), 1);
        assert_eq!(ring.pop_front(), Some(2));
        assert_eq!(ring.pop_front(), Some(3));
    }

    #[test]
    fn reset_overwrite_count() {
        let mut ring: RingBuffer<u8> = RingBuffer::new(1);
        ring.push_back(1);
        ring.push_back(2);
        assert_eq!(ring.overwrite_count(), 1);
        ring.reset_overwrite_count();
        assert_eq!(ring.overwrite_count(), 0);
    }

    #[test]
    fn drop_does_not_leak_or_double_drop() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let counter = Rc::new(RefCell::new(0));
        struct Counted(Rc<RefCell<i32>>);
        impl Drop for Counted {
            fn drop(&mut self) {
                *self.0.borrow_mut() += 1;
            }
        }

        {
            let mut ring = RingBuffer::new(2);
            ring.push_back(Counted(counter.clone()));
            ring.push_back(Counted(counter.clone()));
            ring.push_back(Counted(counter.clone())); // overwrites slot 0
        }
        assert_eq!(*counter.borrow(), 3);
    }

    proptest::proptest! {
        #[test]
        fn prop_matches_vecdeque_oracle(ops in proptest::collection::vec(0u8..3, 0..200), cap in 1usize..16) {
            let mut ring: RingBuffer<u64> = RingBuffer::new(cap);
            let mut oracle: std::collections::VecDeque<u64> = std::collections::VecDeque::new();
            let mut next_val = 0u64;

            for op in ops {
                match op {
                    0 => {
                        ring.push_back(next_val);
                        if oracle.len() == cap {
                            oracle.pop_front();
                        }
                        oracle.push_back(next_val);
                        next_val += 1;
                    }
                    1 => {
                        let got = ring.pop_front();
                        let want = oracle.pop_front();
                        prop_assert_eq!(got, want);
                    }
                    _ => {
                        prop_assert_eq!(ring.front().copied(), oracle.front().copied());
                    }
                }
                prop_assert_eq!(ring.len(), oracle.len());
            }
        }
    }
}
