use logcore::Envelope;
use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

struct Node {
    value: Option<Envelope>,
    next: AtomicPtr<Node>,
}

impl Node {
    fn sentinel() -> *mut Node {
        Box::into_raw(Box::new(Node {
            value: None,
            next: AtomicPtr::new(ptr::null_mut()),
        }))
    }
}

/// An unbounded, lock-free single-producer/single-consumer FIFO: the
/// Michael & Scott queue specialized to one producer and one consumer (no
/// CAS needed on `tail`/`head` themselves, since each has exactly one
/// writer — only the link between nodes needs `Release`/`Acquire`).
///
/// This is the per-token sub-queue `LockFreeShardedQueue` (`C6`) dedicates
/// to one producer: unbounded so enqueue never blocks or fails, matching
/// a "non-allocating enqueue; on failure, fall back to an
/// allocating enqueue" contract by always taking the allocating path (the
/// fixed-capacity non-allocating fast path belongs to
/// `moodycamel::ConcurrentQueue`'s internal block-list, which is out of
/// scope here — see the grounding ledger in `DESIGN.md`).
pub struct TokenQueue {
    head: UnsafeCell<*mut Node>,
    tail: UnsafeCell<*mut Node>,
}

// SAFETY: `TokenQueue` is sound under single-producer/single-consumer
// access, enforced by `ShardedQueue`'s token assignment + in-use flag.
unsafe impl Send for TokenQueue {}
unsafe impl Sync for TokenQueue {}

impl TokenQueue {
    pub fn new() -> Self {
        let sentinel = Node::sentinel();
        Self {
            head: UnsafeCell::new(sentinel),
            tail: UnsafeCell::new(sentinel),
        }
    }

    /// Producer-only. Must not be called concurrently by more than one
    /// thread at a time (the sharded queue's in-use flag enforces this
    /// when a token is shared across producers).
    pub fn push(&self, item: Envelope) {
        let node = Box::into_raw(Box::new(Node {
            value: Some(item),
            next: AtomicPtr::new(ptr::null_mut()),
        }));
        // SAFETY: only the producer reads/writes `tail`.
        let tail = unsafe { *self.tail.get() };
        // SAFETY: `tail` always points at a live node owned by this queue.
        unsafe { (*tail).next.store(node, Ordering::Release) };
        unsafe { *self.tail.get() = node };
    }

    /// Consumer-only.
    pub fn pop(&self) -> Option<Envelope> {
        // SAFETY: only the consumer reads/writes `head`.
        let head = unsafe { *self.head.get() };
        // SAFETY: `head` always points at a live (possibly sentinel) node.
        let next = unsafe { (*head).next.load(Ordering::Acquire) };
        if next.is_null() {
            return None;
        }
        // SAFETY: `next` was published by the producer's Release store
        // above and is not freed while still reachable from `head`.
        let value = unsafe { (*next).value.take() };
        unsafe { *self.head.get() = next };
        // The old sentinel/head node is no longer reachable from anywhere;
        // reclaim it now (single consumer, so no concurrent reader of it).
        unsafe { drop(Box::from_raw(head)) };
        value
    }
}

impl Drop for TokenQueue {
    fn drop(&mut self) {
        while self.pop().is_some() {}
        // SAFETY: the final sentinel left in `head` is never freed by
        // `pop` (it only frees the *old* head); reclaim it here.
        unsafe { drop(Box::from_raw(*self.head.get())) };
    }
}
