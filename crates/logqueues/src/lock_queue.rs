use crate::error::QueueError;
use crate::work_queue::{PushMode, WorkQueue};
use logcore::{Envelope, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// `C4`: a mutex-guarded bounded FIFO over [`RingBuffer`]. Global FIFO
/// across every producer — the order of successful pushes observed under
/// the lock is the dequeue order.
pub struct LockQueue {
    ring: Mutex<RingBuffer<Envelope>>,
    not_full: Condvar,
    not_empty: Condvar,
    discard_count: AtomicU64,
}

impl LockQueue {
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::InvalidCapacity(capacity));
        }
        Ok(Self {
            ring: Mutex::new(RingBuffer::new(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            discard_count: AtomicU64::new(0),
        })
    }

    /// Same as `pop`, but bounded by `deadline`. Returns `None` if the
    /// deadline elapses with the queue still empty.
    pub fn timed_pop(&self, timeout: Duration) -> Option<Envelope> {
        let mut ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(envelope) = ring.pop_front() {
                self.not_full.notify_one();
                return Some(envelope);
            }
            let (guard, result) = self
                .not_empty
                .wait_timeout(ring, timeout)
                .unwrap_or_else(|e| e.into_inner());
            ring = guard;
            if result.timed_out() && ring.is_empty() {
                return None;
            }
        }
    }
}

impl WorkQueue for LockQueue {
    fn shard_count(&self) -> usize {
        1
    }

    fn push(&self, envelope: Envelope, mode: PushMode) -> Result<(), QueueError> {
        let mut ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        match mode {
            PushMode::Try => {
                if ring.is_full() {
                    self.discard_count.fetch_add(1, Ordering::Relaxed);
                    return Err(QueueError::Full);
                }
                ring.push_back(envelope);
                self.not_empty.notify_one();
                Ok(())
            }
            PushMode::Blocking => {
                while ring.is_full() {
                    ring = self.not_full.wait(ring).unwrap_or_else(|e| e.into_inner());
                }
                ring.push_back(envelope);
                self.not_empty.notify_one();
                Ok(())
            }
            PushMode::Force => {
                ring.push_back(envelope);
                self.not_empty.notify_one();
                Ok(())
            }
        }
    }

    fn push_to_shard(&self, _shard: usize, envelope: Envelope) {
        // A single shared queue: force-push so Terminate is never dropped
        // by a full-queue try/discard race.
        let _ = self.push(envelope, PushMode::Force);
    }

    fn pop(&self, _shard: usize) -> Envelope {
        let mut ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(envelope) = ring.pop_front() {
                self.not_full.notify_one();
                return envelope;
            }
            ring = self.not_empty.wait(ring).unwrap_or_else(|e| e.into_inner());
        }
    }

    fn discard_count(&self) -> u64 {
        self.discard_count.load(Ordering::Relaxed)
    }

    fn overwrite_count(&self) -> u64 {
        self.ring.lock().unwrap_or_else(|e| e.into_inner()).overwrite_count()
    }
}
