use crate::error::PoolError;
use std::fmt;
use std::sync::Arc;

/// A no-argument hook invoked once per worker thread. Cheap to clone since
/// it's just a shared pointer to the closure.
pub type ThreadHook = Arc<dyn Fn() + Send + Sync>;

/// Which of the three interchangeable queue families backs a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    /// `C4`: mutex-guarded bounded FIFO, global ordering, try/block/force push.
    Lock,
    /// `C5`: lock-free bounded MPMC, per-producer FIFO, spin-retry push.
    LockFreeBlocking,
    /// `C6`: lock-free unbounded, per-producer-token FIFO, never backpressures.
    LockFreeSharded,
}

/// Validated construction parameters for a [`crate::WorkerPool`].
///
/// Mirrors the shape of a plain, `Default`-able configuration struct with a
/// fallible validating constructor rather than a panicking one.
#[derive(Clone)]
pub struct PoolConfig {
    /// Queue capacity. Ignored by [`QueueKind::LockFreeSharded`], which is
    /// unbounded.
    pub capacity: usize,
    /// Number of worker threads, and (for the sharded queue) the number of
    /// producer tokens. Must be in `1..=1024`.
    pub worker_count: usize,
    pub queue_kind: QueueKind,
    /// Invoked once on each worker thread, right after it starts, before it
    /// begins draining the queue.
    pub on_thread_start: Option<ThreadHook>,
    /// Invoked once on each worker thread, right before it exits, after it
    /// has drained its `Terminate` envelope.
    pub on_thread_stop: Option<ThreadHook>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 8192,
            worker_count: 1,
            queue_kind: QueueKind::Lock,
            on_thread_start: None,
            on_thread_stop: None,
        }
    }
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("capacity", &self.capacity)
            .field("worker_count", &self.worker_count)
            .field("queue_kind", &self.queue_kind)
            .field("on_thread_start", &self.on_thread_start.is_some())
            .field("on_thread_stop", &self.on_thread_stop.is_some())
            .finish()
    }
}

impl PoolConfig {
    /// Validates `self`, returning `ConfigError` for an out-of-range worker
    /// count (`1..=1024`) or a zero capacity on a bounded queue kind.
    pub fn validated(self) -> Result<Self, PoolError> {
        if !(1..=1024).contains(&self.worker_count) {
            return Err(PoolError::ConfigError(format!(
                "worker_count {} out of range 1..=1024",
                self.worker_count
            )));
        }
        if self.capacity == 0 && self.queue_kind != QueueKind::LockFreeSharded {
            return Err(PoolError::ConfigError(
                "capacity must be nonzero for a bounded queue kind".into(),
            ));
        }
        Ok(self)
    }
}
