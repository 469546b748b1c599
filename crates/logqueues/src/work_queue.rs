use crate::error::QueueError;
use logcore::Envelope;

/// How a push should behave when the queue is at capacity. Bounded queues
/// (the lock queue, the lock-free blocking queue) honor all three; the
/// unbounded sharded queue accepts the parameter but never needs to act on
/// it, since it never reports full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// Fail with `QueueError::Full` rather than wait.
    Try,
    /// Block the caller until space is available.
    Blocking,
    /// Never fails; overwrites the oldest queued item if necessary.
    Force,
}

/// The capability a worker pool needs from one of the three interchangeable
/// queue families.
///
/// Per the design notes: the three families are not unioned into one
/// storage slot. Their ownership and lifetimes differ enough (bounded vs.
/// unbounded, shared-queue vs. per-token-ring) that they are separate
/// concrete types behind this one small trait object handle.
pub trait WorkQueue: Send + Sync {
    /// Number of independent consumer shards this queue drains into. `1`
    /// for the lock queue and the lock-free blocking queue (any worker may
    /// dequeue any envelope); `worker_count` for the sharded queue (each
    /// worker drains exactly one token).
    fn shard_count(&self) -> usize;

    /// Submits `envelope` for delivery to any shard, per `mode`.
    fn push(&self, envelope: Envelope, mode: PushMode) -> Result<(), QueueError>;

    /// Delivers `envelope` to exactly the given shard. Used only to hand
    /// each worker/token precisely one `Terminate` envelope at teardown.
    fn push_to_shard(&self, shard: usize, envelope: Envelope);

    /// Blocks until an envelope is available on `shard` and returns it.
    fn pop(&self, shard: usize) -> Envelope;

    /// Number of try-pushes dropped because the queue was full.
    /// Always `0` for queue families that don't drop.
    fn discard_count(&self) -> u64 {
        0
    }

    /// Number of force-pushes that overwrote a queued item. Always
    /// `0` for queue families that don't overwrite.
    fn overwrite_count(&self) -> u64 {
        0
    }
}
