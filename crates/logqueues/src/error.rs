use thiserror::Error;

/// Errors surfaced by queue construction and push-time conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Invalid capacity at construction (zero, for a bounded queue kind).
    #[error("invalid queue capacity: {0}")]
    InvalidCapacity(usize),
    /// `try_push` found the bounded queue full.
    #[error("queue is full")]
    Full,
    /// The queue was closed (pool torn down) and rejects further pushes.
    #[error("queue is closed")]
    Closed,
}
