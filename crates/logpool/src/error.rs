use thiserror::Error;

/// Producer-facing errors returned by [`crate::AsyncLogger`].
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool's weak handle failed to upgrade: the pool has already been
    /// torn down (registry swap or process shutdown).
    #[error("thread pool is gone")]
    PoolGone,
    /// A flush's one-shot completion signal was dropped before firing.
    #[error("flush signal was lost before completion")]
    FlushSignalLost,
    /// Invalid pool configuration at construction time.
    #[error("invalid pool configuration: {0}")]
    ConfigError(String),
}

impl From<logcore::FlushError> for PoolError {
    fn from(err: logcore::FlushError) -> Self {
        match err {
            logcore::FlushError::Lost | logcore::FlushError::ShuttingDown => {
                PoolError::FlushSignalLost
            }
        }
    }
}

impl From<logqueues::QueueError> for PoolError {
    fn from(err: logqueues::QueueError) -> Self {
        match err {
            logqueues::QueueError::InvalidCapacity(c) => {
                PoolError::ConfigError(format!("invalid queue capacity: {c}"))
            }
            logqueues::QueueError::Full | logqueues::QueueError::Closed => PoolError::PoolGone,
        }
    }
}
