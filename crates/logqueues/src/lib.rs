mod backoff;
mod error;
mod lock_queue;
mod lockfree_blocking;
mod sharded;
mod token_queue;
mod work_queue;

pub use backoff::Backoff;
pub use error::QueueError;
pub use lock_queue::LockQueue;
pub use lockfree_blocking::LockFreeBlockingQueue;
pub use sharded::LockFreeShardedQueue;
pub use work_queue::{PushMode, WorkQueue};
