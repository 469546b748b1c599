//! Public facade over the asynchronous logging core: re-exports the
//! concurrency fabric (`logcore`/`logqueues`/`logpool`/`logregistry`) plus
//! the minimal formatter and concrete sinks needed to run it end to end.

pub mod format;
pub mod sink;

pub use logcore::{
    BacktraceRecorder, ColorSpan, DispatchTarget, Envelope, FlushError, Formatter, Level,
    OwnedRecord, Record, Sink as SinkTrait, SinkError, SourceLoc,
};
pub use logpool::{Logger, PoolConfig, PoolError, QueueKind, WorkerPool};
pub use logqueues::{LockFreeBlockingQueue, LockFreeShardedQueue, LockQueue, PushMode, QueueError};
pub use logregistry::{PeriodicDriver, Registry, RegistryError};

pub use format::PlainFormatter;
pub use sink::{NullSink, StdoutSink, TestSink};
