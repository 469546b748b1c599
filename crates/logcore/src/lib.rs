//! Message envelopes, ring buffers, and the sink/formatter contracts that
//! the rest of the async logging core (queues, pool, registry) is built on.

mod backtrace;
mod diagnostics;
mod envelope;
mod flush_signal;
mod level;
mod record;
mod ring;
mod sink;

pub use backtrace::BacktraceRecorder;
pub use diagnostics::report_worker_error;
pub use envelope::{DispatchTarget, Envelope};
pub use flush_signal::{flush_signal, FlushError, FlushSender, FlushWaiter};
pub use level::Level;
pub use record::{ColorSpan, OwnedRecord, Record, SourceLoc};
pub use ring::RingBuffer;
pub use sink::{Formatter, Sink, SinkError};
