use crate::flush_signal::FlushSender;
use crate::record::OwnedRecord;
use std::sync::Arc;

/// The consumer-side seam a worker calls into once it has popped an
/// envelope off a queue.
///
/// This is the capability the worker pool needs from "whatever produced
/// this envelope" — implemented by the async logger in `logpool`. Keeping
/// it as a trait here (rather than `logcore` depending on `logpool`) is
/// what lets the envelope carry a strong handle to its logger without a
/// dependency cycle between the queue/envelope layer and the pool layer.
pub trait DispatchTarget: Send + Sync {
    /// Write `record` to every sink in the chain whose threshold admits it,
    /// then flush if the record's level crossed the logger's flush threshold.
    fn dispatch_log(&self, record: &OwnedRecord);
    /// Flush every sink in the chain, synchronously.
    fn dispatch_flush(&self);
}

/// The unit of work carried from a producer to a worker.
///
/// Move-only by construction: there is no `Clone`/`Copy` impl, and the one
/// non-`Copy` payload (`OwnedRecord`) together with the one-shot
/// [`FlushSender`] make an accidental copy a compile error rather than a
/// runtime hazard.
pub enum Envelope {
    Log {
        record: OwnedRecord,
        target: Arc<dyn DispatchTarget>,
    },
    Flush {
        target: Arc<dyn DispatchTarget>,
        signal: FlushSender,
    },
    /// Internal sentinel. Exactly one is delivered per worker (or per
    /// queue shard, for the sharded queue) at pool teardown.
    Terminate,
}

impl Envelope {
    pub fn log(record: OwnedRecord, target: Arc<dyn DispatchTarget>) -> Self {
        Envelope::Log { record, target }
    }

    pub fn flush(target: Arc<dyn DispatchTarget>, signal: FlushSender) -> Self {
        Envelope::Flush { target, signal }
    }

    pub fn is_terminate(&self) -> bool {
        matches!(self, Envelope::Terminate)
    }

    /// Dispatches this envelope's work and consumes it. `Terminate` is a
    /// no-op here — callers check [`Envelope::is_terminate`] to decide
    /// whether to keep looping before dispatching.
    pub fn dispatch(self) {
        match self {
            Envelope::Log { record, target } => target.dispatch_log(&record),
            Envelope::Flush { target, signal } => {
                target.dispatch_flush();
                signal.send(Ok(()));
            }
            Envelope::Terminate => {}
        }
    }
}
