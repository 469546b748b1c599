use crate::level::Level;
use crate::record::OwnedRecord;
use thiserror::Error;

/// Error surfaced at a sink boundary. Trapped by the worker loop (see
/// `logpool::WorkerPool::worker_loop`) and routed to
/// [`crate::diagnostics::report_worker_error`]; never propagated out of the
/// worker.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink '{name}' failed to write: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sink '{name}' failed to flush: {source}")]
    Flush {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Renders a record into an output buffer. The pattern-compilation and
/// field-formatting language itself is out of scope for this core (see
/// purpose/scope); this is only the seam the core calls through.
pub trait Formatter: Send + Sync {
    /// Appends formatted bytes for `record` to `out`. May record a colored
    /// span via `record`'s (interior-mutable) color indices — not
    /// implemented by the minimal formatter shipped here.
    fn format(&self, record: &OwnedRecord, out: &mut String);

    /// Deep-clones this formatter, preserving any user-added flags.
    fn clone_box(&self) -> Box<dyn Formatter>;
}

/// An end stage that writes formatted bytes to a destination. Sinks are
/// shared (ref-counted) by loggers because the same sink can back multiple
/// logger chains.
pub trait Sink: Send + Sync {
    fn should_log(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// This sink's own severity threshold.
    fn level(&self) -> Level;

    fn log(&self, record: &OwnedRecord) -> Result<(), SinkError>;

    fn flush(&self) -> Result<(), SinkError>;

    fn set_pattern(&self, pattern: &str);

    fn set_formatter(&self, formatter: Box<dyn Formatter>);
}
