use crate::error::PoolError;
use crate::worker_pool::WorkerPool;
use logcore::{
    report_worker_error, BacktraceRecorder, ColorSpan, DispatchTarget, Formatter, Level,
    OwnedRecord, Record, Sink, SourceLoc,
};
use logqueues::PushMode;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// `C8`: the non-owning producer side of an async logger.
///
/// Holds a *weak* handle to its pool — producers must not keep the pool
/// alive, or teardown deadlocks waiting for producers that are waiting on
/// the pool — and the shared logger state: name,
/// sink chain, severity/flush thresholds, and an optional backtrace
/// recorder. The worker side (invoked through [`DispatchTarget`], dispatched
/// off an envelope that holds a *strong* `Arc<Logger>`) walks the same sink
/// chain to actually perform the write.
pub struct Logger {
    name: String,
    sinks: Mutex<Vec<Arc<dyn Sink>>>,
    log_level: AtomicU8,
    flush_level: AtomicU8,
    backtrace: Mutex<Option<BacktraceRecorder>>,
    pool: Weak<WorkerPool>,
    overflow_mode: PushMode,
    pattern: Mutex<String>,
}

impl Logger {
    pub fn new(name: impl Into<String>, sinks: Vec<Arc<dyn Sink>>, pool: &Arc<WorkerPool>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            sinks: Mutex::new(sinks),
            log_level: AtomicU8::new(Level::Trace.as_u8()),
            flush_level: AtomicU8::new(Level::Off.as_u8()),
            backtrace: Mutex::new(None),
            pool: Arc::downgrade(pool),
            overflow_mode: PushMode::Blocking,
            pattern: Mutex::new("%+".to_string()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_level(&self) -> Level {
        Level::from_u8(self.log_level.load(Ordering::Relaxed))
    }

    pub fn set_log_level(&self, level: Level) {
        self.log_level.store(level.as_u8(), Ordering::Relaxed);
    }

    pub fn flush_level(&self) -> Level {
        Level::from_u8(self.flush_level.load(Ordering::Relaxed))
    }

    pub fn set_flush_level(&self, level: Level) {
        self.flush_level.store(level.as_u8(), Ordering::Relaxed);
    }

    pub fn set_pattern(&self, pattern: &str) {
        *self.pattern.lock().unwrap_or_else(|e| e.into_inner()) = pattern.to_string();
        for sink in self.sinks.lock().unwrap_or_else(|e| e.into_inner()).iter() {
            sink.set_pattern(pattern);
        }
    }

    /// The pattern last assigned via [`Logger::set_pattern`] (directly or
    /// through a registry-wide `set_global_pattern`), paired with whatever
    /// formatter is currently installed on this logger's sinks.
    pub fn pattern(&self) -> String {
        self.pattern.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Installs `formatter` on every sink in this logger's chain. Paired
    /// with [`Logger::set_pattern`]: a registry-wide `set_global_formatter`
    /// calls this without touching the pattern string, the way
    /// `set_global_pattern` calls [`Logger::set_pattern`] without touching
    /// the formatter.
    pub fn set_formatter(&self, formatter: &dyn Formatter) {
        for sink in self.sinks.lock().unwrap_or_else(|e| e.into_inner()).iter() {
            sink.set_formatter(formatter.clone_box());
        }
    }

    pub fn enable_backtrace(&self, capacity: usize) {
        let mut guard = self.backtrace.lock().unwrap_or_else(|e| e.into_inner());
        let recorder = guard.get_or_insert_with(BacktraceRecorder::new);
        recorder.enable(capacity);
    }

    pub fn disable_backtrace(&self) {
        if let Some(recorder) = self.backtrace.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            recorder.disable();
        }
    }

    /// Drains and invokes `f` on every backtraced record, in FIFO order, if
    /// backtrace recording is enabled.
    pub fn drain_backtrace(&self, f: impl FnMut(OwnedRecord)) {
        if let Some(recorder) = self.backtrace.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            recorder.drain(f);
        }
    }

    fn should_log(&self, level: Level) -> bool {
        level >= self.log_level()
    }

    fn backtrace_enabled(&self) -> bool {
        self.backtrace
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(BacktraceRecorder::is_enabled)
    }

    /// Producer-side entry point: level/backtrace admission, then submit to
    /// the pool. Fails fast with `PoolGone` if the pool has already torn
    /// down.
    pub fn log(
        self: Arc<Self>,
        source_loc: Option<SourceLoc>,
        level: Level,
        message: &str,
    ) -> Result<(), PoolError> {
        let log_enabled = self.should_log(level);
        let backtrace_enabled = self.backtrace_enabled();
        if !log_enabled && !backtrace_enabled {
            return Ok(());
        }

        let record = Record {
            timestamp: std::time::SystemTime::now(),
            source_loc,
            level,
            logger_name: &self.name,
            message,
            thread_id: std::thread::current().id(),
            color_span: ColorSpan::default(),
        };
        let owned = OwnedRecord::from_borrowed(&record);

        if backtrace_enabled {
            let guard = self.backtrace.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(recorder) = guard.as_ref() {
                recorder.push(&owned);
            }
        }

        if !log_enabled {
            return Ok(());
        }

        let overflow_mode = self.overflow_mode;
        let pool = self.pool.upgrade().ok_or(PoolError::PoolGone)?;
        pool.enqueue_log(self as Arc<dyn DispatchTarget>, owned, overflow_mode)
    }

    /// Producer-side flush: submits a `Flush` envelope and blocks until the
    /// worker that drains it finishes flushing every sink.
    pub fn flush(self: Arc<Self>) -> Result<(), PoolError> {
        let overflow_mode = self.overflow_mode;
        let pool = self.pool.upgrade().ok_or(PoolError::PoolGone)?;
        let waiter = pool.enqueue_flush(self as Arc<dyn DispatchTarget>, overflow_mode)?;
        waiter.wait().map_err(PoolError::from)
    }
}

impl DispatchTarget for Logger {
    fn dispatch_log(&self, record: &OwnedRecord) {
        let sinks = self.sinks.lock().unwrap_or_else(|e| e.into_inner());
        for sink in sinks.iter() {
            if sink.should_log(record.level) {
                if let Err(err) = sink.log(record) {
                    report_worker_error(&format!("logger '{}': {err}", self.name));
                }
            }
        }
        drop(sinks);

        if record.level != Level::Off && record.level >= self.flush_level() {
            self.dispatch_flush();
        }
    }

    fn dispatch_flush(&self) {
        let sinks = self.sinks.lock().unwrap_or_else(|e| e.into_inner());
        for sink in sinks.iter() {
            if let Err(err) = sink.flush() {
                report_worker_error(&format!("logger '{}': {err}", self.name));
            }
        }
    }
}
