use crate::format::PlainFormatter;
use logcore::{Formatter, Level, OwnedRecord, Sink, SinkError};
use std::io::Write;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Duration;

struct FormatterSlot {
    pattern: String,
    formatter: Box<dyn Formatter>,
}

impl Default for FormatterSlot {
    fn default() -> Self {
        Self {
            pattern: "%+".to_string(),
            formatter: Box::new(PlainFormatter),
        }
    }
}

/// Writes formatted records to stdout. Grounded in the same
/// "format-then-write-a-line" shape as a process-facing exporter sink.
pub struct StdoutSink {
    level: AtomicU8,
    slot: Mutex<FormatterSlot>,
}

impl StdoutSink {
    pub fn new(level: Level) -> Self {
        Self {
            level: AtomicU8::new(level.as_u8()),
            slot: Mutex::new(FormatterSlot::default()),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new(Level::Trace)
    }
}

impl Sink for StdoutSink {
    fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    fn log(&self, record: &OwnedRecord) -> Result<(), SinkError> {
        let mut line = String::new();
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .formatter
            .format(record, &mut line);
        line.push('\n');
        std::io::stdout()
            .write_all(line.as_bytes())
            .map_err(|source| SinkError::Write {
                name: "stdout".to_string(),
                source,
            })
    }

    fn flush(&self) -> Result<(), SinkError> {
        std::io::stdout()
            .flush()
            .map_err(|source| SinkError::Flush {
                name: "stdout".to_string(),
                source,
            })
    }

    fn set_pattern(&self, pattern: &str) {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).pattern = pattern.to_string();
    }

    fn set_formatter(&self, formatter: Box<dyn Formatter>) {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).formatter = formatter;
    }
}

/// Discards every record and every flush. Useful as a throwaway sink for
/// benchmarks and dead-pool tests.
#[derive(Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn level(&self) -> Level {
        Level::Trace
    }

    fn log(&self, _record: &OwnedRecord) -> Result<(), SinkError> {
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn set_pattern(&self, _pattern: &str) {}

    fn set_formatter(&self, _formatter: Box<dyn Formatter>) {}
}

/// Records every delivered record and counts flushes, behind a mutex —
/// the observation point end-to-end tests assert against. An optional
/// per-write delay simulates a slow backend for back-pressure scenarios.
#[derive(Default)]
pub struct TestSink {
    level: AtomicU8,
    records: Mutex<Vec<String>>,
    flush_count: AtomicU64,
    delay: Mutex<Option<Duration>>,
}

impl TestSink {
    pub fn new(level: Level) -> Self {
        Self {
            level: AtomicU8::new(level.as_u8()),
            records: Mutex::new(Vec::new()),
            flush_count: AtomicU64::new(0),
            delay: Mutex::new(None),
        }
    }

    /// Injects a per-write delay, simulating a slow backend.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
        self
    }

    pub fn recorded(&self) -> Vec<String> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::SeqCst)
    }
}

impl Sink for TestSink {
    fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    fn log(&self, record: &OwnedRecord) -> Result<(), SinkError> {
        if let Some(delay) = *self.delay.lock().unwrap_or_else(|e| e.into_inner()) {
            std::thread::sleep(delay);
        }
        let mut line = String::new();
        PlainFormatter.format(record, &mut line);
        self.records.lock().unwrap_or_else(|e| e.into_inner()).push(line);
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_pattern(&self, _pattern: &str) {}

    fn set_formatter(&self, _formatter: Box<dyn Formatter>) {}
}
