use crate::level::Level;
use std::ops::Range;
use std::time::SystemTime;

/// Source location, captured at the call site by a macro collaborator (out of
/// scope here) and carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLoc {
    pub file: &'static str,
    pub line: u32,
    pub function: &'static str,
}

/// A byte-offset span into a formatted output buffer, set by the formatter
/// collaborator to demarcate a colored region. `(0, 0)` means "unset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorSpan {
    pub start: usize,
    pub end: usize,
}

/// A log record borrowing its logger name and message from the caller's stack.
///
/// This is the value a producer constructs at the call site. It is cheap and
/// never crosses a thread boundary as-is — [`OwnedRecord::from_borrowed`]
/// copies it into a form safe to move into an envelope.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub timestamp: SystemTime,
    pub source_loc: Option<SourceLoc>,
    pub level: Level,
    pub logger_name: &'a str,
    pub message: &'a str,
    pub thread_id: std::thread::ThreadId,
    pub color_span: ColorSpan,
}

/// An owned, movable copy of a [`Record`].
///
/// The logger-name and message text are copied into one inline buffer, with
/// the name and message spans stored as byte-offset `Range<usize>` into it
/// rather than as pointers or sub-slices. Moving or cloning an `OwnedRecord`
/// moves/clones the buffer and the ranges together, so the spans always stay
/// valid for the buffer they came from — there is no separate re-pointing
/// step that could be forgotten.
#[derive(Debug, Clone)]
pub struct OwnedRecord {
    pub timestamp: SystemTime,
    pub source_loc: Option<SourceLoc>,
    pub level: Level,
    pub thread_id: std::thread::ThreadId,
    pub color_span: ColorSpan,
    buffer: Box<[u8]>,
    logger_name_range: Range<usize>,
    message_range: Range<usize>,
}

impl OwnedRecord {
    pub fn from_borrowed(record: &Record<'_>) -> Self {
        let mut buffer = Vec::with_capacity(record.logger_name.len() + record.message.len());
        buffer.extend_from_slice(record.logger_name.as_bytes());
        let logger_name_range = 0..buffer.len();
        let message_start = buffer.len();
        buffer.extend_from_slice(record.message.as_bytes());
        let message_range = message_start..buffer.len();

        Self {
            timestamp: record.timestamp,
            source_loc: record.source_loc,
            level: record.level,
            thread_id: record.thread_id,
            color_span: record.color_span,
            buffer: buffer.into_boxed_slice(),
            logger_name_range,
            message_range,
        }
    }

    pub fn logger_name(&self) -> &str {
        // SAFETY-free: both ranges were carved from a single `String`'s bytes
        // at construction, so they always land on UTF-8 boundaries.
        std::str::from_utf8(&self.buffer[self.logger_name_range.clone()])
            .expect("logger_name_range always bounds valid utf8")
    }

    pub fn message(&self) -> &str {
        std::str::from_utf8(&self.buffer[self.message_range.clone()])
            .expect("message_range always bounds valid utf8")
    }

    /// Checks that both views resolve to slices within the owned buffer.
    /// A no-op in release builds; kept as an explicit, callable invariant
    /// check (rather than folding it silently into the accessors) so tests
    /// can assert it after every copy/move without relying on panics alone.
    pub fn debug_assert_views_rebased(&self) {
        debug_assert!(self.logger_name_range.end <= self.buffer.len());
        debug_assert!(self.message_range.end <= self.buffer.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record<'static> {
        Record {
            timestamp: SystemTime::now(),
            source_loc: None,
            level: Level::Info,
            logger_name: "app",
            message: "hello world",
            thread_id: std::thread::current().id(),
            color_span: ColorSpan::default(),
        }
    }

    #[test]
    fn owned_record_preserves_text() {
        let r = sample();
        let owned = OwnedRecord::from_borrowed(&r);
        assert_eq!(owned.logger_name(), "app");
        assert_eq!(owned.message(), "hello world");
    }

    #[test]
    fn views_survive_clone_and_move() {
        let owned = OwnedRecord::from_borrowed(&sample());
        let cloned = owned.clone();
        cloned.debug_assert_views_rebased();
        assert_eq!(cloned.logger_name(), "app");
        assert_eq!(cloned.message(), "hello world");

        let moved = cloned;
        moved.debug_assert_views_rebased();
        assert_eq!(moved.message(), "hello world");
    }

    proptest::proptest! {
        #[test]
        fn prop_views_always_rebase(name in "[a-zA-Z0-9_]{0,16}", msg in ".{0,64}") {
            let r = Record {
                timestamp: SystemTime::now(),
                source_loc: None,
                level: Level::Debug,
                logger_name: &name,
                message: &msg,
                thread_id: std::thread::current().id(),
                color_span: ColorSpan::default(),
            };
            let owned = OwnedRecord::from_borrowed(&r);
            owned.debug_assert_views_rebased();
            let moved = owned.clone();
            moved.debug_assert_views_rebased();
            prop_assert_eq!(moved.logger_name(), name);
            prop_assert_eq!(moved.message(), msg);
        }
    }
}
