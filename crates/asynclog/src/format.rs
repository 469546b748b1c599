use logcore::{Formatter, OwnedRecord};

/// The one built-in [`Formatter`]: renders a record as
/// `"{level} {logger}: {message}"`, with no color spans set. Stands in for
/// the pattern-compiler collaborator this crate leaves out of scope — it
/// exists only so [`crate::sink::StdoutSink`]/[`crate::sink::TestSink`] have
/// something to call.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn format(&self, record: &OwnedRecord, out: &mut String) {
        out.push_str(record.level.as_str());
        out.push(' ');
        out.push_str(record.logger_name());
        out.push_str(": ");
        out.push_str(record.message());
    }

    fn clone_box(&self) -> Box<dyn Formatter> {
        Box::new(*self)
    }
}
