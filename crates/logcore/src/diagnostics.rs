use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Thread-safe out-of-band error reporter for the worker loop.
///
/// Sink errors never unwind a worker — they are trapped at the sink
/// boundary and routed here. This writes directly to stderr rather than
/// through a logging facade crate: this crate *is* a logging core, so
/// depending on one would be circular. The monotonic sequence number and
/// de-duplication-by-nanosecond keep a burst of identical failures (a sink
/// erroring on every record in a tight loop) from flooding stderr.
static REPORT_COUNT: AtomicU64 = AtomicU64::new(0);
static LAST_REPORT_NANOS: AtomicU64 = AtomicU64::new(0);

pub fn report_worker_error(message: &str) {
    let now_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let last = LAST_REPORT_NANOS.swap(now_nanos, Ordering::AcqRel);
    if now_nanos == last {
        // Same-nanosecond duplicate: still counted, but not re-printed, to
        // avoid a CAS-retry storm turning into an stderr flood.
        REPORT_COUNT.fetch_add(1, Ordering::Relaxed);
        return;
    }
    let seq = REPORT_COUNT.fetch_add(1, Ordering::Relaxed);
    eprintln!("[*** ASYNCLOG ERROR #{seq:04} ***] [{now_nanos}] {message}");
}
