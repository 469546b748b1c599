use crate::record::OwnedRecord;
use crate::ring::RingBuffer;
use std::sync::Mutex;

struct State {
    enabled: bool,
    ring: RingBuffer<OwnedRecord>,
}

/// A thread-safe, capped "most recent N records" recorder attached to a
/// logger. Every state transition and read is serialized by its own mutex —
/// callers never need to bring their own synchronization.
pub struct BacktraceRecorder {
    state: Mutex<State>,
}

impl Default for BacktraceRecorder {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                enabled: false,
                ring: RingBuffer::new(0),
            }),
        }
    }
}

impl BacktraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-creates the ring with capacity `n` and enables recording.
    pub fn enable(&self, n: usize) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.ring = RingBuffer::new(n);
        state.enabled = true;
    }

    /// Disables recording and discards any buffered records.
    pub fn disable(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.enabled = false;
        state.ring = RingBuffer::new(0);
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).enabled
    }

    /// Copies `record` into the ring (overwriting the oldest) if enabled.
    /// A no-op otherwise.
    pub fn push(&self, record: &OwnedRecord) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.enabled {
            state.ring.push_back(record.clone());
        }
    }

    /// If enabled, pops every buffered record in FIFO order and invokes `f`
    /// on each; the ring is empty afterward. A no-op (calls `f` zero times)
    /// if disabled.
    pub fn drain<F: FnMut(OwnedRecord)>(&self, mut f: F) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.enabled {
            return;
        }
        while let Some(record) = state.ring.pop_front() {
            f(record);
        }
    }
}
