use std::sync::{Arc, Condvar, Mutex};
use thiserror::Error;

/// Failure modes for a flush barrier, per the error taxonomy: either the
/// pool tore down before the signal could fire, or it fired with an
/// explicit "shutting down" condition.
#[derive(Debug, Clone, Error)]
pub enum FlushError {
    /// The `FlushSender` half was dropped without ever calling `send` —
    /// the worker that owned the envelope exited (panic, forced shutdown)
    /// before completing the flush.
    #[error("flush signal lost: worker dropped the flush envelope before completing it")]
    Lost,
    /// The owning pool was being torn down and could not guarantee the
    /// flush had observed every prior record.
    #[error("flush aborted: pool is shutting down")]
    ShuttingDown,
}

enum FlushState {
    Pending,
    Done(Result<(), FlushError>),
}

struct Inner {
    state: Mutex<FlushState>,
    cv: Condvar,
}

/// Producer-facing half of a one-shot flush barrier. Blocks until the
/// worker that drains the paired `Flush` envelope calls [`FlushSender::send`].
pub struct FlushWaiter {
    inner: Arc<Inner>,
}

/// Worker-facing half. Must be consumed by [`FlushSender::send`] exactly
/// once; if dropped without sending, the waiter observes
/// [`FlushError::Lost`] instead of hanging forever — this is what makes
/// "the signal never fires" structurally unreachable (see design notes on
/// flush-as-a-barrier).
pub struct FlushSender {
    inner: Arc<Inner>,
    sent: bool,
}

/// Creates a fresh one-shot flush barrier.
pub fn flush_signal() -> (FlushSender, FlushWaiter) {
    let inner = Arc::new(Inner {
        state: Mutex::new(FlushState::Pending),
        cv: Condvar::new(),
    });
    (
        FlushSender {
            inner: Arc::clone(&inner),
            sent: false,
        },
        FlushWaiter { inner },
    )
}

impl FlushSender {
    pub fn send(mut self, result: Result<(), FlushError>) {
        self.sent = true;
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = FlushState::Done(result);
        drop(state);
        self.inner.cv.notify_all();
    }
}

impl Drop for FlushSender {
    fn drop(&mut self) {
        if self.sent {
            return;
        }
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(*state, FlushState::Pending) {
            *state = FlushState::Done(Err(FlushError::Lost));
            drop(state);
            self.inner.cv.notify_all();
        }
    }
}

impl FlushWaiter {
    /// Blocks until the paired sender fires, returning its result.
    pub fn wait(self) -> Result<(), FlushError> {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            match &*state {
                FlushState::Done(result) => return result.clone(),
                FlushState::Pending => {
                    state = self
                        .inner
                        .cv
                        .wait(state)
                        .unwrap_or_else(|e| e.into_inner());
                }
            }
        }
    }
}
