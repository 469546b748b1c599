use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

struct Inner {
    active: Mutex<bool>,
    cv: Condvar,
}

/// `C10`: one thread, one closure, one interval. Repeats "wait on a
/// condition for `interval`; if signalled, exit; else call the closure".
/// Destruction sets the condition and joins — cancellation latency is
/// bounded by `interval`.
pub struct PeriodicDriver {
    inner: Arc<Inner>,
    thread: Option<JoinHandle<()>>,
}

impl PeriodicDriver {
    /// Spawns the driver thread. `interval` must be nonzero — callers that
    /// want "no periodic driver" simply don't construct one.
    pub fn spawn(interval: Duration, mut func: impl FnMut() + Send + 'static) -> Self {
        let inner = Arc::new(Inner {
            active: Mutex::new(true),
            cv: Condvar::new(),
        });
        let thread_inner = Arc::clone(&inner);
        let thread = std::thread::Builder::new()
            .name("logregistry-periodic".into())
            .spawn(move || loop {
                let guard = thread_inner.active.lock().unwrap_or_else(|e| e.into_inner());
                let (guard, timeout) = thread_inner
                    .cv
                    .wait_timeout_while(guard, interval, |active| *active)
                    .unwrap_or_else(|e| e.into_inner());
                if !*guard {
                    return;
                }
                drop(guard);
                if timeout.timed_out() {
                    func();
                }
            })
            .expect("failed to spawn periodic driver thread");

        Self {
            inner,
            thread: Some(thread),
        }
    }
}

impl Drop for PeriodicDriver {
    fn drop(&mut self) {
        *self.inner.active.lock().unwrap_or_else(|e| e.into_inner()) = false;
        self.inner.cv.notify_one();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
