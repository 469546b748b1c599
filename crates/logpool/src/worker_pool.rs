use crate::config::{PoolConfig, QueueKind, ThreadHook};
use crate::error::PoolError;
use logcore::{report_worker_error, Envelope, FlushWaiter};
use logqueues::{LockFreeBlockingQueue, LockFreeShardedQueue, LockQueue, PushMode, WorkQueue};
use std::sync::Arc;
use std::thread::JoinHandle;

/// `C7`: owns exactly one queue instance and `W` worker threads.
///
/// Construction spawns `W` threads, each bound to one shard (`shard_count()
/// == 1` for [`QueueKind::Lock`]/[`QueueKind::LockFreeBlocking`] — any
/// worker may drain any envelope; `shard_count() == worker_count` for
/// [`QueueKind::LockFreeSharded`] — worker `i` drains exactly token `i`).
/// Destruction pushes one `Terminate` envelope per shard and joins every
/// worker before the queue itself drops.
pub struct WorkerPool {
    queue: Arc<dyn WorkQueue>,
    workers: Vec<JoinHandle<()>>,
    worker_count: usize,
    capacity: usize,
    queue_kind: QueueKind,
}

impl WorkerPool {
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let config = config.validated()?;
        let queue: Arc<dyn WorkQueue> = match config.queue_kind {
            QueueKind::Lock => Arc::new(LockQueue::new(config.capacity)?),
            QueueKind::LockFreeBlocking => {
                Arc::new(LockFreeBlockingQueue::new(config.capacity)?)
            }
            QueueKind::LockFreeSharded => {
                Arc::new(LockFreeShardedQueue::new(config.worker_count)?)
            }
        };

        let shard_count = queue.shard_count();
        let sharded = shard_count == config.worker_count && shard_count > 1;

        let workers = (0..config.worker_count)
            .map(|i| {
                let queue = Arc::clone(&queue);
                let shard = if sharded { i } else { 0 };
                let on_start = config.on_thread_start.clone();
                let on_stop = config.on_thread_stop.clone();
                std::thread::Builder::new()
                    .name(format!("logpool-worker-{i}"))
                    .spawn(move || worker_loop(queue, shard, on_start, on_stop))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Ok(Self {
            queue,
            workers,
            worker_count: config.worker_count,
            capacity: config.capacity,
            queue_kind: config.queue_kind,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Queue capacity this pool was constructed with. Meaningless for
    /// [`QueueKind::LockFreeSharded`], which is unbounded.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn queue_kind(&self) -> QueueKind {
        self.queue_kind
    }

    pub fn discard_count(&self) -> u64 {
        self.queue.discard_count()
    }

    pub fn overwrite_count(&self) -> u64 {
        self.queue.overwrite_count()
    }

    /// Wraps `record` into a `Log` envelope addressed to `target` and
    /// submits it under `mode`.
    pub fn enqueue_log(
        &self,
        target: Arc<dyn logcore::DispatchTarget>,
        record: logcore::OwnedRecord,
        mode: PushMode,
    ) -> Result<(), PoolError> {
        self.queue
            .push(Envelope::log(record, target), mode)
            .map_err(PoolError::from)
    }

    /// Allocates a one-shot completion signal, submits a `Flush` envelope
    /// addressed to `target`, and returns the paired waiter.
    pub fn enqueue_flush(
        &self,
        target: Arc<dyn logcore::DispatchTarget>,
        mode: PushMode,
    ) -> Result<FlushWaiter, PoolError> {
        let (sender, waiter) = logcore::flush_signal();
        self.queue
            .push(Envelope::flush(target, sender), mode)
            .map_err(PoolError::from)?;
        Ok(waiter)
    }
}

fn worker_loop(
    queue: Arc<dyn WorkQueue>,
    shard: usize,
    on_start: Option<ThreadHook>,
    on_stop: Option<ThreadHook>,
) {
    if let Some(hook) = on_start.as_ref() {
        hook();
    }
    loop {
        let envelope = queue.pop(shard);
        if envelope.is_terminate() {
            break;
        }
        envelope.dispatch();
    }
    if let Some(hook) = on_stop.as_ref() {
        hook();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let shard_count = self.queue.shard_count();
        if shard_count > 1 {
            for shard in 0..shard_count {
                self.queue.push_to_shard(shard, Envelope::Terminate);
            }
        } else {
            for _ in 0..self.worker_count {
                self.queue.push_to_shard(0, Envelope::Terminate);
            }
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                report_worker_error("logpool worker thread panicked during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logcore::{ColorSpan, Level, OwnedRecord, Record};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct CountingTarget {
        logs: AtomicUsize,
        flushes: AtomicUsize,
    }

    impl logcore::DispatchTarget for CountingTarget {
        fn dispatch_log(&self, _record: &OwnedRecord) {
            self.logs.fetch_add(1, Ordering::SeqCst);
        }
        fn dispatch_flush(&self) {
            self.flushes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sample_record(message: &str) -> OwnedRecord {
        OwnedRecord::from_borrowed(&Record {
            timestamp: std::time::SystemTime::now(),
            source_loc: None,
            level: Level::Info,
            logger_name: "t",
            message,
            thread_id: thread::current().id(),
            color_span: ColorSpan::default(),
        })
    }

    #[test]
    fn log_and_flush_round_trip_on_lock_queue() {
        let pool = WorkerPool::new(PoolConfig {
            capacity: 16,
            worker_count: 2,
            queue_kind: QueueKind::Lock,
            ..PoolConfig::default()
        })
        .unwrap();

        let target = Arc::new(CountingTarget {
            logs: AtomicUsize::new(0),
            flushes: AtomicUsize::new(0),
        });

        for i in 0..10 {
            pool.enqueue_log(
                target.clone(),
                sample_record(&i.to_string()),
                PushMode::Blocking,
            )
            .unwrap();
        }
        let waiter = pool
            .enqueue_flush(target.clone(), PushMode::Blocking)
            .unwrap();
        waiter.wait().unwrap();

        assert_eq!(target.logs.load(Ordering::SeqCst), 10);
        assert_eq!(target.flushes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sharded_pool_drains_every_worker_token() {
        let pool = WorkerPool::new(PoolConfig {
            capacity: 16,
            worker_count: 3,
            queue_kind: QueueKind::LockFreeSharded,
            ..PoolConfig::default()
        })
        .unwrap();

        let target = Arc::new(CountingTarget {
            logs: AtomicUsize::new(0),
            flushes: AtomicUsize::new(0),
        });

        for i in 0..30 {
            pool.enqueue_log(
                target.clone(),
                sample_record(&i.to_string()),
                PushMode::Force,
            )
            .unwrap();
        }
        let waiter = pool.enqueue_flush(target.clone(), PushMode::Force).unwrap();
        waiter.wait().unwrap();
        assert_eq!(target.logs.load(Ordering::SeqCst), 30);
    }

    #[test]
    fn thread_start_and_stop_hooks_fire_once_per_worker() {
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let starts_hook = Arc::clone(&starts);
        let stops_hook = Arc::clone(&stops);

        let pool = WorkerPool::new(PoolConfig {
            capacity: 16,
            worker_count: 3,
            queue_kind: QueueKind::Lock,
            on_thread_start: Some(Arc::new(move || {
                starts_hook.fetch_add(1, Ordering::SeqCst);
            })),
            on_thread_stop: Some(Arc::new(move || {
                stops_hook.fetch_add(1, Ordering::SeqCst);
            })),
        })
        .unwrap();

        assert_eq!(pool.capacity(), 16);
        assert_eq!(pool.queue_kind(), QueueKind::Lock);
        assert_eq!(pool.worker_count(), 3);

        drop(pool);
        assert_eq!(starts.load(Ordering::SeqCst), 3);
        assert_eq!(stops.load(Ordering::SeqCst), 3);
    }
}
