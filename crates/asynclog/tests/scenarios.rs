use asynclog::{
    Level, Logger, PlainFormatter, PoolConfig, QueueKind, Registry, SourceLoc, TestSink,
    WorkerPool,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn pool(capacity: usize, worker_count: usize, queue_kind: QueueKind) -> Arc<WorkerPool> {
    Arc::new(
        WorkerPool::new(PoolConfig {
            capacity,
            worker_count,
            queue_kind,
            ..PoolConfig::default()
        })
        .unwrap(),
    )
}

fn log_at(logger: &Arc<Logger>, level: Level, message: &str) {
    Arc::clone(logger)
        .log(None::<SourceLoc>, level, message)
        .unwrap();
}

/// Scenario 1: lock queue back-pressure under a slow sink.
#[test]
fn lock_queue_absorbs_backpressure_under_slow_sink() {
    let pool = pool(128, 1, QueueKind::Lock);
    let sink: Arc<TestSink> = Arc::new(TestSink::new(Level::Trace).with_delay(Duration::from_millis(2)));
    let logger = Logger::new("scenario1", vec![sink.clone()], &pool);

    for i in 0..256 {
        log_at(&logger, Level::Info, &format!("msg {i}"));
    }
    logger.flush().unwrap();

    assert_eq!(sink.record_count(), 256);
    assert_eq!(sink.flush_count(), 1);
    assert_eq!(pool.discard_count(), 0);
    assert_eq!(pool.overwrite_count(), 0);
}

/// Scenario 2: lock-free blocking queue drains everything submitted.
#[test]
fn lock_free_blocking_queue_drains_all_records() {
    let pool = pool(128, 1, QueueKind::LockFreeBlocking);
    let sink: Arc<TestSink> = Arc::new(TestSink::new(Level::Trace));
    let logger = Logger::new("scenario2", vec![sink.clone()], &pool);

    for i in 0..256 {
        log_at(&logger, Level::Info, &format!("msg {i}"));
    }
    logger.flush().unwrap();

    assert_eq!(sink.record_count(), 256);
    assert_eq!(sink.flush_count(), 1);
}

/// Scenario 3: two producers, two workers, each of the three pool
/// variants, all feeding one shared sink.
#[test]
fn two_producers_across_all_pool_variants_deliver_everything() {
    let sink: Arc<TestSink> = Arc::new(TestSink::new(Level::Trace));

    for queue_kind in [
        QueueKind::Lock,
        QueueKind::LockFreeBlocking,
        QueueKind::LockFreeSharded,
    ] {
        let pool = pool(128, 2, queue_kind);
        let logger = Logger::new(format!("scenario3-{queue_kind:?}"), vec![sink.clone()], &pool);

        let producers: Vec<_> = (0..2)
            .map(|p| {
                let logger = Arc::clone(&logger);
                thread::spawn(move || {
                    for i in 0..256 {
                        log_at(&logger, Level::Info, &format!("p{p} {i}"));
                    }
                    logger.flush().unwrap();
                })
            })
            .collect();
        for p in producers {
            p.join().unwrap();
        }
    }

    assert_eq!(sink.record_count(), 1536);
    assert_eq!(sink.flush_count(), 6);
}

/// Scenario 4: a dead pool fails every subsequent enqueue fast.
#[test]
fn dead_pool_fails_log_attempts_fast() {
    let sink: Arc<TestSink> = Arc::new(TestSink::new(Level::Trace));
    let pool = pool(16, 1, QueueKind::Lock);
    let logger = Logger::new("scenario4", vec![sink.clone()], &pool);
    drop(pool);

    let result = logger.log(None::<SourceLoc>, Level::Info, "should not land");
    assert!(matches!(result, Err(asynclog::PoolError::PoolGone)));
    assert_eq!(sink.record_count(), 0);
}

/// Scenario 5: a periodic driver flushes at roughly the configured interval.
#[test]
fn periodic_flush_fires_a_few_times_over_one_second() {
    let registry: &'static Registry = Box::leak(Box::new(Registry::default()));
    registry.initialize_thread_pool(128, 1).unwrap();
    let sink: Arc<TestSink> = Arc::new(TestSink::new(Level::Trace));
    registry.new_logger("scenario5", vec![sink.clone()]).unwrap();

    registry.flush_every(Duration::from_millis(300));
    thread::sleep(Duration::from_secs(1));
    registry.flush_every(Duration::ZERO);

    let count = sink.flush_count();
    assert!((2..=4).contains(&count), "flush count was {count}");
}

/// Scenario 6: backtrace recording below the logging threshold.
#[test]
fn backtrace_retains_only_the_most_recent_capacity_records() {
    let pool = pool(16, 1, QueueKind::Lock);
    let sink: Arc<TestSink> = Arc::new(TestSink::new(Level::Trace));
    let logger = Logger::new("scenario6", vec![sink.clone()], &pool);
    logger.set_log_level(Level::Warn);
    logger.enable_backtrace(5);

    for i in 0..100 {
        log_at(&logger, Level::Debug, &format!("debug {i}"));
    }

    let mut observed = Vec::new();
    logger.drain_backtrace(|record| observed.push(record.message().to_string()));
    assert_eq!(
        observed,
        vec!["debug 95", "debug 96", "debug 97", "debug 98", "debug 99"]
    );

    logger.disable_backtrace();
    for i in 0..10 {
        log_at(&logger, Level::Debug, &format!("after-disable {i}"));
    }
    let mut second = Vec::new();
    logger.drain_backtrace(|record| second.push(record.message().to_string()));
    assert!(second.is_empty());
    assert_eq!(sink.record_count(), 0);
}

/// A sink that actually honors `set_formatter`, unlike [`TestSink`] (which
/// always renders through [`PlainFormatter`]) — needed to observe that a
/// formatter installed through the registry actually reaches a sink chain.
#[derive(Default)]
struct FormatterObservingSink {
    formatter: std::sync::Mutex<Option<Box<dyn asynclog::Formatter>>>,
    last: std::sync::Mutex<Option<String>>,
}

impl asynclog::SinkTrait for FormatterObservingSink {
    fn level(&self) -> Level {
        Level::Trace
    }
    fn log(&self, record: &asynclog::OwnedRecord) -> Result<(), asynclog::SinkError> {
        let mut line = String::new();
        match self.formatter.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(formatter) => formatter.format(record, &mut line),
            None => PlainFormatter.format(record, &mut line),
        }
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(line);
        Ok(())
    }
    fn flush(&self) -> Result<(), asynclog::SinkError> {
        Ok(())
    }
    fn set_pattern(&self, _pattern: &str) {}
    fn set_formatter(&self, formatter: Box<dyn asynclog::Formatter>) {
        *self.formatter.lock().unwrap_or_else(|e| e.into_inner()) = Some(formatter);
    }
}

/// Scenario 7: `set_global_pattern`/`set_global_formatter` reach every
/// registered logger, and a logger registered afterwards picks up the
/// current global values too.
#[test]
fn global_pattern_and_formatter_reach_every_registered_logger() {
    let registry: &'static Registry = Box::leak(Box::new(Registry::default()));
    registry.initialize_thread_pool(128, 1).unwrap();

    let sink_a = Arc::new(FormatterObservingSink::default());
    let sink_b = Arc::new(FormatterObservingSink::default());
    let logger_a = registry.new_logger("scenario7-a", vec![sink_a.clone()]).unwrap();
    let logger_b = registry.new_logger("scenario7-b", vec![sink_b.clone()]).unwrap();

    registry.set_global_pattern("%l %n: %v");
    registry.set_global_formatter(&PlainFormatter);

    assert_eq!(logger_a.pattern(), "%l %n: %v");
    assert_eq!(logger_b.pattern(), "%l %n: %v");

    log_at(&logger_a, Level::Info, "hello from a");
    log_at(&logger_b, Level::Info, "hello from b");
    logger_a.flush().unwrap();
    logger_b.flush().unwrap();

    let last_a = sink_a.last.lock().unwrap().clone();
    let last_b = sink_b.last.lock().unwrap().clone();
    assert_eq!(last_a, Some("info scenario7-a: hello from a".to_string()));
    assert_eq!(last_b, Some("info scenario7-b: hello from b".to_string()));

    // A logger registered after the global setters still inherits both.
    let sink_c = Arc::new(FormatterObservingSink::default());
    let logger_c = registry.new_logger("scenario7-c", vec![sink_c.clone()]).unwrap();
    assert_eq!(logger_c.pattern(), "%l %n: %v");
    log_at(&logger_c, Level::Info, "hello from c");
    logger_c.flush().unwrap();
    let last_c = sink_c.last.lock().unwrap().clone();
    assert_eq!(last_c, Some("info scenario7-c: hello from c".to_string()));
}
