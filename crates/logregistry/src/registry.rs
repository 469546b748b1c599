use crate::error::RegistryError;
use crate::periodic_driver::PeriodicDriver;
use logcore::{Formatter, Level, Sink};
use logpool::{Logger, PoolConfig, WorkerPool};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

struct LoggerState {
    loggers: HashMap<String, Arc<Logger>>,
    default_logger: Option<Arc<Logger>>,
    global_pattern: String,
    global_formatter: Option<Box<dyn Formatter>>,
    global_log_level: Level,
    global_flush_level: Level,
    auto_register: bool,
}

impl Default for LoggerState {
    fn default() -> Self {
        Self {
            loggers: HashMap::new(),
            default_logger: None,
            global_pattern: "%+".to_string(),
            global_formatter: None,
            global_log_level: Level::Info,
            global_flush_level: Level::Off,
            auto_register: true,
        }
    }
}

/// `C9`: the process-wide logger/pool registry.
///
/// Three disjoint locks, matching the lock-ordering contract: the loggers
/// map, the pool handle, and the periodic driver never nest inside one
/// another, so no caller can invert their acquisition order.
pub struct Registry {
    loggers: Mutex<LoggerState>,
    pool: Mutex<Option<Arc<WorkerPool>>>,
    flusher: Mutex<Option<PeriodicDriver>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            loggers: Mutex::new(LoggerState::default()),
            pool: Mutex::new(None),
            flusher: Mutex::new(None),
        }
    }
}

static INSTANCE: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// The process-wide instance, initialized lazily on first access.
    pub fn instance() -> &'static Registry {
        INSTANCE.get_or_init(Registry::default)
    }

    pub fn set_auto_register_logger(&self, flag: bool) {
        self.loggers.lock().unwrap_or_else(|e| e.into_inner()).auto_register = flag;
    }

    /// Assigns the global pattern/level/flush-level to `logger`, then
    /// registers it if auto-register is enabled.
    pub fn initialize_logger(&self, logger: Arc<Logger>) -> Result<(), RegistryError> {
        let mut state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        logger.set_pattern(&state.global_pattern);
        if let Some(formatter) = state.global_formatter.as_deref() {
            logger.set_formatter(formatter);
        }
        logger.set_log_level(state.global_log_level);
        logger.set_flush_level(state.global_flush_level);
        if state.auto_register {
            Self::register_logger_locked(&mut state, logger)
        } else {
            Ok(())
        }
    }

    pub fn register_logger(&self, logger: Arc<Logger>) -> Result<(), RegistryError> {
        let mut state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        Self::register_logger_locked(&mut state, logger)
    }

    fn register_logger_locked(
        state: &mut LoggerState,
        logger: Arc<Logger>,
    ) -> Result<(), RegistryError> {
        let name = logger.name().to_string();
        if state.loggers.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        state.loggers.insert(name, logger);
        Ok(())
    }

    pub fn get_logger(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .loggers
            .get(name)
            .cloned()
    }

    /// Removes the named logger. If it was the default, the default handle
    /// is cleared too.
    pub fn remove_logger(&self, name: &str) {
        let mut state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        state.loggers.remove(name);
        if state
            .default_logger
            .as_ref()
            .is_some_and(|l| l.name() == name)
        {
            state.default_logger = None;
        }
    }

    pub fn default_logger(&self) -> Option<Arc<Logger>> {
        self.loggers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .default_logger
            .clone()
    }

    /// Adopts `logger` as the default, registering it if not already present.
    pub fn set_default_logger(&self, logger: Arc<Logger>) {
        let mut state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        let name = logger.name().to_string();
        state.loggers.entry(name).or_insert_with(|| logger.clone());
        state.default_logger = Some(logger);
    }

    pub fn set_global_pattern(&self, pattern: &str) {
        let mut state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        state.global_pattern = pattern.to_string();
        for logger in state.loggers.values() {
            logger.set_pattern(pattern);
        }
    }

    /// Paired with [`Registry::set_global_pattern`]: updates the global
    /// formatter prototype and pushes a clone of it to every registered
    /// logger's sink chain, leaving the global pattern untouched.
    pub fn set_global_formatter(&self, formatter: &dyn Formatter) {
        let mut state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        state.global_formatter = Some(formatter.clone_box());
        for logger in state.loggers.values() {
            logger.set_formatter(formatter);
        }
    }

    pub fn set_global_log_level(&self, level: Level) {
        let mut state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        state.global_log_level = level;
        for logger in state.loggers.values() {
            logger.set_log_level(level);
        }
    }

    pub fn set_global_flush_level(&self, level: Level) {
        let mut state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        state.global_flush_level = level;
        for logger in state.loggers.values() {
            logger.set_flush_level(level);
        }
    }

    pub fn set_pattern(&self, name: &str, pattern: &str) -> Result<(), RegistryError> {
        let state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        let logger = state
            .loggers
            .get(name)
            .ok_or_else(|| RegistryError::UnknownName(name.to_string()))?;
        logger.set_pattern(pattern);
        Ok(())
    }

    pub fn set_log_level(&self, name: &str, level: Level) -> Result<(), RegistryError> {
        let state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        let logger = state
            .loggers
            .get(name)
            .ok_or_else(|| RegistryError::UnknownName(name.to_string()))?;
        logger.set_log_level(level);
        Ok(())
    }

    pub fn set_flush_level(&self, name: &str, level: Level) -> Result<(), RegistryError> {
        let state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        let logger = state
            .loggers
            .get(name)
            .ok_or_else(|| RegistryError::UnknownName(name.to_string()))?;
        logger.set_flush_level(level);
        Ok(())
    }

    /// Invokes `f` on every registered logger while holding the map lock.
    /// Callers must not block in `f`.
    pub fn exec_all(&self, mut f: impl FnMut(&Arc<Logger>)) {
        let state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
        for logger in state.loggers.values() {
            f(logger);
        }
    }

    pub fn flush_all(&self) {
        self.exec_all(|logger| {
            let _ = Arc::clone(logger).flush();
        });
    }

    /// Creates or replaces the periodic driver bound to `flush_all`. An
    /// interval of zero tears down the driver instead.
    ///
    /// Takes `&'static self` because the driver thread outlives this call:
    /// in practice this is only ever [`Registry::instance`], whose `'static`
    /// lifetime the driver thread's closure borrows directly rather than
    /// via a reference-counted handle.
    pub fn flush_every(&'static self, interval: Duration) {
        let mut flusher = self.flusher.lock().unwrap_or_else(|e| e.into_inner());
        if interval.is_zero() {
            *flusher = None;
            return;
        }
        *flusher = Some(PeriodicDriver::spawn(interval, move || {
            self.flush_all();
        }));
    }

    pub fn initialize_thread_pool(
        &self,
        capacity: usize,
        worker_count: usize,
    ) -> Result<(), RegistryError> {
        let config = PoolConfig {
            capacity,
            worker_count,
            ..PoolConfig::default()
        };
        let pool = WorkerPool::new(config).map_err(RegistryError::from)?;
        self.register_thread_pool(Arc::new(pool));
        Ok(())
    }

    /// Adopts `pool` as the process-wide pool. The previous pool, if any, is
    /// dropped here; if nothing else still holds a strong reference to it
    /// (no in-flight envelope, no logger), its own `Drop` performs the
    /// normal terminate-all/join sequence synchronously on this call.
    pub fn register_thread_pool(&self, pool: Arc<WorkerPool>) {
        let mut guard = self.pool.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(pool);
    }

    pub fn thread_pool(&self) -> Option<Arc<WorkerPool>> {
        self.pool.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn new_logger(
        &self,
        name: impl Into<String>,
        sinks: Vec<Arc<dyn Sink>>,
    ) -> Result<Arc<Logger>, RegistryError> {
        let pool = self
            .thread_pool()
            .ok_or_else(|| RegistryError::ConfigError("no thread pool registered".into()))?;
        let logger = Logger::new(name, sinks, &pool);
        self.initialize_logger(logger.clone())?;
        Ok(logger)
    }

    /// Tears down the periodic driver, removes all loggers, and releases
    /// the pool, in that order.
    pub fn close_registry(&self) {
        *self.flusher.lock().unwrap_or_else(|e| e.into_inner()) = None;
        {
            let mut state = self.loggers.lock().unwrap_or_else(|e| e.into_inner());
            state.loggers.clear();
            state.default_logger = None;
        }
        *self.pool.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
