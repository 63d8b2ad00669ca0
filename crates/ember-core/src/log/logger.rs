//! Loggers and the named-logger directory.

use super::appender::LogAppender;
use super::format::PatternFormatter;
use super::record::LogRecord;
use crate::time;
use ember_types::{LogLevel, LoggerDefinition, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Pattern every new logger starts with.
pub const DEFAULT_PATTERN: &str = "%d{%Y-%m-%d %H:%M:%S}%T%t%T%N%T%F%T[%p]%T[%c]%T%f:%l%T%m%n";

/// Name of the distinguished root logger.
pub const ROOT_LOGGER: &str = "root";

/// A named logger: a level threshold, a default formatter and appenders.
pub struct Logger {
    name: String,
    level: RwLock<LogLevel>,
    formatter: RwLock<Arc<PatternFormatter>>,
    appenders: RwLock<Vec<Arc<LogAppender>>>,
}

impl Logger {
    /// A logger at `DEBUG` with the default pattern and no appenders.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(LogLevel::Debug),
            formatter: RwLock::new(Arc::new(PatternFormatter::new(DEFAULT_PATTERN))),
            appenders: RwLock::new(Vec::new()),
        }
    }

    /// Logger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current threshold.
    pub fn level(&self) -> LogLevel {
        *self.level.read()
    }

    /// Set the threshold.
    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
    }

    /// Default formatter handed to appenders attached without one.
    pub fn formatter(&self) -> Arc<PatternFormatter> {
        self.formatter.read().clone()
    }

    /// Replace the default formatter.
    ///
    /// Appenders already attached keep the formatter they have.
    pub fn set_formatter(&self, formatter: Arc<PatternFormatter>) {
        *self.formatter.write() = formatter;
    }

    /// Compile `pattern` and make it the default formatter.
    ///
    /// A pattern with errors is still installed; it renders inline markers.
    pub fn set_pattern(&self, pattern: &str) -> Arc<PatternFormatter> {
        let formatter = Arc::new(PatternFormatter::new(pattern));
        if formatter.is_error() {
            warn!("Logger {} uses malformed pattern '{}'", self.name, pattern);
        }
        self.set_formatter(formatter.clone());
        formatter
    }

    /// Attach an appender. One without a formatter adopts the current
    /// default formatter now.
    pub fn add_appender(&self, appender: Arc<LogAppender>) {
        appender.adopt_formatter(self.formatter());
        self.appenders.write().push(appender);
    }

    /// Detach `appender`. Returns `false` if it was not attached.
    pub fn remove_appender(&self, appender: &Arc<LogAppender>) -> bool {
        let mut appenders = self.appenders.write();
        match appenders.iter().position(|a| Arc::ptr_eq(a, appender)) {
            Some(index) => {
                appenders.remove(index);
                true
            }
            None => false,
        }
    }

    /// Detach every appender.
    pub fn clear_appenders(&self) {
        self.appenders.write().clear();
    }

    /// Attached appenders, in attach order.
    pub fn appenders(&self) -> Vec<Arc<LogAppender>> {
        self.appenders.read().clone()
    }

    /// Dispatch `record` to every appender if `level` passes the threshold.
    ///
    /// Blocks until every appender has written. Sink failures are reported
    /// and do not stop the remaining appenders.
    pub fn log(&self, level: LogLevel, record: &LogRecord) {
        if level < self.level() {
            return;
        }
        for appender in self.appenders.read().iter() {
            if let Err(e) = appender.append(level, record) {
                warn!("Logger {} failed to append: {}", self.name, e);
            }
        }
    }

    fn log_message(&self, level: LogLevel, message: &str) {
        if level >= self.level() {
            self.log(level, &LogRecord::new(self.name.as_str(), level, message));
        }
    }

    /// Log `message` at `DEBUG`.
    pub fn debug(&self, message: &str) {
        self.log_message(LogLevel::Debug, message);
    }

    /// Log `message` at `INFO`.
    pub fn info(&self, message: &str) {
        self.log_message(LogLevel::Info, message);
    }

    /// Log `message` at `WARN`.
    pub fn warn(&self, message: &str) {
        self.log_message(LogLevel::Warn, message);
    }

    /// Log `message` at `ERROR`.
    pub fn error(&self, message: &str) {
        self.log_message(LogLevel::Error, message);
    }

    /// Log `message` at `FATAL`.
    pub fn fatal(&self, message: &str) {
        self.log_message(LogLevel::Fatal, message);
    }

    /// Declarative snapshot of this logger.
    pub fn definition(&self) -> LoggerDefinition {
        LoggerDefinition {
            name: self.name.clone(),
            level: self.level(),
            pattern: Some(self.formatter().pattern().to_string()),
            appenders: self.appenders().iter().map(|a| a.definition()).collect(),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("appenders", &self.appenders.read().len())
            .finish()
    }
}

/// Get-or-create directory of named loggers.
pub struct LoggerManager {
    root: Arc<Logger>,
    loggers: RwLock<BTreeMap<String, Arc<Logger>>>,
}

impl LoggerManager {
    /// A directory holding only `root`, which writes to stdout.
    pub fn new() -> Self {
        time::mark_start();

        let root = Arc::new(Logger::new(ROOT_LOGGER));
        root.add_appender(LogAppender::stdout());

        let mut loggers = BTreeMap::new();
        loggers.insert(ROOT_LOGGER.to_string(), root.clone());

        Self {
            root,
            loggers: RwLock::new(loggers),
        }
    }

    /// Get the process-wide logger manager.
    pub fn global() -> Arc<LoggerManager> {
        static INSTANCE: Lazy<Arc<LoggerManager>> = Lazy::new(|| Arc::new(LoggerManager::new()));
        INSTANCE.clone()
    }

    /// The root logger.
    pub fn root(&self) -> Arc<Logger> {
        self.root.clone()
    }

    /// Get the logger `name`, creating an empty one if needed.
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        if let Some(logger) = self.loggers.read().get(name) {
            return logger.clone();
        }
        self.loggers
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Logger::new(name)))
            .clone()
    }

    /// Get the logger `name` without creating it.
    pub fn find(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers.read().get(name).cloned()
    }

    /// Names of every known logger, sorted.
    pub fn names(&self) -> Vec<String> {
        self.loggers.read().keys().cloned().collect()
    }

    /// Snapshot of every logger.
    pub fn definitions(&self) -> Vec<LoggerDefinition> {
        let loggers: Vec<Arc<Logger>> = self.loggers.read().values().cloned().collect();
        loggers.iter().map(|logger| logger.definition()).collect()
    }

    /// [`definitions`](Self::definitions) as a YAML sequence.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.definitions()).map_err(Into::into)
    }
}

impl std::fmt::Debug for LoggerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerManager")
            .field("loggers", &self.names())
            .finish()
    }
}

impl Default for LoggerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::appender::MemorySink;
    use crate::thread::Thread;
    use parking_lot::Mutex;

    fn attach_memory(logger: &Logger) -> Arc<MemorySink> {
        let sink = Arc::new(MemorySink::new());
        logger.add_appender(Arc::new(LogAppender::new(sink.clone())));
        sink
    }

    #[test]
    fn test_level_threshold() {
        let logger = Logger::new("demo");
        logger.set_pattern("%p %m%n");
        let sink = attach_memory(&logger);
        logger.set_level(LogLevel::Warn);

        logger.info("dropped");
        logger.warn("kept");
        logger.fatal("also kept");
        assert_eq!(sink.contents(), "WARN kept\nFATAL also kept\n");
    }

    #[test]
    fn test_appender_adopts_formatter_at_attach_time() {
        let logger = Logger::new("demo");
        logger.set_pattern("first:%m%n");
        let sink = attach_memory(&logger);

        logger.set_pattern("second:%m%n");
        logger.info("x");
        assert_eq!(sink.take(), "first:x\n");

        let late = attach_memory(&logger);
        logger.info("y");
        assert_eq!(sink.take(), "first:y\n");
        assert_eq!(late.take(), "second:y\n");
    }

    #[test]
    fn test_shared_appender() {
        let a = Logger::new("a");
        let b = Logger::new("b");
        let sink = Arc::new(MemorySink::new());
        let appender = Arc::new(LogAppender::new(sink.clone()));
        appender.set_formatter(Arc::new(PatternFormatter::new("%c:%m%n")));
        a.add_appender(appender.clone());
        b.add_appender(appender.clone());

        a.info("one");
        b.info("two");
        assert_eq!(sink.contents(), "a:one\nb:two\n");

        assert!(a.remove_appender(&appender));
        assert!(!a.remove_appender(&appender));
        assert_eq!(b.appenders().len(), 1);
    }

    #[test]
    fn test_off_mutes() {
        let logger = Logger::new("demo");
        let sink = attach_memory(&logger);
        logger.set_level(LogLevel::Off);
        logger.fatal("silent");
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn test_manager_get_or_create() {
        let manager = LoggerManager::new();
        let root = manager.root();
        assert_eq!(root.name(), ROOT_LOGGER);
        assert_eq!(root.appenders().len(), 1);
        assert!(Arc::ptr_eq(&root, &manager.get_logger(ROOT_LOGGER)));

        assert!(manager.find("system").is_none());
        let system = manager.get_logger("system");
        assert!(system.appenders().is_empty());
        assert!(Arc::ptr_eq(&system, &manager.get_logger("system")));
        assert_eq!(manager.names(), vec!["root".to_string(), "system".to_string()]);
    }

    #[test]
    fn test_definition_snapshot() {
        let manager = LoggerManager::new();
        let logger = manager.get_logger("svc");
        logger.set_level(LogLevel::Info);
        logger.set_pattern("%m%n");
        logger.add_appender(LogAppender::stdout());

        let def = logger.definition();
        assert_eq!(def.level, LogLevel::Info);
        assert_eq!(def.pattern.as_deref(), Some("%m%n"));
        assert_eq!(def.appenders.len(), 1);
        assert_eq!(def.appenders[0].kind, "StdoutLogAppender");

        let yaml = manager.to_yaml_string().unwrap();
        assert!(yaml.contains("name: svc"));
        assert!(yaml.contains("name: root"));
    }

    #[test]
    fn test_concurrent_get_logger_returns_one_instance() {
        let manager = Arc::new(LoggerManager::new());
        let shared = Arc::new(Mutex::new(Vec::new()));

        let mut threads = Vec::new();
        for n in 0..8 {
            let (manager, shared) = (manager.clone(), shared.clone());
            threads.push(
                Thread::spawn(format!("lookup_{}", n), move || {
                    for _ in 0..100 {
                        shared.lock().push(manager.get_logger("shared"));
                    }
                    manager.get_logger(&format!("own_{}", n));
                })
                .unwrap(),
            );
        }
        for thread in threads {
            thread.join().unwrap();
        }

        let expected = manager.find("shared").unwrap();
        let shared = shared.lock();
        assert_eq!(shared.len(), 800);
        assert!(shared.iter().all(|logger| Arc::ptr_eq(logger, &expected)));
        assert_eq!(manager.names().len(), 10);
    }
}
