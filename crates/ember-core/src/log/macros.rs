//! Logging macros that capture the call site.
//!
//! ```ignore
//! let logger = LoggerManager::global().get_logger("system");
//! log_info!(logger, "listening on {}", addr);
//! ```

/// Log a formatted message on `logger` at `level`, recording `file!()` and
/// `line!()`. The message is only formatted if the level passes the
/// logger's threshold.
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level: $crate::LogLevel = $level;
        if level >= logger.level() {
            let record = $crate::log::LogRecord::new(logger.name(), level, format!($($arg)+))
                .with_location(file!(), line!());
            logger.log(level, &record);
        }
    }};
}

/// Log at `DEBUG`.
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log at `INFO`.
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log at `WARN`.
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log at `ERROR`.
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log at `FATAL`.
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
