//! A single log record.

use crate::{thread, time};
use chrono::{DateTime, Local};
use ember_types::LogLevel;

/// Everything a renderer may need to print one log line.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Name of the logger the record was issued on
    pub logger: String,
    /// Severity
    pub level: LogLevel,
    /// Message text
    pub message: String,
    /// Source file
    pub file: String,
    /// Source line
    pub line: u32,
    /// Milliseconds since logging started
    pub elapsed_ms: u64,
    /// Numeric id of the issuing thread
    pub thread_id: u64,
    /// Name of the issuing thread
    pub thread_name: String,
    /// Fiber/task id, 0 when not running in one
    pub fiber_id: u64,
    /// Wall-clock time of the record
    pub timestamp: DateTime<Local>,
}

impl LogRecord {
    /// Capture a record for the calling thread at the current time.
    pub fn new(logger: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            logger: logger.into(),
            level,
            message: message.into(),
            file: String::new(),
            line: 0,
            elapsed_ms: time::elapsed_ms(),
            thread_id: thread::current_id(),
            thread_name: thread::current_name(),
            fiber_id: thread::current_fiber_id(),
            timestamp: Local::now(),
        }
    }

    /// Attach the source location.
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    /// Override the fiber/task id.
    pub fn with_fiber(mut self, fiber_id: u64) -> Self {
        self.fiber_id = fiber_id;
        self
    }

    /// Override the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
