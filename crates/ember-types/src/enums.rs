//! Common enumerations used throughout Ember.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::errors::{EmberError, Result};

/// Severity of a log record, ordered from most verbose to silent.
///
/// A logger with threshold `T` accepts a record at level `L` iff `L >= T`,
/// so `All` lets everything through and `Off` mutes the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Everything
    All,
    /// Debug messages
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
    /// Unrecoverable errors
    Fatal,
    /// Nothing; used to mute a logger
    Off,
}

impl LogLevel {
    /// All levels in ascending order.
    pub const ALL_LEVELS: [LogLevel; 7] = [
        LogLevel::All,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
        LogLevel::Off,
    ];

    /// Upper-case name as it appears in rendered records and documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::All => "ALL",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::Off => "OFF",
        }
    }

    /// Parse a level name, falling back to `Off` for anything unrecognized.
    pub fn parse_or_off(s: &str) -> Self {
        s.parse().unwrap_or(LogLevel::Off)
    }
}

impl FromStr for LogLevel {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(LogLevel::All),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            "OFF" => Ok(LogLevel::Off),
            _ => crate::bail!(Conversion, "Invalid log level: {}", s),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink kinds an appender can be declared with.
///
/// Declarations keep the kind as text; it is parsed when the appender is
/// built, so an unknown kind only fails that one logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppenderKind {
    /// Writes to standard output
    Stdout,
    /// Appends to a file
    File,
}

impl AppenderKind {
    /// Name used in the declared-logger document.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppenderKind::Stdout => "StdoutLogAppender",
            AppenderKind::File => "FileLogAppender",
        }
    }
}

impl FromStr for AppenderKind {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "StdoutLogAppender" => Ok(AppenderKind::Stdout),
            "FileLogAppender" => Ok(AppenderKind::File),
            _ => crate::bail!(Conversion, "Unknown appender type: {}", s),
        }
    }
}

impl fmt::Display for AppenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
