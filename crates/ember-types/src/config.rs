//! Declarative logger configuration types.
//!
//! These mirror one entry of the `logs` document:
//!
//! ```yaml
//! logs:
//!   - name: root
//!     level: INFO
//!     pattern: "%d%T%m%n"
//!     appender:
//!       - type: FileLogAppender
//!         file: /var/log/app.log
//!       - type: StdoutLogAppender
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use crate::LogLevel;

/// Declared configuration of one named logger.
///
/// Compared by full structural equality when deciding whether a logger must
/// be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoggerDefinition {
    /// Logger name
    pub name: String,

    /// Threshold; absent or unrecognized values mean `OFF`
    #[serde(default = "default_level", deserialize_with = "lenient_level")]
    pub level: LogLevel,

    /// Default pattern for appenders without their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Appenders in attach order
    #[serde(rename = "appender", default, skip_serializing_if = "Vec::is_empty")]
    pub appenders: Vec<AppenderDefinition>,
}

impl LoggerDefinition {
    /// Create a definition with no pattern and no appenders.
    pub fn new(name: impl Into<String>, level: LogLevel) -> Self {
        Self {
            name: name.into(),
            level,
            pattern: None,
            appenders: Vec::new(),
        }
    }

    /// Set the default pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Append an appender definition.
    pub fn with_appender(mut self, appender: AppenderDefinition) -> Self {
        self.appenders.push(appender);
        self
    }
}

/// Declared configuration of one appender.
///
/// `kind` is kept as the raw document string so that a single unknown type
/// only invalidates its own logger during reconciliation, not the whole set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AppenderDefinition {
    /// `StdoutLogAppender` or `FileLogAppender`
    #[serde(rename = "type")]
    pub kind: String,

    /// Target path, required for file appenders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Pattern override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl AppenderDefinition {
    /// Console appender definition.
    pub fn stdout() -> Self {
        Self {
            kind: crate::AppenderKind::Stdout.as_str().to_string(),
            file: None,
            pattern: None,
        }
    }

    /// File appender definition.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            kind: crate::AppenderKind::File.as_str().to_string(),
            file: Some(path.into()),
            pattern: None,
        }
    }

    /// Set the pattern override.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

fn default_level() -> LogLevel {
    LogLevel::Off
}

fn lenient_level<'de, D>(deserializer: D) -> std::result::Result<LogLevel, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_yaml::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_yaml::Value::String(s) => LogLevel::parse_or_off(&s),
        _ => LogLevel::Off,
    })
}
