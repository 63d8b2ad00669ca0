//! Error types for Ember operations.

use thiserror::Error;

/// The main error type for Ember operations.
///
/// Each variant corresponds to one failure category of the registry and the
/// logging pipeline. Most of them are handled close to where they occur: a
/// conversion failure never escapes a config variable, and a pattern error
/// produces a degraded formatter instead of an `Err`.
#[derive(Error, Debug)]
pub enum EmberError {
    /// A configuration name contains characters outside `[A-Za-z0-9._]`
    #[error("Invalid configuration name '{0}': only letters, digits, '.' and '_' are allowed")]
    InvalidName(String),

    /// A name is already registered under a different value type
    #[error("Type mismatch for '{name}': requested {expected}, registered as {actual}")]
    TypeMismatch {
        /// Configuration name
        name: String,
        /// Type requested by the caller
        expected: String,
        /// Type the variable was registered with
        actual: String,
    },

    /// A string or document could not be converted to or from a typed value
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// A log format pattern could not be compiled cleanly
    #[error("Pattern compile error: {0}")]
    PatternCompile(String),

    /// A log sink could not be opened or written
    #[error("Sink error: {0}")]
    Sink(String),

    /// A change listener rejected a new value
    #[error("Listener error: {0}")]
    Listener(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for Ember operations.
pub type Result<T> = std::result::Result<T, EmberError>;

/// Return early with an [`EmberError`] variant carrying a formatted message.
///
/// ```ignore
/// match node {
///     Value::Sequence(items) => Ok(items),
///     other => bail!(Conversion, "expected a sequence, got {}", node_kind(other)),
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($variant:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {
        return Err($crate::EmberError::$variant(format!($fmt $(, $arg)*)))
    };
}
