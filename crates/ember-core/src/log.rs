//! Logging pipeline for Ember.
//!
//! Records flow from a [`Logger`] through its [`LogAppender`]s, each of which
//! renders the record with a compiled [`PatternFormatter`] and writes the
//! result to a [`LogSink`]. Loggers live in a [`LoggerManager`] and can be
//! rebuilt at runtime from the `logs` configuration variable by a
//! [`LogConfigReconciler`].
//!
//! This pipeline is the product's own logging surface. Diagnostics about the
//! library itself (bad config entries, unopenable files) go through
//! `tracing`.

pub mod appender;
pub mod format;
pub mod logger;
pub mod macros;
pub mod reconcile;
pub mod record;

pub use appender::{FileSink, LogAppender, LogSink, MemorySink, StdoutSink, FALLBACK_PATTERN};
pub use format::{
    register_directive, DirectiveTable, FormatToken, PatternFormatter, Renderer, RendererFactory,
    PATTERN_ERROR_MARKER,
};
pub use logger::{Logger, LoggerManager, DEFAULT_PATTERN, ROOT_LOGGER};
pub use reconcile::{
    install, install_global, LogConfigReconciler, LoggerDefinitions, ReconcileSummary,
    LOGS_CONFIG_NAME,
};
pub use record::LogRecord;

pub use ember_types::LogLevel;
