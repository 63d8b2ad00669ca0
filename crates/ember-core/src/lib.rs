//! # Ember Core
//!
//! Typed configuration registry and config-driven logging for Ember.
//!
//! This crate provides:
//!
//! - **Configuration**: Named, typed variables with change listeners, loaded from YAML
//! - **Codec**: Text and document conversion for scalars, containers and logger declarations
//! - **Logging**: Pattern formatters, appenders, loggers and hot reload from config
//! - **Threads**: Named threads with stable numeric ids for log records
//! - **Utilities**: YAML flattening, path expansion, timing
//!
//! ## Example
//!
//! ```rust,no_run
//! use ember_core::{config::ConfigRegistry, log, log_info};
//!
//! let registry = ConfigRegistry::global();
//! let port = registry.lookup_or_create("system.port", 8080u16, "listen port")?;
//!
//! log::install_global()?;
//! registry.load_from_file("~/.ember/config.yml")?;
//!
//! let logger = log::LoggerManager::global().get_logger("system");
//! log_info!(logger, "listening on {}", port.get_value());
//! # Ok::<(), ember_core::EmberError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod log;
pub mod thread;
pub mod time;
pub mod util;

// Re-export commonly used items
pub use codec::ConfigValue;
pub use config::{ConfigRegistry, ConfigVar, ConfigVarBase, ListenerId, LoadSummary};
pub use ember_types::{EmberError, LogLevel, Result};
pub use log::{LogAppender, Logger, LoggerManager, PatternFormatter};

/// Ember library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Ember application name
pub const APP_NAME: &str = "ember";
