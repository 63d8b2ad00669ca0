//! # Ember Types
//!
//! Core types, identifiers, and error definitions shared across all Ember
//! crates.
//!
//! This crate provides:
//!
//! - The [`EmberError`] taxonomy and [`Result`] alias
//! - [`ConfigName`], a validated and case-folded configuration name
//! - [`LogLevel`] and [`AppenderKind`] for the logging pipeline
//! - [`LoggerDefinition`] / [`AppenderDefinition`], the declarative shape of
//!   the `logs` configuration entry
//!
//! ## Example
//!
//! ```
//! use ember_types::{ConfigName, LogLevel};
//!
//! let name = ConfigName::new("System.Port").unwrap();
//! assert_eq!(name.as_str(), "system.port");
//!
//! let level: LogLevel = "warn".parse().unwrap();
//! assert!(level > LogLevel::Info);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod identifiers;
pub mod enums;
pub mod config;

// Re-export common types for convenience
pub use errors::{EmberError, Result};
pub use identifiers::ConfigName;
pub use enums::{AppenderKind, LogLevel};
pub use config::{AppenderDefinition, LoggerDefinition};
