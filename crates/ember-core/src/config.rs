//! Typed configuration registry.
//!
//! This module provides:
//! - [`ConfigVar`]: one named, typed, mutable setting with change listeners
//! - [`ConfigRegistry`]: the name -> variable map with type-checked lookup,
//!   document loading and export
//!
//! ## Example
//!
//! ```rust
//! use ember_core::config::ConfigRegistry;
//!
//! let registry = ConfigRegistry::new();
//! let port = registry.lookup_or_create("system.port", 8080i32, "system port")?;
//!
//! port.add_listener(|old, new| {
//!     println!("port changed from {} to {}", old, new);
//!     Ok(())
//! });
//!
//! registry.load_from_str("system:\n  port: 9090\n")?;
//! assert_eq!(port.get_value(), 9090);
//! # Ok::<(), ember_types::EmberError>(())
//! ```

pub mod registry;
pub mod var;

pub use registry::{ConfigRegistry, LoadSummary};
pub use var::{ConfigVar, ConfigVarBase, ListenerId};
