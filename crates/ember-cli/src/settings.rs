//! Settings the `ember` binary declares before loading a document.

use anyhow::{Context, Result};
use ember_core::config::{ConfigRegistry, ConfigVar, LoadSummary};
use ember_core::log::{self, LoggerDefinitions, LoggerManager};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Per-user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ember")
        .join("config.yml")
}

/// Handles to the variables the binary knows about.
#[allow(dead_code)]
pub struct Settings {
    pub port: Arc<ConfigVar<i32>>,
    pub value: Arc<ConfigVar<f32>>,
    pub name: Arc<ConfigVar<String>>,
    pub tags: Arc<ConfigVar<Vec<String>>>,
    pub logs: Arc<ConfigVar<LoggerDefinitions>>,
}

impl Settings {
    /// Declare every setting in `registry` and hook `logs` up to `manager`.
    pub fn declare(registry: &ConfigRegistry, manager: Arc<LoggerManager>) -> Result<Self> {
        let (logs, _) = log::install(registry, manager)?;
        Ok(Self {
            port: registry.lookup_or_create("system.port", 8080, "system port")?,
            value: registry.lookup_or_create("system.value", 1.2f32, "system value")?,
            name: registry.lookup_or_create("system.name", "ember".to_string(), "service name")?,
            tags: registry.lookup_or_create("system.tags", Vec::new(), "service tags")?,
            logs,
        })
    }
}

/// Load `path` into `registry`.
///
/// A missing file at the default location is not an error; the declared
/// defaults stay in effect.
pub fn load(registry: &ConfigRegistry, path: &Path) -> Result<Option<LoadSummary>> {
    if !path.exists() && path == default_config_path() {
        info!("No configuration at {}, using defaults", path.display());
        return Ok(None);
    }
    let summary = registry
        .load_from_file(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(Some(summary))
}
