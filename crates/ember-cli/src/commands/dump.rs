//! Print the registry after loading a configuration file.

use crate::cli::OutputFormat;
use crate::settings::{self, Settings};
use anyhow::{Context, Result};
use colored::Colorize;
use ember_core::config::ConfigRegistry;
use ember_core::log::LoggerManager;
use std::path::PathBuf;
use std::sync::Arc;

pub fn execute(path: PathBuf, format: OutputFormat) -> Result<()> {
    let registry = ConfigRegistry::new();
    Settings::declare(&registry, Arc::new(LoggerManager::new()))?;

    if let Some(summary) = settings::load(&registry, &path)? {
        eprintln!(
            "{} {} ({} applied, {} unmatched, {} failed)",
            "Loaded".green().bold(),
            path.display(),
            summary.applied,
            summary.unmatched,
            summary.failed
        );
    }

    print!("{}", render(&registry, format)?);
    Ok(())
}

/// Serialize every registered setting in `format`.
pub fn render(registry: &ConfigRegistry, format: OutputFormat) -> Result<String> {
    let document = registry.to_document();
    match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(&document).context("Failed to serialize registry as YAML")
        }
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&document)
                .context("Failed to serialize registry as JSON")?;
            json.push('\n');
            Ok(json)
        }
    }
}
