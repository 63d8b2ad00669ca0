//! Load a configuration file and report the loggers it configures.

use crate::settings::{self, Settings};
use anyhow::Result;
use colored::Colorize;
use ember_core::config::ConfigRegistry;
use ember_core::log::{Logger, LoggerManager};
use ember_core::{log_at, LogLevel};
use std::path::PathBuf;
use std::sync::Arc;

pub fn execute(path: PathBuf, emit: Option<&str>) -> Result<()> {
    let registry = ConfigRegistry::new();
    let manager = Arc::new(LoggerManager::new());
    Settings::declare(&registry, manager.clone())?;

    match settings::load(&registry, &path)? {
        Some(summary) => {
            println!("\n{}", "Configuration".cyan().bold());
            println!("{}", "=".repeat(50));
            println!("  File: {}", path.display());
            println!("  Applied: {}", summary.applied);
            println!("  Unmatched: {}", summary.unmatched);
            if summary.failed > 0 {
                println!("  Failed: {}", summary.failed.to_string().red());
            } else {
                println!("  Failed: 0");
            }
        }
        None => println!("{} no configuration file, showing defaults", "Note:".yellow().bold()),
    }

    println!("\n{}", "Loggers".cyan().bold());
    println!("{}", "=".repeat(50));
    for name in manager.names() {
        if let Some(logger) = manager.find(&name) {
            print_logger(&logger);
        }
    }

    if let Some(message) = emit {
        println!();
        for name in manager.names() {
            if let Some(logger) = manager.find(&name) {
                let level = logger.level();
                if level == LogLevel::Off {
                    continue;
                }
                log_at!(logger, level, "{}", message);
            }
        }
    }

    Ok(())
}

fn print_logger(logger: &Logger) {
    println!("\n{}:", logger.name().green().bold());
    println!("  Level: {}", logger.level());
    println!("  Pattern: {}", logger.formatter().pattern());

    let appenders = logger.appenders();
    if appenders.is_empty() {
        println!("  Appenders: none");
        return;
    }
    println!("  Appenders:");
    for appender in appenders {
        let def = appender.definition();
        match &def.file {
            Some(file) => println!("    • {} ({})", def.kind, file),
            None => println!("    • {}", def.kind),
        }
        if let Some(pattern) = &def.pattern {
            println!("      pattern: {}", pattern);
        }
        if let Some(error) = appender.sink_error() {
            println!("      {} {}", "error:".red().bold(), error);
        }
    }
}
