//! Preview a log pattern.

use anyhow::{Context, Result};
use colored::Colorize;
use ember_core::log::{LogRecord, PatternFormatter};
use ember_types::LogLevel;

pub fn execute(pattern: &str, level: &str, message: &str, logger: &str) -> Result<()> {
    let level: LogLevel = level
        .parse()
        .with_context(|| format!("Unknown level '{}'", level))?;
    let formatter = PatternFormatter::new(pattern);

    let record = LogRecord::new(logger, level, message).with_location(file!(), line!());
    print!("{}", formatter.format(level, &record));
    if !pattern.ends_with("%n") {
        println!();
    }

    if formatter.is_error() {
        eprintln!("{} pattern is malformed", "Warning:".yellow().bold());
        for diagnostic in formatter.diagnostics() {
            eprintln!("  {} {}", "•".yellow(), diagnostic);
        }
    } else if !formatter.diagnostics().is_empty() {
        for diagnostic in formatter.diagnostics() {
            eprintln!("{} {}", "Note:".cyan().bold(), diagnostic);
        }
    }

    Ok(())
}
