//! Ember CLI entry point.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

mod cli;
mod commands;
mod settings;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug, cli.quiet);

    match cli.execute() {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_logging(debug: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("ember=debug,ember_core=debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_env("EMBER_LOG")
            .unwrap_or_else(|_| EnvFilter::new("ember=info,ember_core=info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}
