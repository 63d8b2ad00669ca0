//! CLI structure and command definitions.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ember")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Typed configuration registry with hot-reloaded logging", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ~/.ember/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Only report warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a configuration file and print every registered setting
    Dump {
        /// Configuration file, overrides --config
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Compile a log pattern and render a sample record with it
    Render {
        /// Pattern, e.g. "%d%T[%p]%T%m%n"
        pattern: String,

        /// Level of the sample record
        #[arg(short, long, default_value = "INFO")]
        level: String,

        /// Message of the sample record
        #[arg(short, long, default_value = "hello from ember")]
        message: String,

        /// Logger name of the sample record
        #[arg(long, default_value = "root")]
        logger: String,
    },

    /// Load a configuration file and show the loggers it produces
    Check {
        /// Configuration file, overrides --config
        file: Option<PathBuf>,

        /// Send a test message through every configured logger
        #[arg(long)]
        emit: Option<String>,
    },

    /// Show version information
    Version {
        /// Show detailed version info
        #[arg(short, long)]
        verbose: bool,
    },
}

impl Cli {
    pub fn execute(&self) -> Result<()> {
        use crate::commands::*;

        match &self.command {
            Commands::Dump { file, format } => {
                dump::execute(self.config_path(file.as_ref()), *format)
            }
            Commands::Render { pattern, level, message, logger } => {
                render::execute(pattern, level, message, logger)
            }
            Commands::Check { file, emit } => {
                check::execute(self.config_path(file.as_ref()), emit.as_deref())
            }
            Commands::Version { verbose } => {
                version::execute(*verbose)
            }
        }
    }

    /// Resolve the configuration file: positional argument, then `--config`,
    /// then the per-user default.
    fn config_path(&self, positional: Option<&PathBuf>) -> PathBuf {
        positional
            .or(self.config.as_ref())
            .cloned()
            .unwrap_or_else(crate::settings::default_config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_file_wins() {
        let cli = Cli::parse_from(["ember", "--config", "a.yml", "dump", "b.yml"]);
        match &cli.command {
            Commands::Dump { file, format } => {
                assert_eq!(*format, OutputFormat::Yaml);
                assert_eq!(cli.config_path(file.as_ref()), PathBuf::from("b.yml"));
            }
            _ => panic!("expected dump"),
        }
    }

    #[test]
    fn test_config_flag_used_without_positional() {
        let cli = Cli::parse_from(["ember", "check", "-c", "a.yml"]);
        match &cli.command {
            Commands::Check { file, emit } => {
                assert!(emit.is_none());
                assert_eq!(cli.config_path(file.as_ref()), PathBuf::from("a.yml"));
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_render_defaults() {
        let cli = Cli::parse_from(["ember", "render", "%m%n"]);
        match cli.command {
            Commands::Render { pattern, level, .. } => {
                assert_eq!(pattern, "%m%n");
                assert_eq!(level, "INFO");
            }
            _ => panic!("expected render"),
        }
    }
}
