//! Show version information.

use anyhow::Result;
use colored::Colorize;

pub fn execute(verbose: bool) -> Result<()> {
    println!("{} {}", "Ember".cyan().bold(), env!("CARGO_PKG_VERSION"));

    if verbose {
        println!("\nBuild Information:");
        println!("  Version: {}", env!("CARGO_PKG_VERSION"));
        println!("  Core: {}", ember_core::VERSION);
        println!("  Target: {}", std::env::consts::ARCH);
        println!("  OS: {}", std::env::consts::OS);
        println!("  Rust Version: {}", env!("CARGO_PKG_RUST_VERSION"));
        println!("  Default Config: {}", crate::settings::default_config_path().display());
    }

    Ok(())
}
