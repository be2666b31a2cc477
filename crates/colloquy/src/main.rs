// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Colloquy - two-party chat backend.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Colloquy - two-party chat backend.
#[derive(Parser, Debug)]
#[command(name = "colloquy", version, about, long_about = None)]
struct Cli {
    /// Configuration file. Defaults to the XDG and local lookup paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the gateway, outbox dispatcher and command intake (default).
    Serve,
    /// Validate the configuration and print the effective values.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match colloquy_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            colloquy_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("colloquy: {e}");
                std::process::exit(1);
            }
        }
        Commands::Check => match colloquy_config::render_effective(&config) {
            Ok(rendered) => {
                println!("# configuration is valid");
                print!("{rendered}");
            }
            Err(e) => {
                eprintln!("colloquy: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["colloquy"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["colloquy", "check", "--config", "/etc/colloquy.toml"])
            .unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/colloquy.toml")));
    }

    #[test]
    fn default_config_is_valid() {
        let config = colloquy_config::load_and_validate_str("").expect("defaults should be valid");
        assert_eq!(config.service.name, "colloquy");
    }
}
