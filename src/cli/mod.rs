// src/cli/mod.rs
//! CLI definitions for bower-cache
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};

mod mirror;
mod package;

pub use mirror::MirrorCommands;
pub use package::PackageCommands;

/// Default catalog database path
pub const DEFAULT_DB_PATH: &str = "/var/lib/bower-cache/registry.db";

/// Default mirror directory
pub const DEFAULT_REPO_ROOT: &str = "/var/git";

#[derive(Parser)]
#[command(name = "bower-cache")]
#[command(author = "bower-cache Contributors")]
#[command(version)]
#[command(about = "Caching proxy registry for Bower packages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or migrate the catalog database
    Init {
        /// Path to the database file
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },

    /// Run the registry HTTP server
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Override the bind address from the configuration
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Catalog administration
    #[command(subcommand)]
    Package(PackageCommands),

    /// Inspect local mirrors
    #[command(subcommand)]
    Mirror(MirrorCommands),

    /// Resolve one package the way the server would
    Resolve {
        /// Package name
        name: String,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Host the request is pretended to arrive on
        #[arg(long, default_value = "localhost")]
        host: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::parse_from(["bower-cache", "resolve", "ember", "--host", "test-host:8080"]);
        match cli.command {
            Commands::Resolve { name, config, host } => {
                assert_eq!(name, "ember");
                assert!(config.is_none());
                assert_eq!(host, "test-host:8080");
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_parse_package_add() {
        let cli = Cli::parse_from(["bower-cache", "package", "add", "ember", "/foo"]);
        match cli.command {
            Commands::Package(PackageCommands::Add { name, url, db_path }) => {
                assert_eq!(name, "ember");
                assert_eq!(url, "/foo");
                assert_eq!(db_path, DEFAULT_DB_PATH);
            }
            _ => panic!("expected package add"),
        }
    }
}
