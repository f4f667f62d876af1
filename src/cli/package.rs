// src/cli/package.rs
//! Catalog administration commands

use super::DEFAULT_DB_PATH;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum PackageCommands {
    /// Register a package under a fixed URL
    Add {
        /// Package name
        name: String,

        /// URL returned for the package
        url: String,

        /// Path to the database file
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },

    /// List registered packages
    List {
        /// Path to the database file
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },

    /// Search registered packages by name fragment
    Search {
        /// Case-insensitive name fragment
        fragment: String,

        /// Path to the database file
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },

    /// Remove a registered package
    Remove {
        /// Package name
        name: String,

        /// Path to the database file
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },
}
