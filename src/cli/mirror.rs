// src/cli/mirror.rs
//! Mirror inspection commands

use super::DEFAULT_REPO_ROOT;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum MirrorCommands {
    /// List mirrored repositories and their origins
    List {
        /// Directory holding the mirrors
        #[arg(short, long, default_value = DEFAULT_REPO_ROOT)]
        repo_root: String,
    },
}
