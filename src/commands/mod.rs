// src/commands/mod.rs
//! Command handlers for the bower-cache CLI

mod mirror;
mod package;
mod resolve;
mod serve;

pub use mirror::cmd_mirror_list;
pub use package::{cmd_package_add, cmd_package_list, cmd_package_remove, cmd_package_search};
pub use resolve::cmd_resolve;
pub use serve::cmd_serve;

use anyhow::Result;
use tracing::info;

/// Create or migrate the catalog database
pub fn cmd_init(db_path: &str) -> Result<()> {
    info!("Initializing catalog database at: {}", db_path);
    bower_cache::db::init(db_path)?;
    println!("Database initialized successfully at: {}", db_path);
    Ok(())
}
