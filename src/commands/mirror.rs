// src/commands/mirror.rs
//! Mirror inspection commands

use anyhow::Result;
use bower_cache::mirror::{GitMirrorStore, MirrorStore};
use tracing::info;

/// List mirrored repositories
pub fn cmd_mirror_list(repo_root: &str) -> Result<()> {
    info!("Listing mirrors in: {}", repo_root);
    let store = GitMirrorStore::new(repo_root);
    let mirrors = store.list()?;

    if mirrors.is_empty() {
        println!("No mirrors in {}", repo_root);
        return Ok(());
    }

    println!("Mirrors in {}:", repo_root);
    for mirror in mirrors {
        match mirror.origin {
            Some(origin) => println!("  {} (from {})", mirror.name, origin),
            None => println!("  {} (no origin)", mirror.name),
        }
    }
    Ok(())
}
