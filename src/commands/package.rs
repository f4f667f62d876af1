// src/commands/package.rs
//! Catalog administration commands

use anyhow::Result;
use bower_cache::catalog::{Catalog, SqliteCatalog};
use tracing::info;

/// Register a package
pub fn cmd_package_add(name: &str, url: &str, db_path: &str) -> Result<()> {
    info!("Registering package: {} ({})", name, url);
    let catalog = SqliteCatalog::open(db_path)?;
    let entry = catalog.create(name, url)?;
    println!("Registered package: {}", entry.name);
    println!("  URL: {}", entry.url);
    Ok(())
}

/// List registered packages
pub fn cmd_package_list(db_path: &str) -> Result<()> {
    info!("Listing registered packages");
    let catalog = SqliteCatalog::open(db_path)?;
    let entries = catalog.list()?;

    if entries.is_empty() {
        println!("No packages registered");
    } else {
        println!("Registered packages:");
        for entry in entries {
            println!("  {} -> {}", entry.name, entry.url);
        }
    }
    Ok(())
}

/// Search registered packages
pub fn cmd_package_search(fragment: &str, db_path: &str) -> Result<()> {
    info!("Searching registered packages for: {}", fragment);
    let catalog = SqliteCatalog::open(db_path)?;
    let entries = catalog.search(fragment)?;

    if entries.is_empty() {
        println!("No packages matching '{}'", fragment);
    } else {
        for entry in &entries {
            println!("  {} -> {}", entry.name, entry.url);
        }
        println!("{} package(s) found", entries.len());
    }
    Ok(())
}

/// Remove a registered package
pub fn cmd_package_remove(name: &str, db_path: &str) -> Result<()> {
    info!("Removing package: {}", name);
    let catalog = SqliteCatalog::open(db_path)?;

    if catalog.remove(name)? {
        println!("Removed package: {}", name);
        Ok(())
    } else {
        anyhow::bail!("Package '{}' is not registered", name)
    }
}
