// src/catalog.rs
//! Package catalog
//!
//! Directly registered packages, independent of cloning. The resolution
//! engine only ever calls [`Catalog::get`]; listing, searching and creation
//! back the administrative endpoints.

use crate::db::{self, models::CatalogEntry};
use crate::error::{Error, Result};
use crate::mirror::validate_name;
use std::path::PathBuf;
use tracing::{debug, info};

/// Store of directly registered packages
pub trait Catalog: Send + Sync {
    /// Look up an entry by exact name
    fn get(&self, name: &str) -> Result<Option<CatalogEntry>>;

    /// All entries in registration order
    fn list(&self) -> Result<Vec<CatalogEntry>>;

    /// Entries whose name contains `fragment`, ignoring case
    fn search(&self, fragment: &str) -> Result<Vec<CatalogEntry>>;

    /// Register a new package
    fn create(&self, name: &str, url: &str) -> Result<CatalogEntry>;
}

/// Catalog stored in the SQLite `packages` table
///
/// Opens a connection per call so the catalog can be shared freely across
/// request handlers.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    db_path: PathBuf,
}

impl SqliteCatalog {
    /// Open (creating and migrating if needed) the catalog at `db_path`
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        db::init(&Self::path_str(&db_path)?)?;
        Ok(Self { db_path })
    }

    fn path_str(path: &std::path::Path) -> Result<String> {
        path.to_str()
            .map(str::to_string)
            .ok_or_else(|| Error::InitError(format!("Non UTF-8 database path: {}", path.display())))
    }

    fn connect(&self) -> Result<rusqlite::Connection> {
        db::open(&Self::path_str(&self.db_path)?)
    }

    /// Remove an entry, returning whether it existed
    pub fn remove(&self, name: &str) -> Result<bool> {
        let conn = self.connect()?;
        CatalogEntry::delete_by_name(&conn, name)
    }
}

impl Catalog for SqliteCatalog {
    fn get(&self, name: &str) -> Result<Option<CatalogEntry>> {
        let conn = self.connect()?;
        CatalogEntry::find_by_name(&conn, name)
    }

    fn list(&self) -> Result<Vec<CatalogEntry>> {
        let conn = self.connect()?;
        CatalogEntry::list_all(&conn)
    }

    fn search(&self, fragment: &str) -> Result<Vec<CatalogEntry>> {
        debug!("Searching catalog for '{}'", fragment);
        let conn = self.connect()?;
        CatalogEntry::search(&conn, fragment)
    }

    fn create(&self, name: &str, url: &str) -> Result<CatalogEntry> {
        let name = name.trim();
        let url = url.trim();

        if name.is_empty() {
            return Err(Error::InvalidInput("package name must not be empty".to_string()));
        }
        if url.is_empty() {
            return Err(Error::InvalidInput("package url must not be empty".to_string()));
        }
        // Names must also be servable by the lookup endpoint
        validate_name(name)?;

        let mut conn = self.connect()?;
        let entry = db::transaction(&mut conn, |tx| {
            let mut entry = CatalogEntry::new(name.to_string(), url.to_string());
            entry.insert(tx)?;
            Ok(entry)
        })?;

        info!("Registered package {} -> {}", entry.name, entry.url);
        Ok(entry)
    }
}
