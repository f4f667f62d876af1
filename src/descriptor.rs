// src/descriptor.rs

//! The normalized answer to a package lookup

use serde::{Deserialize, Serialize};

/// A servable package location, as returned to registry clients
///
/// Serialized at the HTTP boundary as `{"name": ..., "url": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub name: String,
    pub url: String,
}

impl PackageDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl From<crate::db::models::CatalogEntry> for PackageDescriptor {
    fn from(entry: crate::db::models::CatalogEntry) -> Self {
        Self {
            name: entry.name,
            url: entry.url,
        }
    }
}
