// src/mirror/mod.rs
//! Repository mirror store
//!
//! Mirrors are local clones of upstream repositories, keyed by package name.
//! The resolution engine only reads them; they are written by the clone
//! dispatcher once a clone lands, and removed only by external deletion.

mod git;

pub use git::{GitMirrorStore, read_origin};

use crate::descriptor::PackageDescriptor;
use crate::error::{Error, Result};

/// A locally cloned repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorEntry {
    /// Package name, equal to the clone's directory name
    pub name: String,
    /// Remote URL recorded at clone time
    pub origin: Option<String>,
}

impl MirrorEntry {
    pub fn new(name: impl Into<String>, origin: Option<String>) -> Self {
        Self {
            name: name.into(),
            origin,
        }
    }

    /// Describe this mirror as served under `base`
    ///
    /// The URL is `base` with the package name appended; the origin is not
    /// part of the result.
    pub fn to_descriptor(&self, base: &str) -> PackageDescriptor {
        PackageDescriptor {
            name: self.name.clone(),
            url: format!("{}{}", base, self.name),
        }
    }
}

/// Read access to locally mirrored repositories
///
/// Reads are eventually consistent with in-flight clones: a lookup made
/// right after a clone was dispatched may legitimately miss.
pub trait MirrorStore: Send + Sync {
    /// Look up a mirror by package name
    fn get(&self, name: &str) -> Result<Option<MirrorEntry>>;

    /// All mirrors, sorted by name
    fn list(&self) -> Result<Vec<MirrorEntry>>;
}

/// Check that a package name can be used as a single directory name
///
/// Rejects empty names, `.`/`..`, path separators, hidden names (reserved
/// for clone staging) and control characters.
pub fn validate_name(name: &str) -> Result<&str> {
    if name.is_empty() {
        return Err(Error::InvalidName("empty name".to_string()));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidName(format!(
            "name contains path separator: {}",
            name
        )));
    }

    if name.starts_with('.') {
        return Err(Error::InvalidName(format!(
            "name starts with '.': {}",
            name
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(Error::InvalidName(format!(
            "name contains control characters: {:?}",
            name
        )));
    }

    Ok(name)
}
