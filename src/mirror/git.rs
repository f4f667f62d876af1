// src/mirror/git.rs
//! Filesystem-backed mirror store
//!
//! Every mirror is a directory `<repo_root>/<name>` holding a git
//! repository. Both layouts are recognized:
//! - non-bare: `<name>/.git/config`
//! - bare (what `git clone --mirror` produces): `<name>/config`
//!
//! The origin is read straight from the repository's config file, so no git
//! binary is needed to serve lookups.

use super::{MirrorEntry, MirrorStore, validate_name};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Mirror store rooted at a directory of git repositories
#[derive(Debug, Clone)]
pub struct GitMirrorStore {
    repo_root: PathBuf,
}

impl GitMirrorStore {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Directory that holds all mirrors
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Directory a mirror with this name lives in
    pub fn mirror_path(&self, name: &str) -> PathBuf {
        self.repo_root.join(name)
    }

    /// Load the mirror stored in `dir`, if `dir` is a git repository
    fn load(name: &str, dir: &Path) -> Result<Option<MirrorEntry>> {
        let Some(config_path) = git_config_path(dir) else {
            return Ok(None);
        };

        let origin = read_origin(&config_path)?;
        Ok(Some(MirrorEntry::new(name, origin)))
    }
}

impl MirrorStore for GitMirrorStore {
    fn get(&self, name: &str) -> Result<Option<MirrorEntry>> {
        if validate_name(name).is_err() {
            debug!("Not a valid mirror name: {:?}", name);
            return Ok(None);
        }

        let dir = self.mirror_path(name);
        if !dir.is_dir() {
            return Ok(None);
        }

        Self::load(name, &dir)
    }

    fn list(&self) -> Result<Vec<MirrorEntry>> {
        if !self.repo_root.is_dir() {
            return Ok(Vec::new());
        }

        let mut mirrors = Vec::new();
        for entry in fs::read_dir(&self.repo_root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!("Skipping non-UTF-8 mirror directory: {:?}", file_name);
                continue;
            };

            // Hidden directories are clone staging areas
            if validate_name(name).is_err() {
                continue;
            }

            if let Some(mirror) = Self::load(name, &entry.path())? {
                mirrors.push(mirror);
            }
        }

        mirrors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(mirrors)
    }
}

/// Locate the git config file of a repository directory
fn git_config_path(dir: &Path) -> Option<PathBuf> {
    let non_bare = dir.join(".git").join("config");
    if non_bare.is_file() {
        return Some(non_bare);
    }

    // Bare repositories keep config, HEAD and objects/ at the top level
    let bare = dir.join("config");
    if bare.is_file() && dir.join("HEAD").is_file() {
        return Some(bare);
    }

    None
}

/// Read `remote.origin.url` from a git config file
pub fn read_origin(config_path: &Path) -> Result<Option<String>> {
    let content = fs::read_to_string(config_path).map_err(|e| {
        Error::IoError(format!(
            "Failed to read git config {}: {e}",
            config_path.display()
        ))
    })?;

    Ok(parse_origin(&content))
}

/// Extract the origin URL from git config text
fn parse_origin(content: &str) -> Option<String> {
    let mut in_origin = false;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            in_origin = is_origin_section(line);
            continue;
        }

        if !in_origin {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        if key.trim().eq_ignore_ascii_case("url") {
            return Some(unquote(value.trim()).to_string());
        }
    }

    None
}

/// Match `[remote "origin"]`
fn is_origin_section(line: &str) -> bool {
    let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) else {
        return false;
    };

    let mut parts = inner.trim().splitn(2, char::is_whitespace);
    let section = parts.next().unwrap_or_default();
    let subsection = parts.next().unwrap_or_default().trim();

    section.eq_ignore_ascii_case("remote") && unquote(subsection) == "origin"
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
