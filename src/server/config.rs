// src/server/config.rs
//! Configuration file parsing for the registry server
//!
//! Supports TOML configuration files with the following sections:
//! - [server] - Bind address
//! - [storage] - Mirror root and catalog database
//! - [serving] - How mirror URLs are built
//! - [upstream] - Upstream registry and negative caching
//! - [clone] - Clone wait budget and limits

use crate::server::ServerConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub serving: ServingSection,

    #[serde(default)]
    pub upstream: UpstreamSection,

    #[serde(default)]
    pub clone: CloneSection,
}

/// Server configuration section
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// HTTP bind address
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_true() -> bool {
    true
}

/// Storage configuration section
#[derive(Debug, Deserialize)]
pub struct StorageSection {
    /// Directory holding one git mirror per package
    #[serde(default = "default_repo_root")]
    pub repo_root: PathBuf,

    /// SQLite catalog database
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            repo_root: default_repo_root(),
            db_path: default_db_path(),
        }
    }
}

fn default_repo_root() -> PathBuf {
    PathBuf::from("/var/git")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/bower-cache/registry.db")
}

/// Serving configuration section
#[derive(Debug, Deserialize)]
pub struct ServingSection {
    /// Base URL mirrors are served under (e.g. "git://mirror.example/")
    ///
    /// When unset the base is derived from the request's Host header.
    #[serde(default)]
    pub repo_url: Option<String>,

    /// Scheme for host-derived bases
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Serve freshly cloned packages under the same base as mirror hits
    #[serde(default)]
    pub consistent_clone_base: bool,
}

impl Default for ServingSection {
    fn default() -> Self {
        Self {
            repo_url: None,
            scheme: default_scheme(),
            consistent_clone_base: false,
        }
    }
}

fn default_scheme() -> String {
    "git".to_string()
}

/// Upstream registry section
#[derive(Debug, Deserialize)]
pub struct UpstreamSection {
    /// Registry base URL
    #[serde(default = "default_registry")]
    pub registry: String,

    /// Request timeout (e.g., "30s")
    #[serde(default = "default_upstream_timeout")]
    pub timeout: String,

    /// How long "no such package" answers are remembered ("0" disables)
    #[serde(default = "default_negative_cache_ttl")]
    pub negative_cache_ttl: String,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            registry: default_registry(),
            timeout: default_upstream_timeout(),
            negative_cache_ttl: default_negative_cache_ttl(),
        }
    }
}

fn default_registry() -> String {
    "https://bower.herokuapp.com".to_string()
}

fn default_upstream_timeout() -> String {
    "30s".to_string()
}

fn default_negative_cache_ttl() -> String {
    "15m".to_string()
}

/// Clone configuration section
#[derive(Debug, Deserialize)]
pub struct CloneSection {
    /// How long a request waits for a clone before answering 503
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout: String,

    /// Hard limit for a single git clone
    #[serde(default = "default_clone_timeout")]
    pub timeout: String,

    /// Maximum concurrent clones
    #[serde(default = "default_max_clones")]
    pub max_concurrent: usize,

    /// Join in-flight clones of the same package
    #[serde(default = "default_true")]
    pub coalesce: bool,

    /// git executable
    #[serde(default = "default_git")]
    pub git: PathBuf,
}

impl Default for CloneSection {
    fn default() -> Self {
        Self {
            wait_timeout: default_wait_timeout(),
            timeout: default_clone_timeout(),
            max_concurrent: default_max_clones(),
            coalesce: true,
            git: default_git(),
        }
    }
}

fn default_wait_timeout() -> String {
    "5s".to_string()
}

fn default_clone_timeout() -> String {
    "10m".to_string()
}

fn default_max_clones() -> usize {
    4
}

fn default_git() -> PathBuf {
    PathBuf::from("git")
}

impl RegistryConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: RegistryConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid server.bind address: {}", self.server.bind))?;

        if let Some(ref repo_url) = self.serving.repo_url {
            Url::parse(repo_url)
                .with_context(|| format!("Invalid serving.repo_url: {}", repo_url))?;
            if !repo_url.ends_with('/') {
                anyhow::bail!("serving.repo_url must end with '/', got '{}'", repo_url);
            }
        }

        if self.serving.scheme.trim().is_empty() {
            anyhow::bail!("serving.scheme must not be empty");
        }

        Url::parse(&self.upstream.registry)
            .with_context(|| format!("Invalid upstream.registry: {}", self.upstream.registry))?;

        parse_duration(&self.upstream.timeout).context("Invalid upstream.timeout")?;
        parse_duration(&self.upstream.negative_cache_ttl)
            .context("Invalid upstream.negative_cache_ttl")?;
        parse_duration(&self.clone.timeout).context("Invalid clone.timeout")?;

        let wait = parse_duration(&self.clone.wait_timeout).context("Invalid clone.wait_timeout")?;
        if wait.is_zero() {
            anyhow::bail!("clone.wait_timeout must be greater than zero");
        }

        if self.clone.max_concurrent == 0 {
            anyhow::bail!("clone.max_concurrent must be at least 1");
        }

        Ok(())
    }

    /// Convert to the internal ServerConfig structure
    pub fn to_server_config(&self) -> Result<ServerConfig> {
        let bind_addr = self
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid server.bind address: {}", self.server.bind))?;

        Ok(ServerConfig {
            bind_addr,
            repo_root: self.storage.repo_root.clone(),
            db_path: self.storage.db_path.clone(),
            repo_url: self.serving.repo_url.clone(),
            scheme: self.serving.scheme.clone(),
            consistent_clone_base: self.serving.consistent_clone_base,
            upstream_registry: self.upstream.registry.clone(),
            upstream_timeout: parse_duration(&self.upstream.timeout)?,
            negative_cache_ttl: parse_duration(&self.upstream.negative_cache_ttl)?,
            wait_budget: parse_duration(&self.clone.wait_timeout)?,
            clone_timeout: parse_duration(&self.clone.timeout)?,
            max_concurrent_clones: self.clone.max_concurrent,
            coalesce_clones: self.clone.coalesce,
            git: self.clone.git.clone(),
        })
    }
}

/// Parse a human-readable duration string (e.g., "15m", "1h", "30s")
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if let Some(num) = s.strip_suffix('d') {
        (num, 24 * 60 * 60)
    } else if let Some(num) = s.strip_suffix('h') {
        (num, 60 * 60)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, 60)
    } else if let Some(num) = s.strip_suffix('s') {
        (num, 1)
    } else {
        // Assume seconds
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid duration number: {}", num_str))?;

    let secs = num
        .checked_mul(multiplier)
        .with_context(|| format!("Duration too large: {}", s))?;

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(15 * 60));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("2d").unwrap(), Duration::from_secs(2 * 24 * 3600));
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("5x").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert!(parse_duration("999999999999999999d").is_err());
        assert!(parse_duration("18446744073709551615h").is_err());
        assert_eq!(
            parse_duration("18446744073709551615").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.storage.repo_root, PathBuf::from("/var/git"));
        assert!(config.serving.repo_url.is_none());
        assert!(config.clone.coalesce);

        let server = config.to_server_config().unwrap();
        assert_eq!(server.wait_budget, Duration::from_secs(5));
        assert_eq!(server.clone_timeout, Duration::from_secs(600));
        assert_eq!(server.negative_cache_ttl, Duration::from_secs(900));
        assert_eq!(server.upstream_registry, "https://bower.herokuapp.com");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[server]
bind = "127.0.0.1:9000"

[storage]
repo_root = "/srv/git"
db_path = "/srv/registry.db"

[serving]
repo_url = "git://mirror.example/"

[upstream]
registry = "https://registry.example"
negative_cache_ttl = "0"

[clone]
wait_timeout = "2s"
max_concurrent = 8
coalesce = false
"#;
        let config: RegistryConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());

        let server = config.to_server_config().unwrap();
        assert_eq!(server.bind_addr.port(), 9000);
        assert_eq!(server.repo_root, PathBuf::from("/srv/git"));
        assert_eq!(server.repo_url.as_deref(), Some("git://mirror.example/"));
        assert_eq!(server.negative_cache_ttl, Duration::ZERO);
        assert_eq!(server.wait_budget, Duration::from_secs(2));
        assert_eq!(server.max_concurrent_clones, 8);
        assert!(!server.coalesce_clones);
    }

    #[test]
    fn test_repo_url_needs_trailing_slash() {
        let toml_str = r#"
[serving]
repo_url = "git://mirror.example"
"#;
        let config: RegistryConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_repo_url_must_be_absolute() {
        let toml_str = r#"
[serving]
repo_url = "mirror/"
"#;
        let config: RegistryConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_values() {
        for toml_str in [
            "[server]\nbind = \"nowhere\"\n",
            "[upstream]\nregistry = \"not a url\"\n",
            "[clone]\nwait_timeout = \"0s\"\n",
            "[clone]\nmax_concurrent = 0\n",
            "[serving]\nscheme = \"\"\n",
        ] {
            let config: RegistryConfig = toml::from_str(toml_str).unwrap();
            assert!(config.validate().is_err(), "accepted: {toml_str}");
        }
    }

    #[test]
    fn test_load_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("registry.toml");
        std::fs::write(&path, "[clone]\nwait_timeout = \"1s\"\n").unwrap();

        let config = RegistryConfig::load(&path).unwrap();
        assert_eq!(config.clone.wait_timeout, "1s");
        assert!(RegistryConfig::load(&temp_dir.path().join("missing.toml")).is_err());
    }
}
