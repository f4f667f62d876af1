// src/server/mod.rs
//! Bower registry server
//!
//! This module provides an HTTP server that:
//! - Answers package lookups through the resolution engine
//! - Clones unknown packages from the upstream registry on demand
//! - Exposes the catalog's list/create/search endpoints
//! - Reports resolution and clone statistics

mod config;
mod handlers;
mod routes;

pub use config::{RegistryConfig, parse_duration};
pub use routes::create_router;

use crate::catalog::{Catalog, SqliteCatalog};
use crate::clone::{CloneJobs, GitCloneDispatcher, GitCloneOptions};
use crate::metrics::ResolutionMetrics;
use crate::mirror::GitMirrorStore;
use crate::negative_cache::{self, NegativeCache, NegativeCachingLookup};
use crate::resolve::{Resolver, ResolverConfig};
use crate::upstream::{RegistryClient, UpstreamLookup};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How often finished clone jobs are pruned
const JOB_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
    /// Directory holding the git mirrors
    pub repo_root: PathBuf,
    /// Path to the catalog database
    pub db_path: PathBuf,
    /// Serving base override for mirrors
    pub repo_url: Option<String>,
    /// Scheme for host-derived serving bases
    pub scheme: String,
    /// Serve fresh clones under the mirror base
    pub consistent_clone_base: bool,
    /// Upstream registry base URL
    pub upstream_registry: String,
    /// Request timeout for upstream lookups
    pub upstream_timeout: Duration,
    /// TTL for cached upstream misses (zero disables the cache)
    pub negative_cache_ttl: Duration,
    /// How long a lookup waits for a dispatched clone
    pub wait_budget: Duration,
    /// Hard limit for one git clone
    pub clone_timeout: Duration,
    /// Maximum concurrent clones
    pub max_concurrent_clones: usize,
    /// Join in-flight clones of the same package
    pub coalesce_clones: bool,
    /// git executable
    pub git: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            repo_root: PathBuf::from("/var/git"),
            db_path: PathBuf::from("/var/lib/bower-cache/registry.db"),
            repo_url: None,
            scheme: "git".to_string(),
            consistent_clone_base: false,
            upstream_registry: "https://bower.herokuapp.com".to_string(),
            upstream_timeout: Duration::from_secs(30),
            negative_cache_ttl: negative_cache::DEFAULT_NEGATIVE_TTL,
            wait_budget: crate::resolve::DEFAULT_WAIT_BUDGET,
            clone_timeout: Duration::from_secs(600),
            max_concurrent_clones: 4,
            coalesce_clones: true,
            git: PathBuf::from("git"),
        }
    }
}

impl ServerConfig {
    /// Settings consumed by the resolution engine
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            repo_url: self.repo_url.clone(),
            scheme: self.scheme.clone(),
            upstream_registry: self.upstream_registry.clone(),
            wait_budget: self.wait_budget,
            consistent_clone_base: self.consistent_clone_base,
        }
    }

    /// Settings consumed by the git clone dispatcher
    pub fn clone_options(&self) -> GitCloneOptions {
        GitCloneOptions {
            git: self.git.clone(),
            timeout: self.clone_timeout,
            max_concurrent: self.max_concurrent_clones,
            coalesce: self.coalesce_clones,
        }
    }
}

/// Shared server state
pub struct ServerState {
    pub config: ServerConfig,
    pub resolver: Resolver,
    /// Catalog behind the administrative endpoints
    pub catalog: Arc<dyn Catalog>,
    /// Clone job registry
    pub jobs: Arc<CloneJobs>,
    /// Cache of upstream misses (None when disabled)
    pub negative_cache: Option<Arc<NegativeCache>>,
}

impl ServerState {
    /// Build the production stack: git mirrors, SQLite catalog, HTTP
    /// upstream client and git clone dispatcher
    pub fn new(config: ServerConfig) -> Result<Self> {
        let catalog: Arc<dyn Catalog> = Arc::new(
            SqliteCatalog::open(&config.db_path).with_context(|| {
                format!("Failed to open catalog at {}", config.db_path.display())
            })?,
        );
        let mirrors = Arc::new(GitMirrorStore::new(&config.repo_root));
        let metrics = Arc::new(ResolutionMetrics::new());

        let client = RegistryClient::with_timeout(config.upstream_timeout)?;
        let negative_cache = (!config.negative_cache_ttl.is_zero())
            .then(|| Arc::new(NegativeCache::new(config.negative_cache_ttl)));
        let upstream: Arc<dyn UpstreamLookup> = match negative_cache {
            Some(ref cache) => Arc::new(
                NegativeCachingLookup::new(client, Arc::clone(cache))
                    .with_metrics(Arc::clone(&metrics)),
            ),
            None => Arc::new(client),
        };

        let jobs = Arc::new(CloneJobs::default());
        let dispatcher = Arc::new(GitCloneDispatcher::with_jobs(
            &config.repo_root,
            config.clone_options(),
            Arc::clone(&jobs),
        ));

        let resolver = Resolver::new(
            mirrors,
            Arc::clone(&catalog),
            upstream,
            dispatcher,
            config.resolver_config(),
        )
        .with_metrics(metrics);

        Ok(Self {
            config,
            resolver,
            catalog,
            jobs,
            negative_cache,
        })
    }

    /// Assemble state around an already built resolver
    pub fn from_parts(
        config: ServerConfig,
        resolver: Resolver,
        catalog: Arc<dyn Catalog>,
        jobs: Arc<CloneJobs>,
    ) -> Self {
        Self {
            config,
            resolver,
            catalog,
            jobs,
            negative_cache: None,
        }
    }

    pub fn metrics(&self) -> &Arc<ResolutionMetrics> {
        self.resolver.metrics()
    }
}

/// Start the registry server
pub async fn run_server(config: ServerConfig) -> Result<()> {
    tracing::info!("Starting bower-cache on {}", config.bind_addr);
    tracing::info!("Mirrors: {:?}", config.repo_root);
    tracing::info!("Catalog: {:?}", config.db_path);
    tracing::info!("Upstream registry: {}", config.upstream_registry);
    tracing::info!(
        "Clone wait budget: {:?}, max concurrent clones: {}",
        config.wait_budget,
        config.max_concurrent_clones
    );

    match config.repo_url {
        Some(ref base) => tracing::info!("Serving mirrors under {}", base),
        None => tracing::info!("Serving mirrors under {}://<host>/", config.scheme),
    }
    if config.negative_cache_ttl.is_zero() {
        tracing::info!("Negative cache: disabled");
    }

    match which::which(&config.git) {
        Ok(path) => tracing::info!("Using git at {}", path.display()),
        Err(e) => tracing::warn!(
            "git executable {:?} not found ({}); upstream clones will fail",
            config.git,
            e
        ),
    }

    std::fs::create_dir_all(&config.repo_root).with_context(|| {
        format!("Failed to create repo root {}", config.repo_root.display())
    })?;

    let state = Arc::new(ServerState::new(config.clone())?);

    if let Some(ref cache) = state.negative_cache {
        tokio::spawn(negative_cache::run_cleanup_loop(Arc::clone(cache)));
    }
    tokio::spawn(run_job_cleanup_loop(Arc::clone(&state.jobs)));

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("bower-cache is ready to serve");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically drop finished clone jobs
async fn run_job_cleanup_loop(jobs: Arc<CloneJobs>) {
    loop {
        tokio::time::sleep(JOB_CLEANUP_INTERVAL).await;

        let removed = jobs.cleanup_expired();
        if removed > 0 {
            tracing::debug!("Clone job cleanup: removed {} finished jobs", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_config_follows_server_config() {
        let config = ServerConfig {
            repo_url: Some("git://localhost/".to_string()),
            wait_budget: Duration::from_secs(2),
            ..ServerConfig::default()
        };

        let resolver = config.resolver_config();
        assert_eq!(resolver.repo_url.as_deref(), Some("git://localhost/"));
        assert_eq!(resolver.wait_budget, Duration::from_secs(2));
        assert_eq!(resolver.scheme, "git");
    }

    #[test]
    fn test_state_new_creates_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            repo_root: temp_dir.path().join("git"),
            db_path: temp_dir.path().join("db/registry.db"),
            ..ServerConfig::default()
        };

        let state = ServerState::new(config).unwrap();
        assert!(temp_dir.path().join("db/registry.db").exists());
        assert!(state.negative_cache.is_some());
        assert!(state.catalog.list().unwrap().is_empty());
    }

    #[test]
    fn test_zero_ttl_disables_negative_cache() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            db_path: temp_dir.path().join("registry.db"),
            negative_cache_ttl: Duration::ZERO,
            ..ServerConfig::default()
        };

        let state = ServerState::new(config).unwrap();
        assert!(state.negative_cache.is_none());
    }
}
