// src/resolve.rs
//! Package resolution
//!
//! Turns a package name into a servable [`PackageDescriptor`] by checking,
//! in strict order:
//!
//! 1. the local mirror store (served under a base derived from the request)
//! 2. the catalog (served verbatim)
//! 3. the upstream registry, cloning the package and waiting a bounded
//!    time for the clone to land
//!
//! The engine never retries. A clone that outlives the wait budget is
//! reported as [`ResolutionError::TemporarilyUnavailable`]; the clone keeps
//! running, and a later call finds the package in the mirror tier.

use crate::catalog::Catalog;
use crate::clone::{AwaitError, CloneDispatcher};
use crate::descriptor::PackageDescriptor;
use crate::error::Error;
use crate::metrics::ResolutionMetrics;
use crate::mirror::MirrorStore;
use crate::upstream::UpstreamLookup;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default time to wait for a dispatched clone (5 seconds)
pub const DEFAULT_WAIT_BUDGET: Duration = Duration::from_secs(5);

/// Per-request inputs to resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Host the request arrived on, possibly with a `:port` suffix
    pub host: String,
}

impl RequestContext {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Serving base for mirrors, used verbatim when set
    pub repo_url: Option<String>,
    /// Scheme for bases derived from the request host
    pub scheme: String,
    /// Upstream registry base URL
    pub upstream_registry: String,
    /// How long to wait for a dispatched clone
    pub wait_budget: Duration,
    /// Derive the clone-path base like the mirror-path base (with scheme)
    pub consistent_clone_base: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            repo_url: None,
            scheme: "git".to_string(),
            upstream_registry: "https://bower.herokuapp.com".to_string(),
            wait_budget: DEFAULT_WAIT_BUDGET,
            consistent_clone_base: false,
        }
    }
}

/// Why a name could not be resolved
#[derive(thiserror::Error, Debug)]
pub enum ResolutionError {
    /// Unknown locally and upstream
    #[error("package not found: {0}")]
    NotFound(String),

    /// A clone was dispatched but did not land within the wait budget
    #[error("package {name} is being cloned, retry later")]
    TemporarilyUnavailable { name: String, retry_after: Duration },

    /// A collaborator failed
    #[error("failed to resolve {name}: {source}")]
    Internal {
        name: String,
        #[source]
        source: Error,
    },
}

impl ResolutionError {
    fn internal(name: &str, source: Error) -> Self {
        Self::Internal {
            name: name.to_string(),
            source,
        }
    }

    /// Name of the package the failure refers to
    pub fn name(&self) -> &str {
        match self {
            Self::NotFound(name) => name,
            Self::TemporarilyUnavailable { name, .. } => name,
            Self::Internal { name, .. } => name,
        }
    }
}

/// Three-tier resolution engine
pub struct Resolver {
    mirrors: Arc<dyn MirrorStore>,
    catalog: Arc<dyn Catalog>,
    upstream: Arc<dyn UpstreamLookup>,
    dispatcher: Arc<dyn CloneDispatcher>,
    config: ResolverConfig,
    metrics: Arc<ResolutionMetrics>,
}

impl Resolver {
    pub fn new(
        mirrors: Arc<dyn MirrorStore>,
        catalog: Arc<dyn Catalog>,
        upstream: Arc<dyn UpstreamLookup>,
        dispatcher: Arc<dyn CloneDispatcher>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            mirrors,
            catalog,
            upstream,
            dispatcher,
            config,
            metrics: Arc::new(ResolutionMetrics::new()),
        }
    }

    /// Record outcomes in a shared metrics collector
    pub fn with_metrics(mut self, metrics: Arc<ResolutionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<ResolutionMetrics> {
        &self.metrics
    }

    /// Resolve `name` for a request described by `ctx`
    pub async fn resolve(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<PackageDescriptor, ResolutionError> {
        self.metrics.record_request();
        debug!("Get request for package {}", name);

        let result = self.resolve_tiers(ctx, name).await;
        match &result {
            Ok(_) => {}
            Err(ResolutionError::NotFound(_)) => self.metrics.record_upstream_miss(),
            Err(ResolutionError::TemporarilyUnavailable { .. }) => {
                self.metrics.record_unavailable()
            }
            Err(e @ ResolutionError::Internal { .. }) => {
                warn!("{}", e);
                self.metrics.record_internal_error();
            }
        }
        result
    }

    async fn resolve_tiers(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<PackageDescriptor, ResolutionError> {
        // Both stores touch the filesystem; keep them off the async workers
        let mirrors = Arc::clone(&self.mirrors);
        let lookup = name.to_string();
        let mirrored = run_blocking(name, move || mirrors.get(&lookup)).await?;
        if let Some(entry) = mirrored {
            debug!("{} found in mirror store", name);
            self.metrics.record_mirror_hit();
            return Ok(entry.to_descriptor(&self.mirror_base(ctx)));
        }

        let catalog = Arc::clone(&self.catalog);
        let lookup = name.to_string();
        let registered = run_blocking(name, move || catalog.get(&lookup)).await?;
        if let Some(entry) = registered {
            debug!("{} found in catalog", name);
            self.metrics.record_catalog_hit();
            return Ok(entry.into());
        }

        let base = self.clone_path_base(ctx);

        let metadata = self
            .upstream
            .lookup(&self.config.upstream_registry, name)
            .await
            .map_err(|e| ResolutionError::internal(name, e))?
            .ok_or_else(|| {
                debug!("{} unknown upstream", name);
                ResolutionError::NotFound(name.to_string())
            })?;

        info!("Spawning a cloning task for {} from {}", name, metadata.clone_url);
        let handle = self.dispatcher.dispatch(name, &metadata.clone_url);
        self.metrics.record_clone_dispatched();

        match handle.await_result(self.config.wait_budget).await {
            Ok(entry) => {
                self.metrics.record_clone_in_budget();
                Ok(entry.to_descriptor(&base))
            }
            Err(AwaitError::TimedOut) => {
                info!(
                    "Clone of {} still running after {:?}",
                    name, self.config.wait_budget
                );
                Err(ResolutionError::TemporarilyUnavailable {
                    name: name.to_string(),
                    retry_after: self.config.wait_budget,
                })
            }
            Err(AwaitError::Failed(reason)) => Err(ResolutionError::internal(
                name,
                Error::CloneError(reason),
            )),
            Err(AwaitError::Abandoned) => Err(ResolutionError::internal(
                name,
                Error::CloneError("clone job ended without a result".to_string()),
            )),
        }
    }

    /// Base for packages served from the mirror tier
    ///
    /// The override when configured, else `scheme://host/` with any port
    /// stripped from the request host.
    pub fn mirror_base(&self, ctx: &RequestContext) -> String {
        match &self.config.repo_url {
            Some(base) => base.clone(),
            None => format!("{}://{}/", self.config.scheme, strip_port(&ctx.host)),
        }
    }

    /// Base for packages that were just cloned
    ///
    /// The override when configured, else `host/` with the port stripped and
    /// no scheme. With `consistent_clone_base` this is the mirror base.
    pub fn clone_path_base(&self, ctx: &RequestContext) -> String {
        if self.config.consistent_clone_base {
            return self.mirror_base(ctx);
        }
        match &self.config.repo_url {
            Some(base) => base.clone(),
            None => format!("{}/", strip_port(&ctx.host)),
        }
    }
}

/// Run a store read on the blocking pool
async fn run_blocking<T, F>(name: &str, f: F) -> Result<T, ResolutionError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(|e| ResolutionError::internal(name, e)),
        Err(e) => Err(ResolutionError::internal(
            name,
            Error::IoError(format!("store lookup task failed: {e}")),
        )),
    }
}

/// Drop a `:port` suffix, splitting on the first `:`
pub fn strip_port(host: &str) -> &str {
    host.split_once(':').map_or(host, |(name, _)| name)
}
