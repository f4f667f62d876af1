// src/negative_cache.rs
//! Negative result caching for upstream lookups
//!
//! When a package isn't found upstream, we cache the "not found" result
//! so repeated requests for a nonexistent name don't hit the upstream
//! registry every time.

use crate::error::Result;
use crate::metrics::ResolutionMetrics;
use crate::upstream::{UpstreamLookup, UpstreamMetadata};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Default time-to-live for cached misses (15 minutes)
pub const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(15 * 60);

/// Cache entry for negative results
#[derive(Debug, Clone)]
struct NegativeEntry {
    created_at: Instant,
    /// Number of lookups answered from this entry
    hit_count: u64,
}

/// Negative cache for "not found" responses
pub struct NegativeCache {
    entries: RwLock<HashMap<String, NegativeEntry>>,
    ttl: Duration,
}

impl NegativeCache {
    /// Create a new negative cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Check and record a hit if the key is in the cache
    ///
    /// Expired entries are dropped on the way.
    pub async fn check_and_record_hit(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            if entry.created_at.elapsed() < self.ttl {
                entry.hit_count += 1;
                return true;
            }
            entries.remove(key);
        }
        false
    }

    /// Mark a key as "not found"
    pub async fn mark_negative(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            NegativeEntry {
                created_at: Instant::now(),
                hit_count: 0,
            },
        );
    }

    /// Get cache statistics
    pub async fn stats(&self) -> NegativeCacheStats {
        let entries = self.entries.read().await;

        let mut stats = NegativeCacheStats {
            total_entries: entries.len(),
            ttl_secs: self.ttl.as_secs(),
            ..NegativeCacheStats::default()
        };

        for entry in entries.values() {
            stats.total_hits += entry.hit_count;
            if entry.created_at.elapsed() < self.ttl {
                stats.active_entries += 1;
            } else {
                stats.expired_entries += 1;
            }
        }

        stats
    }

    /// Clean up expired entries, returning how many were removed
    pub async fn cleanup(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        before - entries.len()
    }
}

/// Statistics for the negative cache
#[derive(Debug, Clone, Default, Serialize)]
pub struct NegativeCacheStats {
    pub total_entries: usize,
    pub active_entries: usize,
    /// Expired but not yet cleaned up
    pub expired_entries: usize,
    pub total_hits: u64,
    pub ttl_secs: u64,
}

/// Background cleanup loop for the negative cache
///
/// Runs every 5 minutes to remove expired entries.
pub async fn run_cleanup_loop(cache: Arc<NegativeCache>) {
    let interval = Duration::from_secs(5 * 60);

    loop {
        tokio::time::sleep(interval).await;

        let removed = cache.cleanup().await;
        if removed > 0 {
            debug!("Negative cache cleanup: removed {} expired entries", removed);
        }
    }
}

/// [`UpstreamLookup`] that remembers upstream misses
///
/// Only "no such package" answers are cached; lookup errors and hits always
/// go through to the wrapped client.
pub struct NegativeCachingLookup<L> {
    inner: L,
    cache: Arc<NegativeCache>,
    metrics: Option<Arc<ResolutionMetrics>>,
}

impl<L: UpstreamLookup> NegativeCachingLookup<L> {
    pub fn new(inner: L, cache: Arc<NegativeCache>) -> Self {
        Self {
            inner,
            cache,
            metrics: None,
        }
    }

    /// Count cache hits in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<ResolutionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cache(&self) -> &Arc<NegativeCache> {
        &self.cache
    }

    fn key(registry: &str, name: &str) -> String {
        format!("{}\n{}", registry, name)
    }
}

#[async_trait]
impl<L: UpstreamLookup> UpstreamLookup for NegativeCachingLookup<L> {
    async fn lookup(&self, registry: &str, name: &str) -> Result<Option<UpstreamMetadata>> {
        let key = Self::key(registry, name);

        if self.cache.check_and_record_hit(&key).await {
            debug!("Negative cache hit for {}", name);
            if let Some(metrics) = &self.metrics {
                metrics.record_negative_cache_hit();
            }
            return Ok(None);
        }

        let found = self.inner.lookup(registry, name).await?;
        if found.is_none() {
            self.cache.mark_negative(&key).await;
        }
        Ok(found)
    }
}
