// src/metrics.rs
//! Resolution metrics
//!
//! Atomic counters updated by the resolution engine, exposed through the
//! `/stats` endpoint.

use serde::Serialize;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for every resolution outcome
#[derive(Default)]
pub struct ResolutionMetrics {
    /// Total resolve calls
    requests_total: AtomicU64,
    /// Served from a local mirror
    mirror_hits: AtomicU64,
    /// Served from the catalog
    catalog_hits: AtomicU64,
    /// Unknown to the upstream registry
    upstream_misses: AtomicU64,
    /// Misses answered from the negative cache
    negative_cache_hits: AtomicU64,
    /// Clones started or joined
    clones_dispatched: AtomicU64,
    /// Clones that landed within the wait budget
    clones_in_budget: AtomicU64,
    /// Answered "try again later"
    unavailable: AtomicU64,
    /// Collaborator failures
    internal_errors: AtomicU64,
    start_time: OnceLock<Instant>,
}

impl ResolutionMetrics {
    pub fn new() -> Self {
        let metrics = Self::default();
        let _ = metrics.start_time.set(Instant::now());
        metrics
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mirror_hit(&self) {
        self.mirror_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_catalog_hit(&self) {
        self.catalog_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_miss(&self) {
        self.upstream_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_negative_cache_hit(&self) {
        self.negative_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clone_dispatched(&self) {
        self.clones_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clone_in_budget(&self) {
        self.clones_in_budget.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unavailable(&self) {
        self.unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_internal_error(&self) {
        self.internal_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let uptime = self
            .start_time
            .get()
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO);

        let requests_total = self.requests_total.load(Ordering::Relaxed);
        let mirror_hits = self.mirror_hits.load(Ordering::Relaxed);
        let catalog_hits = self.catalog_hits.load(Ordering::Relaxed);
        let local_hit_rate = if requests_total > 0 {
            ((mirror_hits + catalog_hits) as f64 / requests_total as f64) * 100.0
        } else {
            0.0
        };

        MetricsSnapshot {
            requests_total,
            mirror_hits,
            catalog_hits,
            local_hit_rate,
            upstream_misses: self.upstream_misses.load(Ordering::Relaxed),
            negative_cache_hits: self.negative_cache_hits.load(Ordering::Relaxed),
            clones_dispatched: self.clones_dispatched.load(Ordering::Relaxed),
            clones_in_budget: self.clones_in_budget.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
            uptime_secs: uptime.as_secs(),
        }
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub mirror_hits: u64,
    pub catalog_hits: u64,
    /// Percentage of requests answered without going upstream
    pub local_hit_rate: f64,
    pub upstream_misses: u64,
    pub negative_cache_hits: u64,
    pub clones_dispatched: u64,
    pub clones_in_budget: u64,
    pub unavailable: u64,
    pub internal_errors: u64,
    pub uptime_secs: u64,
}
