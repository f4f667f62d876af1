// src/server/handlers/stats.rs
//! Statistics endpoint

use crate::clone::JobStats;
use crate::metrics::MetricsSnapshot;
use crate::negative_cache::NegativeCacheStats;
use crate::server::ServerState;
use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

/// Response body of `GET /stats`
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub resolution: MetricsSnapshot,
    pub clone_jobs: JobStats,
    /// Absent when negative caching is disabled
    pub negative_cache: Option<NegativeCacheStats>,
}

/// GET /stats
pub async fn get_stats(State(state): State<Arc<ServerState>>) -> Json<StatsResponse> {
    let negative_cache = match state.negative_cache {
        Some(ref cache) => Some(cache.stats().await),
        None => None,
    };

    Json(StatsResponse {
        resolution: state.metrics().snapshot(),
        clone_jobs: state.jobs.stats(),
        negative_cache,
    })
}
