// src/server/routes.rs
//! Axum router configuration for the registry server
//!
//! Paths follow the Bower registry API so stock `bower` clients can point
//! their `registry` setting at this server.

use crate::server::ServerState;
use crate::server::handlers::{packages, stats};
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router
pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(stats::get_stats))
        .route(
            "/packages",
            get(packages::list_packages).post(packages::create_package),
        )
        .route("/packages/search/:fragment", get(packages::search_packages))
        .route("/packages/:name", get(packages::get_package))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
