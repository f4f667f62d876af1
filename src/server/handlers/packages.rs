// src/server/handlers/packages.rs
//! Package endpoints
//!
//! `GET /packages/:name` runs the resolution engine. A package that is
//! being cloned answers 503 with `Retry-After`, so clients retry and then
//! hit the freshly landed mirror. The list/create/search endpoints pass
//! straight through to the catalog.

use super::{ApiError, request_host, with_catalog};
use crate::descriptor::PackageDescriptor;
use crate::mirror::validate_name;
use crate::resolve::RequestContext;
use crate::server::ServerState;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use std::sync::Arc;

/// Body of `POST /packages`
#[derive(Debug, Deserialize)]
pub struct NewPackage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// GET /packages/:name
pub async fn get_package(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PackageDescriptor>, ApiError> {
    validate_name(&name).map_err(|e| ApiError::BadName(e.to_string()))?;

    let ctx = RequestContext::new(request_host(&headers));
    let descriptor = state.resolver.resolve(&ctx, &name).await?;
    Ok(Json(descriptor))
}

/// GET /packages
pub async fn list_packages(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<Vec<PackageDescriptor>>, ApiError> {
    let entries = with_catalog(&state, |catalog| catalog.list()).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// POST /packages
pub async fn create_package(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<NewPackage>,
) -> Result<(StatusCode, Json<PackageDescriptor>), ApiError> {
    let entry = with_catalog(&state, move |catalog| catalog.create(&body.name, &body.url)).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// GET /packages/search/:fragment
pub async fn search_packages(
    State(state): State<Arc<ServerState>>,
    Path(fragment): Path<String>,
) -> Result<Json<Vec<PackageDescriptor>>, ApiError> {
    let entries = with_catalog(&state, move |catalog| catalog.search(&fragment)).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
