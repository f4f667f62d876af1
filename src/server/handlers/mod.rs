// src/server/handlers/mod.rs
//! HTTP request handlers for the registry server

pub mod packages;
pub mod stats;

use crate::catalog::Catalog;
use crate::error::Error;
use crate::resolve::ResolutionError;
use crate::server::ServerState;
use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

/// Host used for base derivation when the request carries none
const DEFAULT_HOST: &str = "localhost";

/// Error body, in the shape Bower clients print
#[derive(Serialize)]
struct Detail<'a> {
    detail: &'a str,
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(Detail { detail: message })).into_response()
}

/// Failure of an API call, mapped onto an HTTP status
#[derive(Debug)]
pub enum ApiError {
    Resolution(ResolutionError),
    Catalog(Error),
    BadName(String),
}

impl From<ResolutionError> for ApiError {
    fn from(e: ResolutionError) -> Self {
        Self::Resolution(e)
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Catalog(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Resolution(ResolutionError::NotFound(_)) => {
                detail(StatusCode::NOT_FOUND, "Not found")
            }
            ApiError::Resolution(ResolutionError::TemporarilyUnavailable {
                retry_after, ..
            }) => {
                let seconds = retry_after.as_secs_f64().ceil().max(1.0) as u64;
                let mut response = detail(StatusCode::SERVICE_UNAVAILABLE, "Try again later");
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
                response
            }
            ApiError::Resolution(e @ ResolutionError::Internal { .. }) => {
                tracing::error!("{}", e);
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
            ApiError::BadName(reason) => detail(StatusCode::BAD_REQUEST, &reason),
            ApiError::Catalog(Error::InvalidInput(reason) | Error::InvalidName(reason)) => {
                detail(StatusCode::BAD_REQUEST, &reason)
            }
            ApiError::Catalog(Error::AlreadyExists(what)) => {
                detail(StatusCode::CONFLICT, &format!("{} already registered", what))
            }
            ApiError::Catalog(e) => {
                tracing::error!("Catalog error: {}", e);
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

/// Run a catalog call on the blocking pool
pub(crate) async fn with_catalog<T, F>(state: &ServerState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn Catalog) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let catalog = Arc::clone(&state.catalog);
    tokio::task::spawn_blocking(move || f(catalog.as_ref()))
        .await
        .map_err(|e| ApiError::Catalog(Error::IoError(format!("catalog task failed: {e}"))))?
        .map_err(ApiError::from)
}

/// Host the request arrived on, from the `Host` header
pub(crate) fn request_host(headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .unwrap_or(DEFAULT_HOST)
        .to_string()
}
