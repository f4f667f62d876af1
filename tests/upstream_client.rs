// tests/upstream_client.rs

//! RegistryClient against a local stand-in for the upstream registry.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bower_cache::{Error, RegistryClient, UpstreamLookup};
use serde_json::json;
use std::time::Duration;

async fn package(Path(name): Path<String>) -> Response {
    match name.as_str() {
        "jquery" => Json(json!({
            "name": "jquery",
            "url": "git://github.com/jquery/jquery.git",
            "hits": 1234
        }))
        .into_response(),
        "empty-url" => Json(json!({"name": "empty-url", "url": ""})).into_response(),
        "dash-url" => Json(json!({
            "name": "dash-url",
            "url": "--upload-pack=touch /tmp/bower-cache-marker"
        }))
        .into_response(),
        "garbage" => (StatusCode::OK, "<html>not json</html>").into_response(),
        "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::NOT_FOUND.into_response()
        }
        "a b" => Json(json!({"name": "a b", "url": "git://spaces.example/x.git"})).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serve a fake registry under `/api` and return its base URL
async fn spawn_registry() -> String {
    let app = Router::new().route("/api/packages/:name", get(package));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api", addr)
}

#[tokio::test]
async fn test_lookup_known_package() {
    let registry = spawn_registry().await;
    let client = RegistryClient::new().unwrap();

    let metadata = client.lookup(&registry, "jquery").await.unwrap().unwrap();
    assert_eq!(metadata.name, "jquery");
    assert_eq!(metadata.clone_url, "git://github.com/jquery/jquery.git");
}

#[tokio::test]
async fn test_lookup_unknown_package() {
    let registry = spawn_registry().await;
    let client = RegistryClient::new().unwrap();

    assert!(client.lookup(&registry, "wat").await.unwrap().is_none());
}

#[tokio::test]
async fn test_lookup_encodes_name() {
    let registry = spawn_registry().await;
    let client = RegistryClient::new().unwrap();

    let metadata = client.lookup(&registry, "a b").await.unwrap().unwrap();
    assert_eq!(metadata.clone_url, "git://spaces.example/x.git");
}

#[tokio::test]
async fn test_lookup_errors() {
    let registry = spawn_registry().await;
    let client = RegistryClient::new().unwrap();

    for name in ["broken", "garbage", "empty-url", "dash-url"] {
        let err = client.lookup(&registry, name).await.unwrap_err();
        assert!(matches!(err, Error::DownloadError(_)), "{name}: {err}");
    }
}

#[tokio::test]
async fn test_lookup_timeout() {
    let registry = spawn_registry().await;
    let client = RegistryClient::with_timeout(Duration::from_millis(200)).unwrap();

    let err = client.lookup(&registry, "slow").await.unwrap_err();
    assert!(matches!(err, Error::DownloadError(_)));
}

#[tokio::test]
async fn test_lookup_unreachable_registry() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = RegistryClient::with_timeout(Duration::from_secs(2)).unwrap();
    let err = client
        .lookup(&format!("http://{}", addr), "jquery")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DownloadError(_)));
}
