// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use bower_cache::catalog::{Catalog, SqliteCatalog};
use bower_cache::clone::{CloneDispatcher, CloneHandle, CloneJobs};
use bower_cache::mirror::{GitMirrorStore, MirrorStore};
use bower_cache::server::{ServerConfig, ServerState, create_router};
use bower_cache::{Resolver, ResolverConfig, Result, UpstreamLookup, UpstreamMetadata};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

/// Write a bare git repository layout with an origin remote.
///
/// Only the files the mirror store looks at are created.
pub fn make_mirror(repo_root: &Path, name: &str, origin: &str) {
    let dir = repo_root.join(name);
    std::fs::create_dir_all(dir.join("objects")).unwrap();
    std::fs::write(dir.join("HEAD"), "ref: refs/heads/master\n").unwrap();
    std::fs::write(
        dir.join("config"),
        format!(
            "[core]\n\tbare = true\n[remote \"origin\"]\n\turl = {}\n\tmirror = true\n",
            origin
        ),
    )
    .unwrap();
}

/// Upstream registry answering from a fixed table.
#[derive(Default)]
pub struct StaticUpstream {
    pub packages: HashMap<String, String>,
    pub calls: AtomicUsize,
}

impl StaticUpstream {
    pub fn with(packages: &[(&str, &str)]) -> Self {
        Self {
            packages: packages
                .iter()
                .map(|(name, url)| (name.to_string(), url.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamLookup for StaticUpstream {
    async fn lookup(&self, _registry: &str, name: &str) -> Result<Option<UpstreamMetadata>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.packages.get(name).map(|url| UpstreamMetadata {
            name: name.to_string(),
            clone_url: url.clone(),
        }))
    }
}

/// Dispatcher that "clones" by writing a mirror layout after a delay.
pub struct DelayedDispatcher {
    repo_root: PathBuf,
    delay: Duration,
    pub dispatched: AtomicUsize,
}

impl DelayedDispatcher {
    pub fn new(repo_root: &Path, delay: Duration) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            delay,
            dispatched: AtomicUsize::new(0),
        }
    }
}

impl CloneDispatcher for DelayedDispatcher {
    fn dispatch(&self, name: &str, source_url: &str) -> CloneHandle {
        self.dispatched.fetch_add(1, Ordering::SeqCst);

        let (completer, handle) = CloneHandle::channel(name);
        let repo_root = self.repo_root.clone();
        let delay = self.delay;
        let name = name.to_string();
        let source_url = source_url.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            make_mirror(&repo_root, &name, &source_url);
            let outcome = GitMirrorStore::new(&repo_root)
                .get(&name)
                .map_err(|e| e.to_string())
                .and_then(|entry| entry.ok_or_else(|| "mirror missing".to_string()));
            completer.complete(outcome);
        });

        handle
    }
}

/// A registry server over temp storage with fake upstream and cloning.
pub struct TestRegistry {
    pub temp_dir: TempDir,
    pub catalog: Arc<SqliteCatalog>,
    pub upstream: Arc<StaticUpstream>,
    pub dispatcher: Arc<DelayedDispatcher>,
    pub app: Router,
}

impl TestRegistry {
    pub fn repo_root(&self) -> PathBuf {
        self.temp_dir.path().join("git")
    }

    /// Send one request through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// GET `uri` with the given Host header
    pub async fn get(&self, uri: &str, host: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .header("host", host)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST a JSON body to `uri`
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }
}

/// Build a registry whose clones land after `clone_delay`.
pub fn setup_registry(
    repo_url: Option<&str>,
    wait_budget: Duration,
    clone_delay: Duration,
    upstream: StaticUpstream,
) -> TestRegistry {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo_root = temp_dir.path().join("git");
    std::fs::create_dir_all(&repo_root).unwrap();

    let config = ServerConfig {
        repo_root: repo_root.clone(),
        db_path: temp_dir.path().join("registry.db"),
        repo_url: repo_url.map(str::to_string),
        wait_budget,
        ..ServerConfig::default()
    };

    let catalog = Arc::new(SqliteCatalog::open(&config.db_path).unwrap());
    let upstream = Arc::new(upstream);
    let dispatcher = Arc::new(DelayedDispatcher::new(&repo_root, clone_delay));

    let resolver = Resolver::new(
        Arc::new(GitMirrorStore::new(&repo_root)),
        catalog.clone(),
        upstream.clone(),
        dispatcher.clone(),
        ResolverConfig {
            repo_url: config.repo_url.clone(),
            wait_budget,
            ..ResolverConfig::default()
        },
    );

    let state = ServerState::from_parts(
        config,
        resolver,
        catalog.clone() as Arc<dyn Catalog>,
        Arc::new(CloneJobs::default()),
    );

    TestRegistry {
        temp_dir,
        catalog,
        upstream,
        dispatcher,
        app: create_router(Arc::new(state)),
    }
}

/// Read a response body as JSON
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
