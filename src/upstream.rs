// src/upstream.rs
//! Upstream registry lookups
//!
//! The upstream is consulted only when a package is neither mirrored nor in
//! the catalog. The only part of its API used here is the single-package
//! endpoint `GET {registry}/packages/{name}`, which answers
//! `{"name": ..., "url": ...}` or 404.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Default timeout for upstream requests (30 seconds)
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// What the upstream registry knows about a package
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamMetadata {
    pub name: String,
    /// Where the package's repository can be cloned from
    #[serde(rename = "url")]
    pub clone_url: String,
}

/// Name -> clone URL lookups against an upstream registry
#[async_trait]
pub trait UpstreamLookup: Send + Sync {
    /// Look up `name` in the registry at `registry`
    ///
    /// `Ok(None)` means the upstream has no such package.
    async fn lookup(&self, registry: &str, name: &str) -> Result<Option<UpstreamMetadata>>;
}

/// HTTP client for Bower-style registries
pub struct RegistryClient {
    client: reqwest::Client,
}

impl RegistryClient {
    /// Create a client with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_UPSTREAM_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bower-cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamLookup for RegistryClient {
    async fn lookup(&self, registry: &str, name: &str) -> Result<Option<UpstreamMetadata>> {
        let url = package_url(registry, name)?;
        debug!("Querying upstream registry: {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            Error::DownloadError(format!("Failed to query {}: {e}", url))
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                info!("Upstream registry has no package named {}", name);
                Ok(None)
            }
            status if status.is_success() => {
                let metadata: UpstreamMetadata = response.json().await.map_err(|e| {
                    Error::DownloadError(format!("Invalid registry response from {}: {e}", url))
                })?;

                let clone_url = metadata.clone_url.trim();
                if clone_url.is_empty() {
                    return Err(Error::DownloadError(format!(
                        "Registry returned an empty url for {}",
                        name
                    )));
                }
                if clone_url.starts_with('-') {
                    return Err(Error::DownloadError(format!(
                        "Registry returned an option-like url for {}: {}",
                        name, clone_url
                    )));
                }

                Ok(Some(metadata))
            }
            status => Err(Error::DownloadError(format!(
                "Registry returned HTTP {} for {}",
                status, url
            ))),
        }
    }
}

/// Build `{registry}/packages/{name}`, percent-encoding the name
pub fn package_url(registry: &str, name: &str) -> Result<Url> {
    let mut url = Url::parse(registry)
        .map_err(|e| Error::InvalidInput(format!("Invalid registry URL '{}': {e}", registry)))?;

    url.path_segments_mut()
        .map_err(|_| Error::InvalidInput(format!("Registry URL cannot be a base: {}", registry)))?
        .pop_if_empty()
        .push("packages")
        .push(name);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_url() {
        let url = package_url("https://bower.herokuapp.com", "ember").unwrap();
        assert_eq!(url.as_str(), "https://bower.herokuapp.com/packages/ember");

        let url = package_url("https://registry.example/api/", "ember-data").unwrap();
        assert_eq!(url.as_str(), "https://registry.example/api/packages/ember-data");
    }

    #[test]
    fn test_package_url_encodes_name() {
        let url = package_url("https://bower.herokuapp.com", "a b/c").unwrap();
        assert_eq!(url.as_str(), "https://bower.herokuapp.com/packages/a%20b%2Fc");
    }

    #[test]
    fn test_package_url_rejects_bad_registry() {
        assert!(package_url("not a url", "ember").is_err());
        assert!(package_url("mailto:someone@example.com", "ember").is_err());
    }

    #[test]
    fn test_metadata_deserializes_registry_shape() {
        let json = r#"{"name":"jquery","url":"git://github.com/jquery/jquery.git","hits":1234}"#;
        let metadata: UpstreamMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.name, "jquery");
        assert_eq!(metadata.clone_url, "git://github.com/jquery/jquery.git");
    }
}
