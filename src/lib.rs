// src/lib.rs

//! bower-cache
//!
//! Caching proxy registry for Bower packages. Lookups are answered from
//! local git mirrors first, then from directly registered catalog entries,
//! and finally by cloning the package from an upstream registry while the
//! caller waits a bounded time.
//!
//! # Architecture
//!
//! - [`mirror`]: git repositories under a repo root, one per package
//! - [`catalog`]: SQLite table of packages registered by hand
//! - [`upstream`]: name lookups against the upstream registry
//! - [`clone`]: background `git clone --mirror` jobs with bounded waits
//! - [`resolve`]: the three-tier resolution engine
//! - [`server`]: the Bower registry HTTP API

pub mod catalog;
pub mod clone;
pub mod db;
pub mod descriptor;
mod error;
pub mod metrics;
pub mod mirror;
pub mod negative_cache;
pub mod resolve;
pub mod server;
pub mod upstream;

pub use catalog::{Catalog, SqliteCatalog};
pub use clone::{AwaitError, CloneDispatcher, CloneHandle, GitCloneDispatcher};
pub use descriptor::PackageDescriptor;
pub use error::{Error, Result};
pub use mirror::{GitMirrorStore, MirrorEntry, MirrorStore};
pub use resolve::{RequestContext, ResolutionError, Resolver, ResolverConfig};
pub use upstream::{RegistryClient, UpstreamLookup, UpstreamMetadata};
