// src/commands/resolve.rs
//! One-shot resolution from the command line

use anyhow::Result;
use bower_cache::resolve::{RequestContext, ResolutionError};
use bower_cache::server::{RegistryConfig, ServerState};
use std::path::Path;
use tracing::info;

/// Resolve `name` through the full engine and print the descriptor
///
/// A clone started here is killed when the process exits, so a package
/// that needs longer than the wait budget is reported as still cloning.
pub async fn cmd_resolve(name: &str, config_path: Option<&str>, host: &str) -> Result<()> {
    info!("Resolving {} as host {}", name, host);
    let config = RegistryConfig::load_or_default(config_path.map(Path::new))?.to_server_config()?;
    let state = ServerState::new(config)?;

    let ctx = RequestContext::new(host);
    match state.resolver.resolve(&ctx, name).await {
        Ok(descriptor) => {
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
            Ok(())
        }
        Err(ResolutionError::TemporarilyUnavailable { retry_after, .. }) => {
            if let Some(job) = state.jobs.get_by_name(name) {
                info!(
                    "Clone job {} for {} from {} is {:?}",
                    job.id, name, job.source_url, job.status
                );
            }
            anyhow::bail!(
                "{} is still being cloned after {:?}; try again later",
                name,
                retry_after
            )
        }
        Err(e) => Err(e.into()),
    }
}
