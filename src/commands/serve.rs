// src/commands/serve.rs
//! Registry server command

use anyhow::{Context, Result};
use bower_cache::server::{RegistryConfig, run_server};
use std::path::Path;
use tracing::info;

/// Run the HTTP server until interrupted
pub async fn cmd_serve(config_path: Option<&str>, bind: Option<&str>) -> Result<()> {
    let registry_config = RegistryConfig::load_or_default(config_path.map(Path::new))?;
    if let Some(path) = config_path {
        info!("Loaded configuration from {}", path);
    }

    let mut config = registry_config.to_server_config()?;
    if let Some(bind) = bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", bind))?;
    }

    run_server(config).await
}
