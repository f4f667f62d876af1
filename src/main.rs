// src/main.rs

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands, MirrorCommands, PackageCommands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_path } => commands::cmd_init(&db_path),

        Commands::Serve { config, bind } => {
            commands::cmd_serve(config.as_deref(), bind.as_deref()).await
        }

        Commands::Package(package_cmd) => match package_cmd {
            PackageCommands::Add { name, url, db_path } => {
                commands::cmd_package_add(&name, &url, &db_path)
            }
            PackageCommands::List { db_path } => commands::cmd_package_list(&db_path),
            PackageCommands::Search { fragment, db_path } => {
                commands::cmd_package_search(&fragment, &db_path)
            }
            PackageCommands::Remove { name, db_path } => {
                commands::cmd_package_remove(&name, &db_path)
            }
        },

        Commands::Mirror(mirror_cmd) => match mirror_cmd {
            MirrorCommands::List { repo_root } => commands::cmd_mirror_list(&repo_root),
        },

        Commands::Resolve { name, config, host } => {
            commands::cmd_resolve(&name, config.as_deref(), &host).await
        }
    }
}
