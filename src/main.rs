mod cli;

use crate::cli::{Cli, Commands};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use webcam_tiler::AppConfig;
use webcam_tiler::application::WebcamRegistry;
use webcam_tiler::debug::debug_helpers::{log_error_details, log_system_info};
use webcam_tiler::debug::{DebugConfig, init_logging};
use webcam_tiler::domain::webcam::{TileRepository, WebcamId};
use webcam_tiler::infrastructure::clock::SystemClock;
use webcam_tiler::infrastructure::storage::{FileTileRepository, InMemoryTileRepository};
use webcam_tiler::interfaces::web::server::create_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let debug_config = DebugConfig::from_flags(cli.verbose, cli.json_logs);
    if let Err(e) = init_logging(&debug_config) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    log_system_info();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let dry_run = matches!(cli.command, Commands::Update { dry_run: true, .. });
    let repository: Arc<dyn TileRepository> = if dry_run {
        Arc::new(InMemoryTileRepository::new())
    } else {
        let repository = FileTileRepository::new(config.settings.tile_directory());
        repository.ensure_directory().await?;
        Arc::new(repository)
    };

    // Dependency injection
    let registry = Arc::new(WebcamRegistry::from_config(
        &config,
        repository,
        Arc::new(SystemClock),
    )?);

    match cli.command {
        Commands::Update { id, json, .. } => {
            let results = match id {
                Some(id) => {
                    let id = WebcamId::new(id);
                    let result = registry.update(&id).await;
                    vec![(id, result)]
                }
                None => registry.update_all().await,
            };

            let mut failed = false;
            let mut snapshots = Vec::with_capacity(results.len());
            for (id, result) in results {
                if json {
                    if let Ok(snapshot) = registry.snapshot(&id).await {
                        snapshots.push(snapshot);
                    }
                }
                match result {
                    Ok(report) => {
                        let line = format!(
                            "✅ {id}: {} ({} attempt(s), {} tile(s) written)",
                            report.state, report.attempts, report.tiles_written
                        );
                        // Keep stdout pure JSON
                        if json {
                            eprintln!("{line}");
                        } else {
                            println!("{line}");
                        }
                    }
                    Err(e) => {
                        failed = true;
                        log_error_details(&e, "update");
                        eprintln!("❌ {id}: {e}");
                    }
                }
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshots)?);
            }
            if failed {
                std::process::exit(1);
            }
        }
        Commands::Serve { port, host } => {
            info!("Starting application...");

            match create_server(host, port, registry, &config.settings).await {
                Ok(_) => {
                    info!("Application terminated normally");
                }
                Err(e) => {
                    error!("Application failed: {}", e);
                    eprintln!("❌ Application failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
