//! chatterd - Multi-room TCP chat server.
//!
//! Bootstrap: configuration, tracing, database, shared state, background
//! tasks (broadcaster, cleanup sweeper, signal handler), then the gateway
//! accept loop until shutdown.

use chatterd::broadcast::run_broadcaster;
use chatterd::config::{Config, LogFormat};
use chatterd::db::Database;
use chatterd::network::Gateway;
use chatterd::state::{Hub, run_cleanup_sweeper};
use std::sync::Arc;
use tracing::info;

/// Resolve the configuration path from CLI arguments.
/// Supports `-c <path>`, `--config <path>`, or a bare path.
/// Falls back to `config.toml` when no argument is provided.
fn resolve_config_path() -> (String, bool) {
    let mut args = std::env::args().skip(1);

    match args.next() {
        Some(flag) if flag == "-c" || flag == "--config" => match args.next() {
            Some(path) => (path, true),
            None => {
                eprintln!("Missing path after {}", flag);
                std::process::exit(1);
            }
        },
        Some(path) => (path, true),
        None => ("config.toml".to_string(), false),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (before tracing, so we can use log_format)
    let (config_path, explicit) = resolve_config_path();

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) if !explicit => {
            // No config file is fine for the default path; run on defaults.
            eprintln!("Note: {} not loaded ({}), using defaults", config_path, e);
            Config::default()
        }
        Err(e) => {
            eprintln!("ERROR: Failed to load config from {}: {}", config_path, e);
            return Err(e.into());
        }
    };

    // Initialize tracing based on config
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match config.server.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .json()
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .init();
        }
    }

    info!(
        listen = %config.listen.address,
        db = %config.database.path,
        "Starting chatterd"
    );

    // Initialize database; open failure is fatal.
    let db = Database::new(&config.database.path).await?;

    // Create the Hub (shared state) and its internal queues.
    let (hub, queue_rx, cleanup_rx) = Hub::new(db, config.history.limit);
    info!("Hub initialized");

    // Spawn signal handler for graceful shutdown.
    {
        let shutdown_tx = hub.shutdown_tx.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigint = match signal(SignalKind::interrupt()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGINT handler");
                    return;
                }
            };
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = sigint.recv() => info!("Received SIGINT - initiating graceful shutdown"),
                _ = sigterm.recv() => info!("Received SIGTERM - initiating graceful shutdown"),
            }

            let _ = shutdown_tx.send(());
        });
    }

    // Broadcaster: the single consumer of the message queue.
    let broadcaster = tokio::spawn(run_broadcaster(Arc::clone(&hub), queue_rx));

    // Cleanup sweeper: reaps rooms that stay empty past the grace delay.
    let sweeper = tokio::spawn(run_cleanup_sweeper(Arc::clone(&hub), cleanup_rx));

    // Accept loop; returns when the shutdown signal fires.
    let gateway = Gateway::bind(config.listen.address, Arc::clone(&hub)).await?;
    gateway.run().await?;

    info!("Gateway stopped, waiting for tasks to finish...");
    let _ = broadcaster.await;
    let _ = sweeper.await;

    // Give connection tasks a moment to flush and close.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    info!("Shutdown complete");
    Ok(())
}
