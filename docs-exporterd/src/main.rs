mod api;
mod collector;
mod config;
mod exporter;

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use anyhow::{Context, Result};
use crate::api::routes::{router, AppState};
use crate::config::Config;
use crate::exporter::http::HttpExporter;
use crate::exporter::{Exporter, ExporterService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("docs_exporterd=info")),
        )
        .init();

    tracing::info!("Starting docs-exporterd");

    // Load config
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/docs-exporter/exporterd.toml".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    tracing::info!(
        "Loaded config from {} ({} registered services)",
        config_path,
        config.services.len()
    );

    // Build the exporter set; the HTTP exporter also backs the API
    let http_exporter = Arc::new(HttpExporter::new());
    let exporters: Vec<Arc<dyn Exporter>> = vec![http_exporter.clone()];
    let exporter_service = ExporterService::new(exporters);

    tracing::info!(
        "Registered {} exporters",
        exporter_service.exporters().len()
    );

    // Discovery feeds the engine through these two streams
    let (about_tx, about_rx) = mpsc::channel(256);
    let (error_tx, error_rx) = mpsc::channel(256);

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Spawn collector task
    let collector_cancel = cancel.clone();
    let collector_config = config.collector.clone();
    let targets = config.services.clone();
    let collector_handle = tokio::spawn(async move {
        if let Err(e) =
            collector::run(targets, about_tx, error_tx, collector_config, collector_cancel).await
        {
            tracing::error!("Collector error: {}", e);
        }
    });

    // Start the fan-out engine; the handle resolves once both streams close
    let export_handle = exporter_service.export(about_rx, error_rx);

    // Build API router
    let app = router(AppState {
        exporter: http_exporter,
    });

    // Bind HTTP server
    let listener = tokio::net::TcpListener::bind(&config.api.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.api.listen))?;

    tracing::info!("API listening on {}", config.api.listen);

    // Run server with graceful shutdown
    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutdown signal received");

    // Trigger cancellation
    cancel.cancel();

    // Wait for all tasks to complete; the collector dropping its senders
    // closes both streams, which lets the export tasks drain and finish
    let _ = tokio::join!(collector_handle, server_handle);
    export_handle.join().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
