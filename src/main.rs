// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::report_service::ReportService;
use crate::infrastructure::config::load_reporter_config;
use crate::infrastructure::grafana_client::GrafanaClient;
use crate::infrastructure::pdf_writer::PdfWriterFactory;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{generate_report, health_check};

const DEFAULT_CONFIG_PATH: &str = "config/reporter";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    // Load configuration
    let config_path =
        std::env::var("REPORTER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_reporter_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;
    tracing::info!(
        "Report templates config:\n{}",
        toml::to_string(&config).unwrap_or_default()
    );

    // Create adapters (infrastructure layer)
    let grafana = Arc::new(GrafanaClient::new(&config.grafana)?);
    let writers = Arc::new(PdfWriterFactory::new(config.font.clone(), config.rect.page));

    // Create services (application layer)
    let report_service = ReportService::new(grafana, writers, &config);

    // Create application state
    let state = Arc::new(AppState { report_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/api/report/:dashboard", get(generate_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting grafana-reporter on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
