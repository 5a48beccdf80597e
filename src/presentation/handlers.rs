// HTTP request handlers
use crate::application::report_service::Report;
use crate::domain::time_range::TimeRange;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

#[derive(Deserialize)]
pub struct ReportQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Render a dashboard into a PDF and return it inline
pub async fn generate_report(
    Path(dashboard): Path<String>,
    Query(query): Query<ReportQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let defaults = TimeRange::default();
    let time_range = TimeRange::new(
        query.from.unwrap_or(defaults.from),
        query.to.unwrap_or(defaults.to),
    );
    tracing::info!("Generating report for dashboard {} ({} to {})", dashboard, time_range.from, time_range.to);

    let report = state.report_service.report(&dashboard, time_range);
    let result = read_report(&report).await;
    report.clean().await;

    match result {
        Ok(pdf) => {
            let disposition = format!("inline; filename=\"{}.pdf\"", dashboard.replace('"', ""));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                pdf,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Error generating report for dashboard {}: {:#}", dashboard, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn read_report(report: &Report) -> anyhow::Result<Vec<u8>> {
    let mut document = report.generate().await?;
    let mut pdf = Vec::new();
    document.read_to_end(&mut pdf).await?;
    Ok(pdf)
}
