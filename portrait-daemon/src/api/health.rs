//! Health and metrics endpoints

use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;

use portrait_metrics::PrometheusExporter;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" once the renderer is ready, otherwise "initializing"
    pub status: String,
    pub gpu_available: bool,
    pub gpu_name: Option<String>,
    pub cuda_version: Option<String>,
    pub device: String,
    pub model_loaded: bool,
    pub model_version: String,
    pub uptime_seconds: i64,
}

/// Liveness and readiness check
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let ready = state.renderer.is_ready();
    let snapshot = state.metrics.snapshot();

    Json(HealthResponse {
        status: if ready { "healthy" } else { "initializing" }.to_string(),
        gpu_available: state.gpu.is_some(),
        gpu_name: state.gpu.as_ref().map(|g| g.name.clone()),
        cuda_version: state.gpu.as_ref().and_then(|g| g.cuda_version.clone()),
        device: state.renderer.device().to_string(),
        model_loaded: ready,
        model_version: state.renderer.model_version().to_string(),
        uptime_seconds: snapshot.uptime_seconds(),
    })
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = PrometheusExporter::new().export(&state.metrics.snapshot());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
