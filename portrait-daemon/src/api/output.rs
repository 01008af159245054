//! Rendered image download and deletion

use std::io::ErrorKind;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::renderer::OutputFormat;
use crate::state::AppState;

/// Serve a rendered image
pub async fn get_output(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let format = check_filename(&filename)?;
    let path = state.config.output_dir.join(&filename);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ApiError::not_found(format!("Output not found: {filename}")),
        _ => ApiError::internal(format!("Failed to read output: {e}")),
    })?;

    Ok(([(header::CONTENT_TYPE, format.content_type())], bytes))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: String,
    pub filename: String,
}

/// Delete a rendered image
pub async fn delete_output(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    check_filename(&filename)?;
    let path = state.config.output_dir.join(&filename);

    tokio::fs::remove_file(&path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ApiError::not_found(format!("Output not found: {filename}")),
        _ => ApiError::internal(format!("Failed to delete output: {e}")),
    })?;

    info!("Deleted output {}", filename);
    Ok(Json(DeleteResponse {
        status: "deleted".to_string(),
        filename,
    }))
}

/// Accept only plain file names inside the output directory with an image extension
pub fn check_filename(filename: &str) -> Result<OutputFormat, ApiError> {
    let plain = !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains("..")
        && !filename.contains(['/', '\\', '\0']);
    if !plain {
        return Err(ApiError::bad_request(format!("Invalid filename: {filename}")));
    }

    OutputFormat::from_filename(filename)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid filename: {filename}")))
}
