//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use portrait_motion::{KeypointShapeError, MotionError};

use crate::renderer::RenderError;

/// API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "message": self.message,
                "type": match self.status.as_u16() {
                    400 => "invalid_request_error",
                    404 => "not_found_error",
                    413 => "payload_too_large",
                    503 => "unavailable",
                    _ => "server_error",
                },
                "code": self.status.as_u16()
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<MotionError> for ApiError {
    fn from(err: MotionError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<KeypointShapeError> for ApiError {
    fn from(err: KeypointShapeError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        match &err {
            RenderError::NotReady => ApiError::service_unavailable(err.to_string()),
            RenderError::InvalidInput(_) | RenderError::UnsupportedFormat(_) => {
                ApiError::bad_request(err.to_string())
            }
            RenderError::Inference(_) | RenderError::Encode(_) => {
                ApiError::internal(format!("Render failed: {}", err))
            }
        }
    }
}
