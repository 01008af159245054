//! Emotion-to-motion and expression-preset endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use portrait_motion::{
    Emotion, EmotionMapping, ExpressionPreset, KeypointSet, MotionParameters, PresetName,
    EMOTION_MAPPINGS, EXPRESSION_PRESETS,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Preset intensity when a request omits it
const DEFAULT_PRESET_INTENSITY: f64 = 1.0;

#[derive(Debug, Deserialize)]
pub struct MotionRequest {
    pub emotion: String,
    #[serde(default)]
    pub intensity: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MotionResponse {
    pub emotion: Emotion,
    pub intensity: f64,
    pub parameters: MotionParameters,
}

#[derive(Debug, Deserialize)]
pub struct ExpressionRequest {
    pub keypoints: Vec<[f64; 3]>,
    pub preset: String,
    #[serde(default)]
    pub intensity: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ExpressionResponse {
    pub preset: PresetName,
    pub intensity: f64,
    pub keypoints: KeypointSet,
}

/// Full emotion table
pub async fn list_emotions() -> Json<Vec<EmotionMapping>> {
    Json(EMOTION_MAPPINGS.to_vec())
}

/// Full preset table
pub async fn list_presets() -> Json<Vec<ExpressionPreset>> {
    Json(EXPRESSION_PRESETS.to_vec())
}

/// Resolve motion parameters for an emotion without rendering
pub async fn resolve_motion(
    State(state): State<AppState>,
    payload: Result<Json<MotionRequest>, JsonRejection>,
) -> Result<Json<MotionResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let emotion: Emotion = req.emotion.parse()?;
    let intensity = check_emotion_intensity(req.intensity, state.config.default_intensity)?;
    let parameters = portrait_motion::resolve(emotion, intensity)?;

    debug!("Resolved motion: emotion={}, intensity={}", emotion, intensity);

    Ok(Json(MotionResponse {
        emotion,
        intensity,
        parameters,
    }))
}

/// Apply an expression preset to a keypoint set
pub async fn apply_expression(
    payload: Result<Json<ExpressionRequest>, JsonRejection>,
) -> Result<Json<ExpressionResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let preset: PresetName = req.preset.parse()?;
    let keypoints = KeypointSet::try_from(req.keypoints)?;

    let intensity = req.intensity.unwrap_or(DEFAULT_PRESET_INTENSITY);
    if !intensity.is_finite() {
        return Err(ApiError::bad_request("intensity must be a finite number"));
    }
    if keypoints.iter().flatten().any(|v| !v.is_finite()) {
        return Err(ApiError::bad_request("keypoint coordinates must be finite"));
    }

    let keypoints = portrait_motion::apply(&keypoints, preset, intensity)?;

    Ok(Json(ExpressionResponse {
        preset,
        intensity,
        keypoints,
    }))
}

/// Emotion intensity from a request, or `default` when omitted; must lie in `[0, 1]`
pub fn check_emotion_intensity(requested: Option<f64>, default: f64) -> Result<f64, ApiError> {
    let intensity = requested.unwrap_or(default);
    if !portrait_motion::is_valid_emotion_intensity(intensity) {
        return Err(ApiError::bad_request(format!(
            "intensity must be within [{}, {}], got {}",
            portrait_motion::MIN_EMOTION_INTENSITY,
            portrait_motion::MAX_EMOTION_INTENSITY,
            intensity
        )));
    }
    Ok(intensity)
}
