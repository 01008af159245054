//! Portrait render endpoints (multipart upload)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use portrait_motion::{Emotion, MotionParameters};

use crate::api::motion::check_emotion_intensity;
use crate::error::ApiError;
use crate::renderer::{
    render_frame, OutputFormat, RenderJob, RenderedFrame, DEFAULT_DIMENSION, MAX_DIMENSION,
    MIN_DIMENSION,
};
use crate::state::AppState;

/// Result of one render
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub output_path: String,
    pub filename: String,
    pub emotion: Emotion,
    pub intensity: f64,
    pub latency_ms: f64,
    pub gpu_used: bool,
    pub model_version: String,
    pub width: u32,
    pub height: u32,
    pub parameters: MotionParameters,
}

#[derive(Debug, Serialize)]
pub struct BatchRenderResponse {
    pub results: Vec<RenderResponse>,
    pub total_latency_ms: f64,
}

/// Raw multipart fields before validation
#[derive(Debug, Default)]
struct RenderForm {
    image: Option<Arc<[u8]>>,
    emotion: Option<String>,
    emotions: Vec<String>,
    intensity: Option<String>,
    output_format: Option<String>,
    width: Option<String>,
    height: Option<String>,
}

impl RenderForm {
    async fn read(mut multipart: Multipart, max_upload_bytes: usize) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max_upload_bytes))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "source_image" | "image" => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error(e, max_upload_bytes))?;
                    if bytes.len() > max_upload_bytes {
                        return Err(upload_too_large(max_upload_bytes));
                    }
                    form.image = Some(Arc::from(bytes.as_ref()));
                }
                "emotion" | "emotions" | "intensity" | "output_format" | "width" | "height" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, max_upload_bytes))?;
                    match name.as_str() {
                        "emotion" => form.emotion = Some(text),
                        "emotions" => form.emotions.push(text),
                        "intensity" => form.intensity = Some(text),
                        "output_format" => form.output_format = Some(text),
                        "width" => form.width = Some(text),
                        _ => form.height = Some(text),
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    fn take_image(&mut self) -> Result<Arc<[u8]>, ApiError> {
        match self.image.take() {
            Some(image) if !image.is_empty() => Ok(image),
            Some(_) => Err(ApiError::bad_request("Source image is empty")),
            None => Err(ApiError::bad_request(
                "Missing source image (expected 'source_image' file field)",
            )),
        }
    }
}

/// Body-limit hits surface as multipart read errors; keep their 413
fn multipart_error(err: MultipartError, max_upload_bytes: usize) -> ApiError {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return upload_too_large(max_upload_bytes);
    }
    ApiError::new(
        status,
        format!("Failed reading multipart field: {}", err.body_text()),
    )
}

fn upload_too_large(max_upload_bytes: usize) -> ApiError {
    ApiError::payload_too_large(format!(
        "Source image exceeds the {max_upload_bytes} byte upload limit"
    ))
}

/// Validated render settings shared by every emotion in a request
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub intensity: f64,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl RenderSettings {
    fn from_form(form: &RenderForm, state: &AppState) -> Result<Self, ApiError> {
        let intensity = parse_intensity(form.intensity.as_deref(), state.config.default_intensity)?;
        let format = OutputFormat::parse(
            form.output_format
                .as_deref()
                .unwrap_or(state.config.default_output_format.as_str()),
        )?;

        Ok(Self {
            intensity,
            format,
            width: parse_dimension(form.width.as_deref(), "width")?,
            height: parse_dimension(form.height.as_deref(), "height")?,
        })
    }
}

/// A rendered frame not yet written to the output directory
struct PendingOutput {
    emotion: Emotion,
    parameters: MotionParameters,
    frame: RenderedFrame,
    elapsed: Duration,
}

/// Render one portrait with an emotion applied
pub async fn render(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RenderResponse>, ApiError> {
    state.ensure_ready()?;

    let mut form = RenderForm::read(multipart, state.config.max_upload_bytes).await?;
    let image = form.take_image()?;
    let emotion: Emotion = form.emotion.as_deref().unwrap_or("neutral").parse()?;
    let settings = RenderSettings::from_form(&form, &state)?;

    let pending = render_one(&state, image, emotion, settings).await?;
    let response = store_output(&state, settings, pending).await?;
    state.metrics.record_render(response.emotion.as_str());

    Ok(Json(response))
}

/// Render one portrait per requested emotion.
///
/// All-or-nothing: every frame is rendered before any file is written, and a
/// failed write removes the files already written for the batch.
pub async fn render_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchRenderResponse>, ApiError> {
    state.ensure_ready()?;

    let mut form = RenderForm::read(multipart, state.config.max_upload_bytes).await?;
    let image = form.take_image()?;
    let emotions = parse_emotion_list(&form.emotions)?;
    let settings = RenderSettings::from_form(&form, &state)?;

    let start = Instant::now();
    let mut pending = Vec::with_capacity(emotions.len());
    for emotion in emotions {
        pending.push(render_one(&state, Arc::clone(&image), emotion, settings).await?);
    }

    let mut results = Vec::with_capacity(pending.len());
    for output in pending {
        match store_output(&state, settings, output).await {
            Ok(response) => results.push(response),
            Err(e) => {
                discard_outputs(&results).await;
                return Err(e);
            }
        }
    }

    for result in &results {
        state.metrics.record_render(result.emotion.as_str());
    }
    let total_latency_ms = round_ms(start.elapsed().as_secs_f64() * 1000.0);

    info!(
        "Batch render completed: {} images in {}ms",
        results.len(),
        total_latency_ms
    );

    Ok(Json(BatchRenderResponse {
        results,
        total_latency_ms,
    }))
}

async fn render_one(
    state: &AppState,
    image: Arc<[u8]>,
    emotion: Emotion,
    settings: RenderSettings,
) -> Result<PendingOutput, ApiError> {
    let start = Instant::now();
    let parameters = portrait_motion::resolve(emotion, settings.intensity)?;

    let job = RenderJob {
        image,
        emotion,
        intensity: settings.intensity,
        parameters,
        format: settings.format,
        width: settings.width,
        height: settings.height,
    };

    let renderer = Arc::clone(&state.renderer);
    let frame = tokio::task::spawn_blocking(move || render_frame(renderer.as_ref(), &job))
        .await
        .map_err(|e| ApiError::internal(format!("Render task failed: {e}")))??;

    Ok(PendingOutput {
        emotion,
        parameters,
        frame,
        elapsed: start.elapsed(),
    })
}

/// Write a rendered frame as `<uuid>.<ext>` into the output directory
async fn store_output(
    state: &AppState,
    settings: RenderSettings,
    pending: PendingOutput,
) -> Result<RenderResponse, ApiError> {
    let start = Instant::now();
    let filename = format!("{}.{}", Uuid::new_v4(), settings.format.extension());
    let output_path: PathBuf = state.config.output_dir.join(&filename);

    tokio::fs::create_dir_all(&state.config.output_dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create output directory: {e}")))?;
    if let Err(e) = tokio::fs::write(&output_path, &pending.frame.bytes).await {
        let _ = tokio::fs::remove_file(&output_path).await;
        return Err(ApiError::internal(format!("Failed to write output image: {e}")));
    }

    let latency_ms = round_ms((pending.elapsed + start.elapsed()).as_secs_f64() * 1000.0);
    let gpu_used = state.renderer.device() == "cuda";

    info!(
        "Render completed: emotion={}, intensity={}, latency={}ms, gpu={}",
        pending.emotion, settings.intensity, latency_ms, gpu_used
    );

    Ok(RenderResponse {
        output_path: output_path.display().to_string(),
        filename,
        emotion: pending.emotion,
        intensity: settings.intensity,
        latency_ms,
        gpu_used,
        model_version: state.renderer.model_version().to_string(),
        width: pending.frame.width,
        height: pending.frame.height,
        parameters: pending.parameters,
    })
}

async fn discard_outputs(results: &[RenderResponse]) {
    for result in results {
        if let Err(e) = tokio::fs::remove_file(&result.output_path).await {
            warn!("Failed to remove batch output {}: {}", result.output_path, e);
        }
    }
}

/// Intensity form field; `default` when absent
pub fn parse_intensity(raw: Option<&str>, default: f64) -> Result<f64, ApiError> {
    let requested = match raw.map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(
            s.parse::<f64>()
                .map_err(|_| ApiError::bad_request(format!("intensity must be a number, got '{s}'")))?,
        ),
    };
    check_emotion_intensity(requested, default)
}

/// Width/height form field; [`DEFAULT_DIMENSION`] when absent
pub fn parse_dimension(raw: Option<&str>, field: &str) -> Result<u32, ApiError> {
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_DIMENSION),
        Some(s) => s
            .parse::<u32>()
            .map_err(|_| ApiError::bad_request(format!("{field} must be an integer, got '{s}'")))?,
    };

    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        return Err(ApiError::bad_request(format!(
            "{field} must be within [{MIN_DIMENSION}, {MAX_DIMENSION}], got {value}"
        )));
    }
    Ok(value)
}

/// Emotions from repeated and/or comma-separated `emotions` fields
pub fn parse_emotion_list(values: &[String]) -> Result<Vec<Emotion>, ApiError> {
    let emotions = values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Emotion>())
        .collect::<Result<Vec<_>, _>>()?;

    if emotions.is_empty() {
        return Err(ApiError::bad_request("At least one emotion is required"));
    }
    Ok(emotions)
}

fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_intensity() {
        assert_eq!(parse_intensity(None, 0.7).unwrap(), 0.7);
        assert_eq!(parse_intensity(Some(" "), 0.7).unwrap(), 0.7);
        assert_eq!(parse_intensity(Some("0.25"), 0.7).unwrap(), 0.25);
        assert!(parse_intensity(Some("high"), 0.7).is_err());
        assert!(parse_intensity(Some("1.5"), 0.7).is_err());
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension(None, "width").unwrap(), 512);
        assert_eq!(parse_dimension(Some("256"), "width").unwrap(), 256);
        assert_eq!(parse_dimension(Some("1024"), "height").unwrap(), 1024);

        let err = parse_dimension(Some("2048"), "height").unwrap_err();
        assert!(err.message.contains("height"));
        assert!(parse_dimension(Some("255"), "width").is_err());
        assert!(parse_dimension(Some("-1"), "width").is_err());
    }

    #[test]
    fn test_parse_emotion_list() {
        let list = parse_emotion_list(&["happy, sad".to_string(), "angry".to_string()]).unwrap();
        assert_eq!(list, vec![Emotion::Happy, Emotion::Sad, Emotion::Angry]);

        assert!(parse_emotion_list(&[]).is_err());
        assert!(parse_emotion_list(&[" , ".to_string()]).is_err());

        let err = parse_emotion_list(&["happy,bored".to_string()]).unwrap_err();
        assert_eq!(err.message, "Unknown emotion: bored");
    }

    #[test]
    fn test_round_ms() {
        assert_eq!(round_ms(12.3456), 12.35);
        assert_eq!(round_ms(0.0), 0.0);
    }
}
