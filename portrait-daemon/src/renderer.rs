//! Portrait renderer boundary
//!
//! The animation model itself is an external collaborator. The daemon talks to
//! it through [`PortraitRenderer`]: [`render_frame`] decodes the uploaded
//! portrait, resizes it to the requested size, hands the frame and the
//! resolved motion parameters to the backend, and encodes whatever comes back.

use std::fmt;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::{imageops::FilterType, DynamicImage, ImageFormat, Rgb, RgbImage};
use portrait_motion::{Emotion, MotionParameters};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Smallest accepted output width/height
pub const MIN_DIMENSION: u32 = 256;
/// Largest accepted output width/height
pub const MAX_DIMENSION: u32 = 1024;
/// Output width/height when a request omits it
pub const DEFAULT_DIMENSION: u32 = 512;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Renderer not ready")]
    NotReady,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Encoding error: {0}")]
    Encode(String),
}

impl RenderError {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }
}

/// Image formats the renderer can write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpg,
    Webp,
}

impl OutputFormat {
    /// Parse a format name; "jpeg" is accepted as "jpg"
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "webp" => Ok(Self::Webp),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpg => ImageFormat::Jpeg,
            Self::Webp => ImageFormat::WebP,
        }
    }

    /// Format implied by a file name's extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::parse(ext).ok()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One render request handed to the backend
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Encoded source portrait, shared across a batch
    pub image: Arc<[u8]>,
    pub emotion: Emotion,
    pub intensity: f64,
    pub parameters: MotionParameters,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

/// Encoded output image and its actual size
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Portrait-animation backend
pub trait PortraitRenderer: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Device the backend runs on ("cuda" or "cpu")
    fn device(&self) -> &str;

    fn model_version(&self) -> &str;

    fn is_ready(&self) -> bool;

    /// Apply the job's motion parameters to a decoded, resized RGB frame.
    /// Blocking; call from a blocking-capable thread.
    fn animate(&self, source: RgbImage, job: &RenderJob) -> Result<RgbImage>;

    /// Release backend resources; the renderer is not ready afterwards
    fn cleanup(&self) {}
}

/// Decode, resize, animate and encode one job.
///
/// Blocking; call from a blocking-capable thread.
pub fn render_frame(renderer: &dyn PortraitRenderer, job: &RenderJob) -> Result<RenderedFrame> {
    if !renderer.is_ready() {
        return Err(RenderError::NotReady);
    }

    let source = decode_source(&job.image)?;
    let source = if source.dimensions() == (job.width, job.height) {
        source
    } else {
        image::imageops::resize(&source, job.width, job.height, FilterType::Lanczos3)
    };

    let output = renderer.animate(source, job)?;
    let (width, height) = output.dimensions();
    let bytes = encode_frame(output, job.format)?;

    Ok(RenderedFrame {
        bytes,
        width,
        height,
    })
}

/// Decode an uploaded portrait into RGB, dropping any alpha channel
pub fn decode_source(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(RenderError::invalid_input("source image is empty"));
    }
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| RenderError::invalid_input(format!("source image could not be decoded: {e}")))?;
    Ok(decoded.to_rgb8())
}

pub fn encode_frame(frame: RgbImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(frame)
        .write_to(&mut out, format.image_format())
        .map_err(|e| RenderError::Encode(format!("{format}: {e}")))?;
    Ok(out.into_inner())
}

/// Reference backend that returns the source frame unchanged.
///
/// Stands in for the animation model until one is wired in. Decoding,
/// resizing and encoding around it behave exactly as for a real backend.
pub struct PassthroughRenderer {
    device: String,
    model_version: String,
    ready: AtomicBool,
}

impl PassthroughRenderer {
    pub fn new(device: impl Into<String>, model_version: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            model_version: model_version.into(),
            ready: AtomicBool::new(true),
        }
    }
}

impl PortraitRenderer for PassthroughRenderer {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn device(&self) -> &str {
        &self.device
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn animate(&self, source: RgbImage, _job: &RenderJob) -> Result<RgbImage> {
        if !self.is_ready() {
            return Err(RenderError::NotReady);
        }
        Ok(source)
    }

    fn cleanup(&self) {
        self.ready.store(false, Ordering::Release);
    }
}

/// Run one neutral render so the first real request does not pay start-up cost.
///
/// Failure is logged and otherwise ignored.
pub fn warm_up(renderer: &dyn PortraitRenderer) {
    info!("Warming up {} renderer...", renderer.name());

    let grey = RgbImage::from_pixel(DEFAULT_DIMENSION, DEFAULT_DIMENSION, Rgb([128, 128, 128]));
    let result = encode_frame(grey, OutputFormat::Png).and_then(|image| {
        let job = RenderJob {
            image: Arc::from(image),
            emotion: Emotion::Neutral,
            intensity: 0.5,
            parameters: MotionParameters::NEUTRAL,
            format: OutputFormat::Png,
            width: DEFAULT_DIMENSION,
            height: DEFAULT_DIMENSION,
        };
        render_frame(renderer, &job)
    });

    match result {
        Ok(_) => info!("Renderer warmup complete"),
        Err(e) => warn!("Warmup failed (non-critical): {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let frame = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        encode_frame(frame, OutputFormat::Png).unwrap()
    }

    fn job(image: Vec<u8>, format: OutputFormat, width: u32, height: u32) -> RenderJob {
        RenderJob {
            image: Arc::from(image),
            emotion: Emotion::Happy,
            intensity: 0.7,
            parameters: portrait_motion::resolve(Emotion::Happy, 0.7).unwrap(),
            format,
            width,
            height,
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("PNG").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::parse("jpeg").unwrap(), OutputFormat::Jpg);
        assert_eq!(OutputFormat::parse("webp").unwrap(), OutputFormat::Webp);
        assert!(matches!(
            OutputFormat::parse("bmp"),
            Err(RenderError::UnsupportedFormat(f)) if f == "bmp"
        ));
    }

    #[test]
    fn test_output_format_from_filename() {
        assert_eq!(OutputFormat::from_filename("a.jpg"), Some(OutputFormat::Jpg));
        assert_eq!(OutputFormat::from_filename("a.b.webp"), Some(OutputFormat::Webp));
        assert_eq!(OutputFormat::from_filename("noext"), None);
        assert_eq!(OutputFormat::Jpg.content_type(), "image/jpeg");
    }

    #[test]
    fn test_render_resizes_and_encodes() {
        let renderer = PassthroughRenderer::new("cpu", "1.0.0");

        for format in [OutputFormat::Png, OutputFormat::Jpg, OutputFormat::Webp] {
            let frame = render_frame(&renderer, &job(png(300, 400), format, 640, 256)).unwrap();
            assert_eq!((frame.width, frame.height), (640, 256));

            assert_eq!(image::guess_format(&frame.bytes).unwrap(), format.image_format());
            let decoded = image::load_from_memory(&frame.bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (640, 256));
        }
    }

    #[test]
    fn test_render_keeps_matching_size() {
        let renderer = PassthroughRenderer::new("cpu", "1.0.0");
        let source = png(256, 256);

        let frame = render_frame(&renderer, &job(source.clone(), OutputFormat::Png, 256, 256)).unwrap();
        let expected = image::load_from_memory(&source).unwrap().to_rgb8();
        let actual = image::load_from_memory(&frame.bytes).unwrap().to_rgb8();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_render_rejects_undecodable_input() {
        let renderer = PassthroughRenderer::new("cpu", "1.0.0");

        for bytes in [Vec::new(), b"this is not an image at all".to_vec()] {
            assert!(matches!(
                render_frame(&renderer, &job(bytes, OutputFormat::Png, 512, 512)),
                Err(RenderError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_cleanup_marks_not_ready() {
        let renderer = PassthroughRenderer::new("cuda", "1.0.0");
        assert!(renderer.is_ready());
        renderer.cleanup();
        assert!(!renderer.is_ready());
        assert!(matches!(
            render_frame(&renderer, &job(png(256, 256), OutputFormat::Png, 256, 256)),
            Err(RenderError::NotReady)
        ));
    }

    #[test]
    fn test_warm_up_tolerates_failure() {
        let renderer = PassthroughRenderer::new("cpu", "1.0.0");
        warm_up(&renderer);

        renderer.cleanup();
        // Must not panic
        warm_up(&renderer);
    }
}
