//! Emotion and expression control for portrait animation
//!
//! Two pure lookups drive the avatar renderer:
//!
//! - [`resolve`] turns an [`Emotion`] and an intensity in `[0, 1]` into
//!   [`MotionParameters`] (head pose, expression scale, mouth, eyes, brows)
//! - [`apply`] moves the implicit [`KeypointSet`] of a face according to a
//!   named [`PresetName`], scaled by an unbounded intensity
//!
//! Both tables are compile-time constants. Neither function keeps state,
//! performs I/O or mutates its input, so they can be called from any thread.
//!
//! # Example
//!
//! ```
//! use portrait_motion::{apply, resolve, Emotion, KeypointSet, PresetName};
//!
//! let params = resolve(Emotion::Happy, 0.8)?;
//! assert!((params.mouth_open - 0.48).abs() < 1e-9);
//!
//! let keypoints = KeypointSet::zeros();
//! let smiling = apply(&keypoints, PresetName::Happy, 1.0)?;
//! assert!(smiling[12][1] < 0.0);
//! # Ok::<(), portrait_motion::MotionError>(())
//! ```

mod emotion;
mod error;
mod keypoints;
mod preset;

pub use emotion::{
    mapping_for, resolve, resolve_named, Emotion, EmotionMapping, MotionParameters,
    EMOTION_MAPPINGS,
};
pub use error::{KeypointShapeError, MotionError, Result};
pub use keypoints::{KeypointSet, NUM_KEYPOINTS};
pub use preset::{apply, apply_named, preset_for, ExpressionPreset, PresetName, EXPRESSION_PRESETS};

/// Lowest intensity accepted for emotion resolution
pub const MIN_EMOTION_INTENSITY: f64 = 0.0;

/// Highest intensity accepted for emotion resolution
pub const MAX_EMOTION_INTENSITY: f64 = 1.0;

/// True when `intensity` is a valid input for [`resolve`]
pub fn is_valid_emotion_intensity(intensity: f64) -> bool {
    (MIN_EMOTION_INTENSITY..=MAX_EMOTION_INTENSITY).contains(&intensity)
}
