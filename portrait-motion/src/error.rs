//! Error types for motion and preset resolution

use thiserror::Error;

/// Result type for motion operations
pub type Result<T> = std::result::Result<T, MotionError>;

/// Errors raised when a caller names something outside the closed enumerations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MotionError {
    /// Emotion identifier has no mapping
    #[error("Unknown emotion: {0}")]
    UnknownEmotion(String),

    /// Preset name has no definition
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

impl MotionError {
    pub fn unknown_emotion<S: Into<String>>(name: S) -> Self {
        Self::UnknownEmotion(name.into())
    }

    pub fn unknown_preset<S: Into<String>>(name: S) -> Self {
        Self::UnknownPreset(name.into())
    }
}

/// Keypoint input did not have the expected number of rows
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Expected {expected} keypoints, got {actual}")]
pub struct KeypointShapeError {
    pub expected: usize,
    pub actual: usize,
}
