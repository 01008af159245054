//! Emotion to motion parameter mapping
//!
//! Each [`Emotion`] has one fixed [`EmotionMapping`] describing the head pose and
//! facial expression at full strength. [`resolve`] blends between the neutral
//! baseline and that mapping according to an intensity in `[0, 1]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};

/// Supported emotions for avatar rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Surprised,
    Angry,
    Disgusted,
    Fearful,
}

impl Emotion {
    /// Every emotion, in declaration order
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprised,
        Emotion::Angry,
        Emotion::Disgusted,
        Emotion::Fearful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprised => "surprised",
            Emotion::Angry => "angry",
            Emotion::Disgusted => "disgusted",
            Emotion::Fearful => "fearful",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == name)
            .ok_or_else(|| MotionError::unknown_emotion(s.trim()))
    }
}

/// Full-strength head pose and expression for one emotion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmotionMapping {
    pub emotion: Emotion,
    /// Head rotation, X axis, in [-1, 1]
    pub rotation_x: f64,
    /// Head rotation, Y axis, in [-1, 1]
    pub rotation_y: f64,
    /// Head rotation, Z axis, in [-1, 1]
    pub rotation_z: f64,
    /// Expression intensity scale, in [0, 2]
    pub expression_scale: f64,
    /// Mouth openness, in [0, 1]
    pub mouth_open: f64,
    /// Eye openness, in [0, 1]
    pub eye_open: f64,
    /// Eyebrow position, -1 = down, 1 = up
    pub eyebrow_raise: f64,
}

impl EmotionMapping {
    /// True when every field lies within its declared range
    pub fn is_within_bounds(&self) -> bool {
        let signed = -1.0..=1.0;
        let unit = 0.0..=1.0;

        signed.contains(&self.rotation_x)
            && signed.contains(&self.rotation_y)
            && signed.contains(&self.rotation_z)
            && (0.0..=2.0).contains(&self.expression_scale)
            && unit.contains(&self.mouth_open)
            && unit.contains(&self.eye_open)
            && signed.contains(&self.eyebrow_raise)
    }

    /// Parameters at full intensity
    pub fn to_parameters(&self) -> MotionParameters {
        MotionParameters {
            rotation_x: self.rotation_x,
            rotation_y: self.rotation_y,
            rotation_z: self.rotation_z,
            expression_scale: self.expression_scale,
            mouth_open: self.mouth_open,
            eye_open: self.eye_open,
            eyebrow_raise: self.eyebrow_raise,
        }
    }
}

/// Motion parameters handed to the animation backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParameters {
    pub rotation_x: f64,
    pub rotation_y: f64,
    pub rotation_z: f64,
    pub expression_scale: f64,
    pub mouth_open: f64,
    pub eye_open: f64,
    pub eyebrow_raise: f64,
}

impl MotionParameters {
    /// Identity transform: no rotation, unscaled expression, closed mouth, open eyes
    pub const NEUTRAL: MotionParameters = MotionParameters {
        rotation_x: 0.0,
        rotation_y: 0.0,
        rotation_z: 0.0,
        expression_scale: 1.0,
        mouth_open: 0.0,
        eye_open: 1.0,
        eyebrow_raise: 0.0,
    };
}

impl Default for MotionParameters {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

const fn mapping(
    emotion: Emotion,
    rotation: [f64; 3],
    expression_scale: f64,
    mouth_open: f64,
    eye_open: f64,
    eyebrow_raise: f64,
) -> EmotionMapping {
    EmotionMapping {
        emotion,
        rotation_x: rotation[0],
        rotation_y: rotation[1],
        rotation_z: rotation[2],
        expression_scale,
        mouth_open,
        eye_open,
        eyebrow_raise,
    }
}

/// Fixed mapping table, one entry per emotion
pub const EMOTION_MAPPINGS: [EmotionMapping; 7] = [
    mapping(Emotion::Neutral, [0.0, 0.0, 0.0], 1.0, 0.0, 1.0, 0.0),
    mapping(Emotion::Happy, [0.0, 0.0, 0.0], 1.3, 0.6, 0.9, 0.2),
    mapping(Emotion::Sad, [0.15, 0.0, 0.0], 1.0, 0.0, 0.7, -0.5),
    mapping(Emotion::Surprised, [-0.1, 0.0, 0.0], 1.5, 0.8, 1.0, 0.8),
    mapping(Emotion::Angry, [-0.1, 0.0, 0.0], 1.2, 0.3, 0.8, -0.7),
    mapping(Emotion::Disgusted, [0.1, -0.2, 0.0], 1.1, 0.2, 0.6, -0.3),
    mapping(Emotion::Fearful, [0.0, 0.0, 0.0], 1.2, 0.4, 1.0, 0.6),
];

/// Look up the stored mapping for an emotion
pub fn mapping_for(emotion: Emotion) -> Result<&'static EmotionMapping> {
    EMOTION_MAPPINGS
        .iter()
        .find(|m| m.emotion == emotion)
        .ok_or_else(|| MotionError::unknown_emotion(emotion.as_str()))
}

/// Blend the neutral baseline toward `emotion` at the given intensity.
///
/// `intensity` is expected in `[0, 1]`. The range is not checked here; the
/// request boundary rejects out-of-range values before calling.
///
/// At intensity 0 the result is [`MotionParameters::NEUTRAL`]; at intensity 1
/// it equals the stored mapping.
pub fn resolve(emotion: Emotion, intensity: f64) -> Result<MotionParameters> {
    let m = mapping_for(emotion)?;

    Ok(MotionParameters {
        rotation_x: m.rotation_x * intensity,
        rotation_y: m.rotation_y * intensity,
        rotation_z: m.rotation_z * intensity,
        expression_scale: 1.0 + (m.expression_scale - 1.0) * intensity,
        mouth_open: m.mouth_open * intensity,
        eye_open: 1.0 - (1.0 - m.eye_open) * intensity,
        eyebrow_raise: m.eyebrow_raise * intensity,
    })
}

/// [`resolve`] for an emotion given by name
pub fn resolve_named(name: &str, intensity: f64) -> Result<MotionParameters> {
    resolve(name.parse()?, intensity)
}
