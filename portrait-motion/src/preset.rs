//! Named expression presets applied to implicit keypoints
//!
//! A preset is a handful of optional deltas (smile, mouth open, squint, ...).
//! Each delta moves the y-coordinate of a few fixed keypoints by
//! `delta * coefficient * intensity`; x and z are never touched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};
use crate::keypoints::KeypointSet;

/// Supported expression presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Neutral,
    Happy,
    Sad,
    Surprised,
}

impl PresetName {
    pub const ALL: [PresetName; 4] = [
        PresetName::Neutral,
        PresetName::Happy,
        PresetName::Sad,
        PresetName::Surprised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Neutral => "neutral",
            PresetName::Happy => "happy",
            PresetName::Sad => "sad",
            PresetName::Surprised => "surprised",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetName {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        PresetName::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| MotionError::unknown_preset(s.trim()))
    }
}

/// Keypoint deltas for one preset. `None` means the delta has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpressionPreset {
    pub name: PresetName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouth_smile: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouth_open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_squint: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brow_up: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brow_down: Option<f64>,
}

impl ExpressionPreset {
    const fn empty(name: PresetName) -> Self {
        Self {
            name,
            mouth_smile: None,
            mouth_open: None,
            eye_squint: None,
            eye_open: None,
            brow_up: None,
            brow_down: None,
        }
    }

    /// True when no delta is set
    pub fn is_identity(&self) -> bool {
        self.mouth_smile.is_none()
            && self.mouth_open.is_none()
            && self.eye_squint.is_none()
            && self.eye_open.is_none()
            && self.brow_up.is_none()
            && self.brow_down.is_none()
    }
}

/// Fixed preset table, one entry per preset name.
///
/// Happy's 0.4 smile is the reference value. The sad and surprised deltas
/// are chosen for this crate: each stays within [-1, 1] and moves the same
/// features as the matching emotion mapping.
pub const EXPRESSION_PRESETS: [ExpressionPreset; 4] = [
    ExpressionPreset::empty(PresetName::Neutral),
    ExpressionPreset {
        mouth_smile: Some(0.4),
        ..ExpressionPreset::empty(PresetName::Happy)
    },
    ExpressionPreset {
        mouth_smile: Some(-0.3),
        brow_down: Some(0.4),
        ..ExpressionPreset::empty(PresetName::Sad)
    },
    ExpressionPreset {
        mouth_open: Some(0.6),
        eye_open: Some(0.5),
        brow_up: Some(0.5),
        ..ExpressionPreset::empty(PresetName::Surprised)
    },
];

/// One keypoint moved by a delta: `y += coefficient * delta * intensity`
struct Adjustment {
    index: usize,
    coefficient: f64,
}

const fn adj(index: usize, coefficient: f64) -> Adjustment {
    Adjustment { index, coefficient }
}

// Image-space y grows downward, so a negative coefficient raises the point.
static MOUTH_SMILE: [Adjustment; 3] = [adj(12, -0.1), adj(13, -0.1), adj(14, 0.05)];
static MOUTH_OPEN: [Adjustment; 2] = [adj(15, -0.15), adj(16, 0.15)];
static EYE_SQUINT: [Adjustment; 2] = [adj(4, 0.05), adj(5, 0.05)];
static EYE_OPEN: [Adjustment; 2] = [adj(4, -0.05), adj(5, -0.05)];
static BROW_UP: [Adjustment; 2] = [adj(0, -0.1), adj(1, -0.1)];
static BROW_DOWN: [Adjustment; 2] = [adj(0, 0.1), adj(1, 0.1)];

/// Look up the stored preset for a name
pub fn preset_for(name: PresetName) -> Result<&'static ExpressionPreset> {
    EXPRESSION_PRESETS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| MotionError::unknown_preset(name.as_str()))
}

/// Apply a preset to `keypoints`, scaled by `intensity`.
///
/// `intensity` is an unbounded multiplier; values above 1.0 over-drive the
/// expression. `neutral` returns the input unchanged. The caller's set is
/// never modified; a new set is returned.
pub fn apply(keypoints: &KeypointSet, preset: PresetName, intensity: f64) -> Result<KeypointSet> {
    let preset = preset_for(preset)?;
    if preset.is_identity() {
        return Ok(*keypoints);
    }

    let mut out = *keypoints;
    let deltas = [
        (preset.mouth_smile, &MOUTH_SMILE[..]),
        (preset.mouth_open, &MOUTH_OPEN[..]),
        (preset.eye_squint, &EYE_SQUINT[..]),
        (preset.eye_open, &EYE_OPEN[..]),
        (preset.brow_up, &BROW_UP[..]),
        (preset.brow_down, &BROW_DOWN[..]),
    ];

    for (delta, adjustments) in deltas {
        let Some(delta) = delta else { continue };
        for step in adjustments {
            out.shift_y(step.index, delta * step.coefficient * intensity);
        }
    }

    Ok(out)
}

/// [`apply`] for a preset given by name
pub fn apply_named(keypoints: &KeypointSet, name: &str, intensity: f64) -> Result<KeypointSet> {
    apply(keypoints, name.parse()?, intensity)
}
