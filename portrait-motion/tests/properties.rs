//! Behavioural properties of emotion resolution and preset application

use approx::assert_abs_diff_eq;
use portrait_motion::{
    apply, apply_named, mapping_for, resolve, resolve_named, Emotion, KeypointSet, MotionError,
    MotionParameters, PresetName, EMOTION_MAPPINGS,
};

fn fields(p: &MotionParameters) -> [f64; 7] {
    [
        p.rotation_x,
        p.rotation_y,
        p.rotation_z,
        p.expression_scale,
        p.mouth_open,
        p.eye_open,
        p.eyebrow_raise,
    ]
}

/// Keypoints as they come out of the extractor: nothing at the origin
fn extracted_keypoints() -> KeypointSet {
    let rows: Vec<[f64; 3]> = (0..21)
        .map(|i| {
            let t = i as f64 / 20.0;
            [t - 0.5, 0.3 - 0.6 * t, 0.05 * (i % 3) as f64 + 0.01]
        })
        .collect();
    KeypointSet::try_from(rows).unwrap()
}

#[test]
fn test_zero_intensity_returns_neutral_baseline() {
    for emotion in Emotion::ALL.into_iter().filter(|e| *e != Emotion::Neutral) {
        let p = resolve(emotion, 0.0).unwrap();
        assert_eq!(p.mouth_open, 0.0);
        assert_eq!(p.eyebrow_raise, 0.0);
        assert_eq!(p.rotation_x, 0.0);
        assert_eq!(p.rotation_y, 0.0);
        assert_eq!(p.rotation_z, 0.0);
        assert_eq!(p.expression_scale, 1.0);
        assert_eq!(p.eye_open, 1.0);
    }
}

#[test]
fn test_full_intensity_returns_stored_mapping() {
    for emotion in Emotion::ALL {
        let m = mapping_for(emotion).unwrap();
        let p = resolve(emotion, 1.0).unwrap();
        assert_eq!(p.rotation_x, m.rotation_x);
        assert_eq!(p.rotation_y, m.rotation_y);
        assert_eq!(p.rotation_z, m.rotation_z);
        assert_eq!(p.expression_scale, m.expression_scale);
        assert_eq!(p.mouth_open, m.mouth_open);
        assert_eq!(p.eye_open, m.eye_open);
        assert_eq!(p.eyebrow_raise, m.eyebrow_raise);
    }
}

#[test]
fn test_resolution_is_monotonic_in_intensity() {
    let steps: Vec<f64> = (0..=20).map(|i| i as f64 / 20.0).collect();

    for m in &EMOTION_MAPPINGS {
        let start = fields(&MotionParameters::NEUTRAL);
        let end = fields(&m.to_parameters());
        let mut previous = fields(&resolve(m.emotion, 0.0).unwrap());

        for &t in &steps[1..] {
            let current = fields(&resolve(m.emotion, t).unwrap());
            for k in 0..7 {
                if end[k] >= start[k] {
                    assert!(current[k] >= previous[k], "{} field {} at {}", m.emotion, k, t);
                } else {
                    assert!(current[k] <= previous[k], "{} field {} at {}", m.emotion, k, t);
                }
            }
            previous = current;
        }
    }
}

#[test]
fn test_happy_reference_scenario() {
    let p = resolve_named("happy", 0.8).unwrap();
    assert_abs_diff_eq!(p.expression_scale, 1.24, epsilon = 1e-9);
    assert_abs_diff_eq!(p.mouth_open, 0.48, epsilon = 1e-9);
    assert_abs_diff_eq!(p.eye_open, 0.92, epsilon = 1e-9);
    assert_abs_diff_eq!(p.eyebrow_raise, 0.16, epsilon = 1e-9);
    assert_eq!([p.rotation_x, p.rotation_y, p.rotation_z], [0.0; 3]);
}

#[test]
fn test_neutral_preset_is_identity() {
    let keypoints = extracted_keypoints();
    for intensity in [0.0, 0.3, 1.0, 2.0] {
        assert_eq!(apply(&keypoints, PresetName::Neutral, intensity).unwrap(), keypoints);
    }
}

#[test]
fn test_zero_intensity_preset_is_identity_on_extracted_keypoints() {
    let keypoints = extracted_keypoints();
    for preset in PresetName::ALL {
        assert_eq!(apply(&keypoints, preset, 0.0).unwrap(), keypoints, "{}", preset);
    }
}

#[test]
fn test_happy_preset_reference_scenario() {
    let out = apply(&KeypointSet::zeros(), PresetName::Happy, 1.0).unwrap();

    let changed: Vec<usize> = (0..21).filter(|&i| out[i] != [0.0; 3]).collect();
    assert_eq!(changed, vec![12, 13, 14]);

    assert_abs_diff_eq!(out[12][1], -0.04, epsilon = 1e-12);
    assert_abs_diff_eq!(out[13][1], -0.04, epsilon = 1e-12);
    assert_abs_diff_eq!(out[14][1], 0.02, epsilon = 1e-12);
}

#[test]
fn test_presets_only_touch_y() {
    let keypoints = extracted_keypoints();
    for preset in PresetName::ALL {
        let out = apply(&keypoints, preset, 1.7).unwrap();
        for i in 0..21 {
            assert_eq!(out[i][0], keypoints[i][0]);
            assert_eq!(out[i][2], keypoints[i][2]);
        }
    }
}

#[test]
fn test_unknown_names_fail_without_touching_input() {
    let keypoints = extracted_keypoints();
    let before = keypoints;

    assert!(matches!(
        apply_named(&keypoints, "grimace", 1.0),
        Err(MotionError::UnknownPreset(_))
    ));
    assert!(matches!(
        resolve_named("melancholy", 0.5),
        Err(MotionError::UnknownEmotion(_))
    ));
    assert_eq!(keypoints, before);
}

#[test]
fn test_error_messages() {
    let err = resolve_named("bored", 0.1).unwrap_err();
    assert_eq!(err.to_string(), "Unknown emotion: bored");

    let err = apply_named(&KeypointSet::zeros(), "wink", 0.1).unwrap_err();
    assert_eq!(err.to_string(), "Unknown preset: wink");
}
