//! Implicit facial keypoints produced by the motion extractor

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::KeypointShapeError;

/// Number of implicit keypoints per face
pub const NUM_KEYPOINTS: usize = 21;

/// Ordered set of 21 `(x, y, z)` keypoints.
///
/// Serializes as a list of `[x, y, z]` rows; deserializing any other row
/// count fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f64; 3]>", into = "Vec<[f64; 3]>")]
pub struct KeypointSet {
    points: [[f64; 3]; NUM_KEYPOINTS],
}

impl KeypointSet {
    pub fn new(points: [[f64; 3]; NUM_KEYPOINTS]) -> Self {
        Self { points }
    }

    /// All keypoints at the origin
    pub fn zeros() -> Self {
        Self::new([[0.0; 3]; NUM_KEYPOINTS])
    }

    pub fn points(&self) -> &[[f64; 3]; NUM_KEYPOINTS] {
        &self.points
    }

    pub fn len(&self) -> usize {
        NUM_KEYPOINTS
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over keypoints in order
    pub fn iter(&self) -> impl Iterator<Item = &[f64; 3]> {
        self.points.iter()
    }

    /// Add `delta` to the y-coordinate of keypoint `index`
    pub(crate) fn shift_y(&mut self, index: usize, delta: f64) {
        self.points[index][1] += delta;
    }
}

impl Default for KeypointSet {
    fn default() -> Self {
        Self::zeros()
    }
}

impl Index<usize> for KeypointSet {
    type Output = [f64; 3];

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl IndexMut<usize> for KeypointSet {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl TryFrom<Vec<[f64; 3]>> for KeypointSet {
    type Error = KeypointShapeError;

    fn try_from(rows: Vec<[f64; 3]>) -> Result<Self, Self::Error> {
        let actual = rows.len();
        let points: [[f64; 3]; NUM_KEYPOINTS] = rows.try_into().map_err(|_| KeypointShapeError {
            expected: NUM_KEYPOINTS,
            actual,
        })?;
        Ok(Self { points })
    }
}

impl From<KeypointSet> for Vec<[f64; 3]> {
    fn from(set: KeypointSet) -> Self {
        set.points.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_rejects_wrong_row_count() {
        let err = KeypointSet::try_from(vec![[0.0; 3]; 20]).unwrap_err();
        assert_eq!(err, KeypointShapeError { expected: 21, actual: 20 });

        assert!(KeypointSet::try_from(Vec::new()).is_err());
        assert!(KeypointSet::try_from(vec![[1.0, 2.0, 3.0]; 21]).is_ok());
    }

    #[test]
    fn test_json_shape() {
        let mut set = KeypointSet::zeros();
        set[3] = [0.1, -0.2, 0.3];

        let json = serde_json::to_value(set).unwrap();
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 21);
        assert_eq!(rows[3], serde_json::json!([0.1, -0.2, 0.3]));

        let parsed: KeypointSet = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_json_rejects_short_input() {
        let json = serde_json::json!([[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        let err = serde_json::from_value::<KeypointSet>(json).unwrap_err();
        assert!(err.to_string().contains("Expected 21 keypoints, got 2"));
    }
}
