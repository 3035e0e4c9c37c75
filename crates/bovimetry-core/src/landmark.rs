use serde::{Deserialize, Serialize};

/// Number of indices in the full-body keypoint taxonomy.
pub const LANDMARK_COUNT: usize = 33;

/// Visibility at or below this value marks a landmark as unreliable.
pub const VISIBILITY_THRESHOLD: f64 = 0.5;

/// Indices of the full-body keypoint taxonomy used by the measurements.
pub mod landmark_index {
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
    pub const LEFT_HEEL: usize = 29;
    pub const RIGHT_HEEL: usize = 30;
    pub const LEFT_FOOT_INDEX: usize = 31;
    pub const RIGHT_FOOT_INDEX: usize = 32;
}

/// One skeletal keypoint in pixel space.
///
/// `x`/`y` are pixel coordinates (already scaled from the estimator's
/// normalized output by the image dimensions), `z` is depth relative to the
/// hips, `visibility` is the estimator's confidence in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visibility: f64,
}

/// A possibly partial set of the 33 taxonomy landmarks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    landmarks: Vec<Option<Landmark>>,
}

impl Default for LandmarkSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self {
            landmarks: vec![None; LANDMARK_COUNT],
        }
    }

    /// Store a landmark at a taxonomy index. Returns `false` (and stores
    /// nothing) for indices outside the taxonomy.
    pub fn insert(&mut self, index: usize, landmark: Landmark) -> bool {
        if index >= LANDMARK_COUNT {
            log::warn!("ignoring landmark with out-of-taxonomy index {index}");
            return false;
        }
        self.landmarks[index] = Some(landmark);
        true
    }

    /// Landmark at `index`, regardless of visibility.
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)?.as_ref()
    }

    /// Landmark at `index` if it is present *and* reliable.
    ///
    /// Absence or `visibility <= 0.5` both read as missing; every
    /// measurement applies this rule.
    pub fn visible(&self, index: usize) -> Option<&Landmark> {
        self.get(index)
            .filter(|lm| lm.visibility > VISIBILITY_THRESHOLD)
    }

    /// Iterate present landmarks with their taxonomy index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Landmark)> {
        self.landmarks
            .iter()
            .enumerate()
            .filter_map(|(i, lm)| lm.as_ref().map(|lm| (i, lm)))
    }

    /// Iterate reliable landmarks only.
    pub fn iter_visible(&self) -> impl Iterator<Item = (usize, &Landmark)> {
        self.iter()
            .filter(|(_, lm)| lm.visibility > VISIBILITY_THRESHOLD)
    }

    /// Number of present landmarks.
    pub fn len(&self) -> usize {
        self.landmarks.iter().filter(|lm| lm.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lm(x: f64, y: f64, visibility: f64) -> Landmark {
        Landmark {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    #[test]
    fn visibility_threshold_filters_landmarks() {
        let mut set = LandmarkSet::new();
        set.insert(landmark_index::LEFT_SHOULDER, lm(10.0, 20.0, 0.9));
        set.insert(landmark_index::RIGHT_SHOULDER, lm(30.0, 20.0, 0.5));

        assert!(set.visible(landmark_index::LEFT_SHOULDER).is_some());
        // Exactly at the threshold is still unreliable.
        assert!(set.visible(landmark_index::RIGHT_SHOULDER).is_none());
        assert!(set.get(landmark_index::RIGHT_SHOULDER).is_some());
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter_visible().count(), 1);
    }

    #[test]
    fn out_of_taxonomy_index_is_rejected() {
        let mut set = LandmarkSet::new();
        assert!(!set.insert(LANDMARK_COUNT, lm(0.0, 0.0, 1.0)));
        assert!(set.is_empty());
    }
}
