//! Narrow interface to the external pose-estimation collaborator.
//!
//! The pipeline never runs a pose model itself; it consumes the stable
//! output shape (33 indexed landmarks with normalized coordinates, depth and
//! visibility) through the [`PoseEstimator`] trait. "No pose found" is an
//! explicit `Ok(None)`, which the orchestrator turns into a fail-fast
//! pipeline error.

use bovimetry_core::{GrayImage, Landmark, LandmarkSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Provider-side failures (I/O, malformed payloads). Distinct from "the
/// provider ran fine and found no pose".
#[derive(thiserror::Error, Debug)]
pub enum PoseEstimatorError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Capability of producing a landmark set for a frame.
///
/// Implementations holding an expensive stateful model resource should
/// acquire it once and share it read-only (or pool it per worker when the
/// backend is not thread-safe); the pipeline only borrows `self`.
pub trait PoseEstimator {
    /// Detect skeletal landmarks on a frame. `Ok(None)` means no pose was
    /// found at all, which aborts the measurement request.
    fn detect(&self, image: &GrayImage) -> Result<Option<LandmarkSet>, PoseEstimatorError>;
}

/// One landmark as emitted by the external model: coordinates normalized to
/// `[0, 1]` of the frame, depth relative to the hips, visibility in
/// `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLandmark {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub visibility: f64,
}

/// Scale normalized landmarks into pixel space by the frame dimensions.
pub fn to_pixel_landmarks(
    normalized: &[NormalizedLandmark],
    width: usize,
    height: usize,
) -> LandmarkSet {
    let mut set = LandmarkSet::new();
    for nl in normalized {
        set.insert(
            nl.index,
            Landmark {
                x: nl.x * width as f64,
                y: nl.y * height as f64,
                z: nl.z,
                visibility: nl.visibility,
            },
        );
    }
    set
}

/// Pose provider backed by a JSON file of normalized landmarks, standing in
/// for the external model process at the CLI boundary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JsonPoseProvider {
    pub landmarks: Vec<NormalizedLandmark>,
}

impl JsonPoseProvider {
    /// Load a landmark frame from a JSON array on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PoseEstimatorError> {
        let raw = fs::read_to_string(path)?;
        let landmarks: Vec<NormalizedLandmark> = serde_json::from_str(&raw)?;
        Ok(Self { landmarks })
    }
}

impl PoseEstimator for JsonPoseProvider {
    fn detect(&self, image: &GrayImage) -> Result<Option<LandmarkSet>, PoseEstimatorError> {
        if self.landmarks.is_empty() {
            return Ok(None);
        }
        Ok(Some(to_pixel_landmarks(
            &self.landmarks,
            image.width,
            image.height,
        )))
    }
}
