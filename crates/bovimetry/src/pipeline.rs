//! Measurement orchestrator.
//!
//! Linear, fail-fast sequence: calibrate -> detect landmarks -> compute the
//! five measurements -> assemble the record. Any step failure aborts the
//! request; a partially populated record is never returned. The pipeline
//! object holds only immutable parameters and the pose-estimator handle —
//! per-request state (the calibration context, the landmark set) lives in
//! values threaded through this function, so concurrent requests against
//! one pipeline cannot contaminate each other.

use crate::calibrate::{calibrate_from_edges, CalibrationError, CalibrationParams};
use crate::measure::{measure_all, MeasureError};
use crate::pose::{PoseEstimator, PoseEstimatorError};
use crate::preprocess::preprocess;
use crate::report::MeasurementResult;
use bovimetry_core::{GrayImage, LandmarkSet};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors that abort a measurement request.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("could not load the source image")]
    ImageLoad(#[from] image::ImageError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error("no skeletal landmarks found; ensure the animal is clearly visible")]
    PoseNotFound,

    #[error(transparent)]
    Pose(#[from] PoseEstimatorError),

    #[error(transparent)]
    Measure(#[from] MeasureError),
}

/// All tunables of one pipeline instance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PipelineParams {
    #[serde(default)]
    pub calibration: CalibrationParams,
}

/// Everything a successful run produces. The annotator consumes this
/// directly instead of re-deriving landmarks or calibration.
#[derive(Clone, Debug)]
pub struct MeasurementOutcome {
    pub result: MeasurementResult,
    pub landmarks: LandmarkSet,
    /// Reference rectangle corners (TL, TR, BR, BL), for overlays.
    pub reference_corners: [Point2<f64>; 4],
}

/// The measurement pipeline, generic over the pose-estimation backend.
pub struct MeasurementPipeline<P> {
    params: PipelineParams,
    estimator: P,
}

impl<P: PoseEstimator> MeasurementPipeline<P> {
    pub fn new(params: PipelineParams, estimator: P) -> Self {
        Self { params, estimator }
    }

    #[inline]
    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Run the full pipeline on a decoded RGB frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width(), height = image.height()))
    )]
    pub fn measure(
        &self,
        image: &image::RgbImage,
    ) -> Result<MeasurementOutcome, PipelineError> {
        let gray = gray_from_rgb(image);

        let pre = preprocess(&gray, &self.params.calibration.preprocess);
        let calibration = calibrate_from_edges(&pre.edges, &self.params.calibration)?;

        let landmarks = self
            .estimator
            .detect(&gray)?
            .ok_or(PipelineError::PoseNotFound)?;
        log::debug!("pose detected: {} landmark(s)", landmarks.len());

        let measurements = measure_all(&landmarks, &calibration.context)?;
        let result = MeasurementResult::assemble(
            image.width(),
            image.height(),
            &measurements,
            &calibration.context,
        );

        Ok(MeasurementOutcome {
            result,
            landmarks,
            reference_corners: calibration.corners,
        })
    }

    /// Convenience wrapper: decode an image from disk, then measure.
    pub fn measure_path(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<MeasurementOutcome, PipelineError> {
        let rgb = image::open(path)?.to_rgb8();
        self.measure(&rgb)
    }
}

/// Convert a decoded RGB frame into the pipeline's grayscale buffer.
pub fn gray_from_rgb(image: &image::RgbImage) -> GrayImage {
    let luma = image::imageops::grayscale(image);
    let (w, h) = (luma.width() as usize, luma.height() as usize);
    // The buffer length is w*h by construction.
    GrayImage {
        width: w,
        height: h,
        data: luma.into_raw(),
    }
}
