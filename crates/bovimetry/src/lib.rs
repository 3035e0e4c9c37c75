//! Single-photo livestock body measurement.
//!
//! The pipeline combines a pixel-to-length calibration, derived from a
//! reference object of known physical width placed left of the subject,
//! with skeletal keypoints from an external pose-estimation backend, and
//! derives five morphometric quantities: total height, wither height,
//! chest width, rump angle and body length.
//!
//! ## Quickstart
//!
//! ```no_run
//! use bovimetry::pipeline::{MeasurementPipeline, PipelineParams};
//! use bovimetry::pose::JsonPoseProvider;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pose = JsonPoseProvider::load_json("pose.json")?;
//! let pipeline = MeasurementPipeline::new(PipelineParams::default(), pose);
//!
//! let outcome = pipeline.measure_path("cattle.jpg")?;
//! println!("chest width: {} units", outcome.result.chest_width);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - [`preprocess`]: blur + Canny + morphological cleanup into an edge map.
//! - [`contour`]: external contour extraction from the edge map.
//! - [`calibrate`]: leftmost-contour reference calibration.
//! - [`pose`]: the narrow interface to the pose-estimation collaborator.
//! - [`measure`]: the five pure measurement functions.
//! - [`pipeline`]: fail-fast orchestration into a `MeasurementResult`.
//! - [`annotate`] / [`report`]: overlay rendering and JSON records.

pub use bovimetry_core as core;

pub mod annotate;
pub mod calibrate;
pub mod contour;
pub mod measure;
pub mod pipeline;
pub mod pose;
pub mod preprocess;
pub mod report;

pub use calibrate::{CalibrationError, CalibrationParams};
pub use measure::{MeasureError, Measurements};
pub use pipeline::{MeasurementOutcome, MeasurementPipeline, PipelineError, PipelineParams};
pub use pose::{JsonPoseProvider, PoseEstimator, PoseEstimatorError};
pub use report::{MeasurementResult, MeasurementStatus};

pub use bovimetry_core::{CalibrationContext, GrayImage, Landmark, LandmarkSet};
