//! Reference-object calibration.
//!
//! Precondition (documented, not inferred): the reference object of known
//! physical width is placed to the *left* of the subject, so the leftmost
//! qualifying contour is taken to be the reference. Callers must guarantee
//! this placement.

use crate::contour::{find_external_contours, Contour};
use crate::preprocess::{preprocess, PreprocessParams};
use bovimetry_core::{distance, min_area_rect, order_corners, CalibrationContext, GrayImage};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by reference-object calibration.
#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error(
        "no reference contour with area above {min_area} px^2; \
         ensure the reference object is the leftmost item in the frame"
    )]
    ReferenceNotFound { min_area: f64 },

    #[error("reference contour collapsed to a rectangle of zero pixel width")]
    DegenerateReference,

    #[error("reference dimension must be positive, got {value}")]
    InvalidReferenceDimension { value: f64 },
}

fn default_min_contour_area() -> f64 {
    1000.0
}

fn default_reference_dimension() -> f64 {
    30.0
}

/// Settings for reference-object detection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// Contours with shoelace area at or below this threshold are noise.
    #[serde(default = "default_min_contour_area")]
    pub min_contour_area: f64,
    /// Declared physical width of the reference object.
    #[serde(default = "default_reference_dimension")]
    pub reference_dimension: f64,
    #[serde(default)]
    pub preprocess: PreprocessParams,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            min_contour_area: default_min_contour_area(),
            reference_dimension: default_reference_dimension(),
            preprocess: PreprocessParams::default(),
        }
    }
}

/// Calibration result: the context plus the reference rectangle for
/// annotation overlays.
#[derive(Clone, Debug)]
pub struct CalibrationOutcome {
    pub context: CalibrationContext,
    /// Reference rectangle corners, ordered (TL, TR, BR, BL).
    pub corners: [Point2<f64>; 4],
    /// Shoelace area of the selected reference contour, px^2.
    pub contour_area: f64,
}

/// Preprocess a grayscale frame and calibrate from its edge map.
pub fn calibrate(
    gray: &GrayImage,
    params: &CalibrationParams,
) -> Result<CalibrationOutcome, CalibrationError> {
    let pre = preprocess(gray, &params.preprocess);
    calibrate_from_edges(&pre.edges, params)
}

/// Calibrate from an already-computed binary edge map.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(edges, params), fields(width = edges.width, height = edges.height))
)]
pub fn calibrate_from_edges(
    edges: &GrayImage,
    params: &CalibrationParams,
) -> Result<CalibrationOutcome, CalibrationError> {
    if !(params.reference_dimension.is_finite() && params.reference_dimension > 0.0) {
        return Err(CalibrationError::InvalidReferenceDimension {
            value: params.reference_dimension,
        });
    }

    let mut contours: Vec<Contour> = find_external_contours(edges)
        .into_iter()
        .filter(|c| c.area() > params.min_contour_area)
        .collect();
    if contours.is_empty() {
        return Err(CalibrationError::ReferenceNotFound {
            min_area: params.min_contour_area,
        });
    }

    // Left-to-right by bounding-box origin; the leftmost contour is the
    // reference object per the placement precondition.
    contours.sort_by_key(|c| c.bounding_box().0);
    let reference = &contours[0];

    let rect = min_area_rect(&reference.points_f64())
        .ok_or(CalibrationError::DegenerateReference)?;
    let corners = order_corners(rect);

    let pixel_width = distance(&corners[0], &corners[1]);
    if !(pixel_width.is_finite() && pixel_width > 0.0) {
        return Err(CalibrationError::DegenerateReference);
    }

    let pixel_per_unit = pixel_width / params.reference_dimension;
    log::info!(
        "calibrated: reference width {pixel_width:.1} px over {} unit(s) -> {pixel_per_unit:.4} px/unit",
        params.reference_dimension
    );

    Ok(CalibrationOutcome {
        context: CalibrationContext::new(pixel_per_unit, params.reference_dimension),
        corners,
        contour_area: reference.area(),
    })
}
