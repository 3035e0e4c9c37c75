//! Morphometric calculator: pure functions from `(LandmarkSet,
//! CalibrationContext)` to physical measurements.
//!
//! Every function applies the same reliability rule: a landmark that is
//! absent or has visibility at or below 0.5 reads as missing, and a missing
//! required landmark yields exactly `0.0` (never NaN, never a stale value).
//! All measurements except the rump angle divide by the calibration ratio
//! and therefore refuse to run against an uncalibrated context.

use bovimetry_core::{
    distance, landmark_index as idx, midpoint, CalibrationContext, LandmarkSet,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Contract errors of the measurement functions.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureError {
    /// A unit-dependent measurement was invoked before calibration. This is
    /// a programming error in the caller, not a data error.
    #[error("measurement requested against an uncalibrated context (pixel_per_unit must be finite and positive)")]
    NotCalibrated,
}

/// The five derived quantities, in the unit of the reference dimension
/// (degrees for the rump angle).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub total_height: f64,
    pub wither_height: f64,
    pub chest_width: f64,
    pub rump_angle: f64,
    pub body_length: f64,
}

fn require_calibrated(context: &CalibrationContext) -> Result<f64, MeasureError> {
    if context.is_calibrated() {
        Ok(context.pixel_per_unit)
    } else {
        Err(MeasureError::NotCalibrated)
    }
}

#[inline]
fn point(lm: &bovimetry_core::Landmark) -> Point2<f64> {
    Point2::new(lm.x, lm.y)
}

/// Vertical span of all reliable landmarks.
///
/// Fewer than two reliable points give no span: 0.0.
pub fn total_height(
    landmarks: &LandmarkSet,
    context: &CalibrationContext,
) -> Result<f64, MeasureError> {
    let pixel_per_unit = require_calibrated(context)?;

    let mut count = 0usize;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (_, lm) in landmarks.iter_visible() {
        count += 1;
        min_y = min_y.min(lm.y);
        max_y = max_y.max(lm.y);
    }
    if count < 2 {
        return Ok(0.0);
    }
    Ok((max_y - min_y) / pixel_per_unit)
}

/// Vertical distance from the shoulder line to the lowest reliable
/// ground-contact landmark (ankles, heels, foot tips).
pub fn wither_height(
    landmarks: &LandmarkSet,
    context: &CalibrationContext,
) -> Result<f64, MeasureError> {
    let pixel_per_unit = require_calibrated(context)?;

    let (Some(left), Some(right)) = (
        landmarks.visible(idx::LEFT_SHOULDER),
        landmarks.visible(idx::RIGHT_SHOULDER),
    ) else {
        return Ok(0.0);
    };
    let shoulder_y = (left.y + right.y) / 2.0;

    let bottom_y = (idx::LEFT_ANKLE..=idx::RIGHT_FOOT_INDEX)
        .filter_map(|i| landmarks.visible(i))
        .map(|lm| lm.y)
        .fold(f64::NEG_INFINITY, f64::max);
    if bottom_y == f64::NEG_INFINITY {
        return Ok(0.0);
    }

    Ok((bottom_y - shoulder_y) / pixel_per_unit)
}

/// Euclidean distance between the two shoulder landmarks.
pub fn chest_width(
    landmarks: &LandmarkSet,
    context: &CalibrationContext,
) -> Result<f64, MeasureError> {
    let pixel_per_unit = require_calibrated(context)?;

    let (Some(left), Some(right)) = (
        landmarks.visible(idx::LEFT_SHOULDER),
        landmarks.visible(idx::RIGHT_SHOULDER),
    ) else {
        return Ok(0.0);
    };
    Ok(distance(&point(left), &point(right)) / pixel_per_unit)
}

/// Heuristic rump angle in degrees.
///
/// A tail-base point is approximated at the hip midpoint shifted downward
/// by 30% of the hip-to-ankle vertical span, and the angle of the
/// hip-to-tail vector is measured against the horizontal. The vector has
/// zero horizontal component by construction, and the `dx == 0` branch
/// deliberately reports an angle of 0 before folding around 90 degrees —
/// this reproduces the field-calibrated formula and is an approximation,
/// not a geometric identity; it also discards the sign of the slope.
/// Purely a ratio of pixel offsets, so no calibration is needed.
pub fn rump_angle(landmarks: &LandmarkSet) -> f64 {
    let (Some(left_hip), Some(right_hip)) = (
        landmarks.visible(idx::LEFT_HIP),
        landmarks.visible(idx::RIGHT_HIP),
    ) else {
        return 0.0;
    };
    let (Some(left_ankle), Some(right_ankle)) = (
        landmarks.visible(idx::LEFT_ANKLE),
        landmarks.visible(idx::RIGHT_ANKLE),
    ) else {
        return 0.0;
    };

    let hip_mid = midpoint(&point(left_hip), &point(right_hip));
    let ankle_mid_y = (left_ankle.y + right_ankle.y) / 2.0;

    let tail_base_x = hip_mid.x;
    let tail_base_y = hip_mid.y + (hip_mid.y - ankle_mid_y).abs() * 0.3;

    let dx = tail_base_x - hip_mid.x;
    let dy = tail_base_y - hip_mid.y;
    let angle_deg = if dx == 0.0 {
        0.0
    } else {
        dy.atan2(dx).to_degrees().abs()
    };

    if angle_deg < 90.0 {
        90.0 - angle_deg
    } else {
        angle_deg - 90.0
    }
}

/// Euclidean distance between the shoulder midpoint and the hip midpoint.
pub fn body_length(
    landmarks: &LandmarkSet,
    context: &CalibrationContext,
) -> Result<f64, MeasureError> {
    let pixel_per_unit = require_calibrated(context)?;

    let (Some(ls), Some(rs), Some(lh), Some(rh)) = (
        landmarks.visible(idx::LEFT_SHOULDER),
        landmarks.visible(idx::RIGHT_SHOULDER),
        landmarks.visible(idx::LEFT_HIP),
        landmarks.visible(idx::RIGHT_HIP),
    ) else {
        return Ok(0.0);
    };

    let shoulder_mid = midpoint(&point(ls), &point(rs));
    let hip_mid = midpoint(&point(lh), &point(rh));
    Ok(distance(&shoulder_mid, &hip_mid) / pixel_per_unit)
}

/// Compute all five measurements against one calibration context.
pub fn measure_all(
    landmarks: &LandmarkSet,
    context: &CalibrationContext,
) -> Result<Measurements, MeasureError> {
    Ok(Measurements {
        total_height: total_height(landmarks, context)?,
        wither_height: wither_height(landmarks, context)?,
        chest_width: chest_width(landmarks, context)?,
        rump_angle: rump_angle(landmarks),
        body_length: body_length(landmarks, context)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bovimetry_core::Landmark;

    fn lm(x: f64, y: f64, visibility: f64) -> Landmark {
        Landmark {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    /// Shoulders at (100,200)/(300,200), hips at (120,400)/(280,400),
    /// ankles at (130,460)/(270,460): the reference scenario.
    fn scenario() -> LandmarkSet {
        let mut set = LandmarkSet::new();
        set.insert(idx::LEFT_SHOULDER, lm(100.0, 200.0, 1.0));
        set.insert(idx::RIGHT_SHOULDER, lm(300.0, 200.0, 1.0));
        set.insert(idx::LEFT_HIP, lm(120.0, 400.0, 1.0));
        set.insert(idx::RIGHT_HIP, lm(280.0, 400.0, 1.0));
        set.insert(idx::LEFT_ANKLE, lm(130.0, 460.0, 1.0));
        set.insert(idx::RIGHT_ANKLE, lm(270.0, 460.0, 1.0));
        set
    }

    fn ctx() -> CalibrationContext {
        CalibrationContext::new(100.0 / 30.0, 30.0)
    }

    #[test]
    fn reference_scenario_values() {
        let set = scenario();
        let ctx = ctx();

        assert_relative_eq!(chest_width(&set, &ctx).unwrap(), 60.0, epsilon = 1e-9);
        assert_relative_eq!(body_length(&set, &ctx).unwrap(), 60.0, epsilon = 1e-9);
        assert_relative_eq!(total_height(&set, &ctx).unwrap(), 78.0, epsilon = 1e-9);
        // Shoulder line at y=200, lowest ground contact at y=460.
        assert_relative_eq!(wither_height(&set, &ctx).unwrap(), 78.0, epsilon = 1e-9);
        // The approximated tail vector is vertical, so the folded angle is 90.
        assert_relative_eq!(rump_angle(&set), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_shoulder_zeroes_dependent_measurements() {
        let mut set = scenario();
        set.insert(idx::LEFT_SHOULDER, lm(100.0, 200.0, 0.3)); // unreliable
        let ctx = ctx();

        assert_eq!(chest_width(&set, &ctx).unwrap(), 0.0);
        assert_eq!(wither_height(&set, &ctx).unwrap(), 0.0);
        assert_eq!(body_length(&set, &ctx).unwrap(), 0.0);
        // Hips and ankles are still reliable.
        assert_relative_eq!(rump_angle(&set), 90.0);
    }

    #[test]
    fn missing_ankles_zero_the_rump_angle() {
        let mut set = scenario();
        set.insert(idx::LEFT_ANKLE, lm(130.0, 460.0, 0.0));
        assert_eq!(rump_angle(&set), 0.0);
    }

    #[test]
    fn fewer_than_two_visible_points_give_zero_total_height() {
        let mut set = LandmarkSet::new();
        set.insert(idx::LEFT_SHOULDER, lm(10.0, 10.0, 1.0));
        assert_eq!(total_height(&set, &ctx()).unwrap(), 0.0);
    }

    #[test]
    fn all_invisible_landmarks_measure_zero_without_failing() {
        let mut set = LandmarkSet::new();
        for i in 0..bovimetry_core::LANDMARK_COUNT {
            set.insert(i, lm(i as f64, i as f64, 0.0));
        }
        let m = measure_all(&set, &ctx()).unwrap();
        assert_eq!(m.total_height, 0.0);
        assert_eq!(m.wither_height, 0.0);
        assert_eq!(m.chest_width, 0.0);
        assert_eq!(m.rump_angle, 0.0);
        assert_eq!(m.body_length, 0.0);
        assert!(!m.total_height.is_nan());
    }

    #[test]
    fn uncalibrated_context_is_a_contract_error() {
        let set = scenario();
        let uncalibrated = CalibrationContext::new(0.0, 30.0);

        assert_eq!(
            total_height(&set, &uncalibrated),
            Err(MeasureError::NotCalibrated)
        );
        assert_eq!(
            wither_height(&set, &uncalibrated),
            Err(MeasureError::NotCalibrated)
        );
        assert_eq!(
            chest_width(&set, &uncalibrated),
            Err(MeasureError::NotCalibrated)
        );
        assert_eq!(
            body_length(&set, &uncalibrated),
            Err(MeasureError::NotCalibrated)
        );
        // The rump angle is unit-free and still computes.
        assert_relative_eq!(rump_angle(&set), 90.0);
    }
}
