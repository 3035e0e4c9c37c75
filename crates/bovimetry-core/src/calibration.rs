use serde::{Deserialize, Serialize};

/// Pixel-to-physical-unit scale derived from the reference object.
///
/// Produced once per measurement request and threaded explicitly through the
/// call chain as an immutable value. It must never be stored as a mutable
/// field on a long-lived pipeline object: concurrent requests would
/// cross-contaminate calibration between unrelated images.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationContext {
    /// Pixels per unit of physical length.
    pub pixel_per_unit: f64,
    /// Declared physical dimension of the reference object, in the same
    /// unit the measurements are reported in.
    pub reference_dimension: f64,
}

impl CalibrationContext {
    pub fn new(pixel_per_unit: f64, reference_dimension: f64) -> Self {
        Self {
            pixel_per_unit,
            reference_dimension,
        }
    }

    /// Whether this context can be used to convert pixels to units.
    ///
    /// Every unit-dependent measurement checks this before dividing; a
    /// non-positive or non-finite ratio is a contract violation, not a data
    /// error.
    pub fn is_calibrated(&self) -> bool {
        self.pixel_per_unit.is_finite()
            && self.pixel_per_unit > 0.0
            && self.reference_dimension.is_finite()
            && self.reference_dimension > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_validity() {
        assert!(CalibrationContext::new(3.33, 30.0).is_calibrated());
        assert!(!CalibrationContext::new(0.0, 30.0).is_calibrated());
        assert!(!CalibrationContext::new(-1.0, 30.0).is_calibrated());
        assert!(!CalibrationContext::new(f64::NAN, 30.0).is_calibrated());
        assert!(!CalibrationContext::new(3.33, 0.0).is_calibrated());
    }
}
