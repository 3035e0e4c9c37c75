//! The measurement record and its JSON serialization.

use crate::measure::Measurements;
use bovimetry_core::CalibrationContext;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ReportIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Terminal state of a measurement request. Failures never produce a
/// record — they surface as structured errors — so the only serialized
/// status is `success`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementStatus {
    Success,
}

/// Fully derived measurement record, produced exactly once per successful
/// pipeline run and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    /// RFC 3339 timestamp of when the record was assembled.
    pub timestamp: String,
    pub image_width: u32,
    pub image_height: u32,
    pub total_height: f64,
    pub wither_height: f64,
    pub chest_width: f64,
    pub rump_angle: f64,
    pub body_length: f64,
    pub pixel_per_unit: f64,
    pub reference_dimension: f64,
    pub status: MeasurementStatus,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

impl MeasurementResult {
    /// Assemble a record from computed measurements and the calibration
    /// used to derive them, stamped with the current UTC time.
    pub fn assemble(
        image_width: u32,
        image_height: u32,
        measurements: &Measurements,
        calibration: &CalibrationContext,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            image_width,
            image_height,
            total_height: round2(measurements.total_height),
            wither_height: round2(measurements.wither_height),
            chest_width: round2(measurements.chest_width),
            rump_angle: round2(measurements.rump_angle),
            body_length: round2(measurements.body_length),
            pixel_per_unit: round4(calibration.pixel_per_unit),
            reference_dimension: calibration.reference_dimension,
            status: MeasurementStatus::Success,
        }
    }

    /// Load a record from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ReportIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this record to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReportIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
