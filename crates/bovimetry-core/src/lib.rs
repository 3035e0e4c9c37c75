//! Core types and utilities for livestock body measurement.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! decode images or talk to any pose-estimation backend; it only defines the
//! value types the measurement pipeline threads through its call chain.

mod calibration;
mod geometry;
mod image;
mod landmark;
mod logger;

pub use calibration::CalibrationContext;
pub use geometry::{
    convex_hull, distance, midpoint, min_area_rect, order_corners, polygon_area,
};
pub use image::GrayImage;
pub use landmark::{
    landmark_index, Landmark, LandmarkSet, LANDMARK_COUNT, VISIBILITY_THRESHOLD,
};
pub use logger::{init_scoped, init_with_level};
