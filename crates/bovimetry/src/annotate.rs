//! Skeleton, reference and measurement-text overlay rendering.
//!
//! Draws on a copy of the source frame and consumes an already-computed
//! [`MeasurementOutcome`]; it never re-runs calibration or pose detection.

use ab_glyph::{FontRef, PxScale};
use crate::pipeline::MeasurementOutcome;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};

/// Torso and leg connection pairs of the 33-point full-body taxonomy.
pub const SKELETON_CONNECTIONS: &[(usize, usize)] = &[
    (11, 12), // shoulder line
    (11, 23),
    (12, 24),
    (23, 24), // hip line
    (23, 25),
    (24, 26),
    (25, 27),
    (26, 28),
    (27, 29),
    (28, 30),
    (29, 31),
    (30, 32),
    (27, 31),
    (28, 32),
];

const SKELETON_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LANDMARK_COLOR: Rgb<u8> = Rgb([0, 128, 255]);
const REFERENCE_COLOR: Rgb<u8> = Rgb([255, 64, 64]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const TEXT_SCALE: f32 = 20.0;
const TEXT_LINE_STEP: i32 = 26;

/// Render the overlay onto a copy of `image`.
pub fn annotate(image: &RgbImage, outcome: &MeasurementOutcome) -> RgbImage {
    let mut canvas = image.clone();

    // Reference rectangle, closed.
    let corners = &outcome.reference_corners;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        draw_line_segment_mut(
            &mut canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            REFERENCE_COLOR,
        );
    }

    // Skeleton segments where both endpoints are reliable.
    for &(a, b) in SKELETON_CONNECTIONS {
        let (Some(la), Some(lb)) = (outcome.landmarks.visible(a), outcome.landmarks.visible(b))
        else {
            continue;
        };
        draw_line_segment_mut(
            &mut canvas,
            (la.x as f32, la.y as f32),
            (lb.x as f32, lb.y as f32),
            SKELETON_COLOR,
        );
    }

    // Landmark markers.
    for (_, lm) in outcome.landmarks.iter_visible() {
        draw_filled_circle_mut(&mut canvas, (lm.x as i32, lm.y as i32), 3, LANDMARK_COLOR);
    }

    draw_measurement_text(&mut canvas, outcome);

    canvas
}

/// Stack the measurement values in the top-left corner.
fn draw_measurement_text(canvas: &mut RgbImage, outcome: &MeasurementOutcome) {
    let font = match FontRef::try_from_slice(FONT_BYTES) {
        Ok(font) => font,
        Err(err) => {
            log::warn!("embedded font failed to parse, skipping text overlay: {err}");
            return;
        }
    };

    let r = &outcome.result;
    let lines = [
        format!("total height: {:.2}", r.total_height),
        format!("wither height: {:.2}", r.wither_height),
        format!("chest width: {:.2}", r.chest_width),
        format!("rump angle: {:.2}", r.rump_angle),
        format!("body length: {:.2}", r.body_length),
    ];

    let scale = PxScale::from(TEXT_SCALE);
    for (i, line) in lines.iter().enumerate() {
        let y = 10 + i as i32 * TEXT_LINE_STEP;
        draw_text_mut(canvas, TEXT_COLOR, 10, y, scale, &font, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Measurements;
    use crate::report::MeasurementResult;
    use bovimetry_core::{landmark_index, CalibrationContext, Landmark, LandmarkSet};
    use nalgebra::Point2;

    fn outcome(width: u32, height: u32) -> MeasurementOutcome {
        // Skeleton and reference sit in the lower half, clear of the
        // measurement-text block in the top-left corner.
        let mut landmarks = LandmarkSet::new();
        landmarks.insert(
            landmark_index::LEFT_SHOULDER,
            Landmark {
                x: 20.0,
                y: 160.0,
                z: 0.0,
                visibility: 1.0,
            },
        );
        landmarks.insert(
            landmark_index::RIGHT_SHOULDER,
            Landmark {
                x: 40.0,
                y: 160.0,
                z: 0.0,
                visibility: 1.0,
            },
        );
        let calibration = CalibrationContext::new(2.0, 30.0);
        MeasurementOutcome {
            result: MeasurementResult::assemble(
                width,
                height,
                &Measurements {
                    total_height: 0.0,
                    wither_height: 0.0,
                    chest_width: 10.0,
                    rump_angle: 90.0,
                    body_length: 0.0,
                },
                &calibration,
            ),
            landmarks,
            reference_corners: [
                Point2::new(60.0, 150.0),
                Point2::new(70.0, 150.0),
                Point2::new(70.0, 156.0),
                Point2::new(60.0, 156.0),
            ],
        }
    }

    #[test]
    fn annotation_preserves_dimensions_and_leaves_source_untouched() {
        let src = RgbImage::from_pixel(200, 200, Rgb([0, 0, 0]));
        let out = annotate(&src, &outcome(200, 200));
        assert_eq!(out.dimensions(), src.dimensions());
        // Source copy semantics: original stays black.
        assert_eq!(src.get_pixel(65, 150), &Rgb([0, 0, 0]));
        // The reference outline passes through (65, 150).
        assert_eq!(out.get_pixel(65, 150), &REFERENCE_COLOR);
        // The shoulder line passes through (30, 160).
        assert_eq!(out.get_pixel(30, 160), &SKELETON_COLOR);
    }

    #[test]
    fn measurement_text_is_rendered_onto_the_overlay() {
        let src = RgbImage::from_pixel(300, 200, Rgb([0, 0, 0]));
        let mut no_overlay = outcome(300, 200);
        no_overlay.landmarks = LandmarkSet::new();
        // Collapse the reference quad to a single pixel so every other
        // painted pixel comes from the text block.
        no_overlay.reference_corners = [Point2::new(0.0, 0.0); 4];

        let out = annotate(&src, &no_overlay);
        let painted = out
            .enumerate_pixels()
            .filter(|(x, y, px)| !(*x == 0 && *y == 0) && **px != Rgb([0, 0, 0]))
            .count();
        assert!(painted > 100, "expected text pixels, found {painted}");
    }
}
