//! External contour extraction from a binary edge map.
//!
//! Connected components (8-connectivity) are discovered by scanline BFS and
//! their outer boundaries traced with Moore-neighbor following. Holes are
//! ignored: only the external boundary of each component is reported, which
//! is what reference-object calibration needs.

use bovimetry_core::GrayImage;
use nalgebra::Point2;

/// Ordered closed boundary of one connected component, in pixel
/// coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point2<i32>>,
}

impl Contour {
    /// Absolute shoelace area of the boundary polygon, in px^2.
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut twice: i64 = 0;
        for (i, p) in self.points.iter().enumerate() {
            let q = &self.points[(i + 1) % self.points.len()];
            twice += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
        }
        twice.unsigned_abs() as f64 * 0.5
    }

    /// Axis-aligned bounding box as `(x, y, width, height)`.
    pub fn bounding_box(&self) -> (i32, i32, i32, i32) {
        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if min_x > max_x {
            return (0, 0, 0, 0);
        }
        (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    /// Boundary points as floating-point coordinates.
    pub fn points_f64(&self) -> Vec<Point2<f64>> {
        self.points
            .iter()
            .map(|p| Point2::new(p.x as f64, p.y as f64))
            .collect()
    }
}

// Clockwise in image coordinates (y down): N, NE, E, SE, S, SW, W, NW.
const DX: [i32; 8] = [0, 1, 1, 1, 0, -1, -1, -1];
const DY: [i32; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];

/// Find the external boundary of every connected component in a binary
/// image, scanning top-to-bottom, left-to-right.
pub fn find_external_contours(edges: &GrayImage) -> Vec<Contour> {
    let (w, h) = (edges.width, edges.height);
    let mut labeled = vec![false; w * h];
    let mut contours = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            if edges.data[idx] == 0 || labeled[idx] {
                continue;
            }

            // Flood-fill the component so later scan rows skip it. The
            // first pixel found in scan order is the topmost-leftmost one,
            // which is where the boundary trace starts.
            flood_mark(edges, &mut labeled, x, y);
            let boundary = trace_boundary(edges, Point2::new(x as i32, y as i32));
            contours.push(Contour { points: boundary });
        }
    }

    log::debug!("found {} external contour(s)", contours.len());
    contours
}

fn flood_mark(edges: &GrayImage, labeled: &mut [bool], x: usize, y: usize) {
    let (w, h) = (edges.width, edges.height);
    let mut stack = vec![y * w + x];
    labeled[y * w + x] = true;
    while let Some(idx) = stack.pop() {
        let cx = (idx % w) as i32;
        let cy = (idx / w) as i32;
        for d in 0..8 {
            let nx = cx + DX[d];
            let ny = cy + DY[d];
            if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                continue;
            }
            let nidx = ny as usize * w + nx as usize;
            if edges.data[nidx] > 0 && !labeled[nidx] {
                labeled[nidx] = true;
                stack.push(nidx);
            }
        }
    }
}

#[inline]
fn dir_between(from: &Point2<i32>, to: &Point2<i32>) -> usize {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    for d in 0..8 {
        if DX[d] == dx && DY[d] == dy {
            return d;
        }
    }
    unreachable!("backtrack pixel is always an 8-neighbor");
}

/// Moore-neighbor boundary following from the topmost-leftmost pixel of a
/// component, clockwise in image coordinates.
///
/// Each step scans the 8-neighborhood clockwise starting just past the
/// backtrack pixel. The walk is deterministic, so the boundary is exactly
/// the cycle of (pixel, backtrack) states; tracing stops when a state
/// repeats. Spur pixels legitimately appear twice (the walk passes them on
/// both sides) and contribute nothing to the shoelace area.
fn trace_boundary(edges: &GrayImage, start: Point2<i32>) -> Vec<Point2<i32>> {
    let is_fg = |p: &Point2<i32>| edges.get_or_zero(p.x as i64, p.y as i64) > 0;

    let mut boundary = Vec::new();
    let mut current = start;
    // The start pixel is topmost-leftmost, so its west neighbor is
    // background and is a valid initial backtrack.
    let mut backtrack = Point2::new(start.x - 1, start.y);
    let mut seen: std::collections::HashSet<(i32, i32, i32, i32)> =
        std::collections::HashSet::new();

    while seen.insert((current.x, current.y, backtrack.x, backtrack.y)) {
        boundary.push(current);

        let from = dir_between(&current, &backtrack);
        let mut step = None;
        for i in 1..=8 {
            let d = (from + i) % 8;
            let next = Point2::new(current.x + DX[d], current.y + DY[d]);
            if is_fg(&next) {
                let before = (from + i - 1) % 8;
                step = Some((
                    next,
                    Point2::new(current.x + DX[before], current.y + DY[before]),
                ));
                break;
            }
        }

        let Some((next, next_backtrack)) = step else {
            break; // isolated pixel
        };
        current = next;
        backtrack = next_backtrack;
    }

    boundary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_rect(w: usize, h: usize, x0: usize, y0: usize, rw: usize, rh: usize) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        for y in y0..y0 + rh {
            for x in x0..x0 + rw {
                img.set(x, y, 255);
            }
        }
        img
    }

    #[test]
    fn empty_image_has_no_contours() {
        let img = GrayImage::new(10, 10);
        assert!(find_external_contours(&img).is_empty());
    }

    #[test]
    fn filled_rectangle_boundary_and_area() {
        let img = filled_rect(60, 40, 10, 5, 30, 20);
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);

        let c = &contours[0];
        let (x, y, w, h) = c.bounding_box();
        assert_eq!((x, y, w, h), (10, 5, 30, 20));
        // Boundary polygon of a filled w x h block encloses (w-1)*(h-1).
        let expected = 29.0 * 19.0;
        assert!((c.area() - expected).abs() < 1.0, "area {}", c.area());
    }

    #[test]
    fn components_are_reported_left_to_right_of_scan_order() {
        let mut img = filled_rect(60, 20, 2, 2, 8, 8);
        for y in 2..10 {
            for x in 40..50 {
                img.set(x, y, 255);
            }
        }
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 2);
        assert!(contours[0].bounding_box().0 < contours[1].bounding_box().0);
    }

    #[test]
    fn single_pixel_component() {
        let mut img = GrayImage::new(5, 5);
        img.set(2, 2, 255);
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![Point2::new(2, 2)]);
        assert_eq!(contours[0].area(), 0.0);
        assert_eq!(contours[0].bounding_box(), (2, 2, 1, 1));
    }

    #[test]
    fn ring_reports_only_the_external_boundary() {
        // 1-pixel-wide square ring.
        let mut img = GrayImage::new(20, 20);
        for i in 4..=14 {
            img.set(i, 4, 255);
            img.set(i, 14, 255);
            img.set(4, i, 255);
            img.set(14, i, 255);
        }
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert_eq!(c.bounding_box(), (4, 4, 11, 11));
        assert!((c.area() - 100.0).abs() < 1.0, "area {}", c.area());
    }
}
