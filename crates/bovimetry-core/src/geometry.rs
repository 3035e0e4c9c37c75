//! Planar geometry helpers for reference-object calibration.
//!
//! Everything operates on `nalgebra::Point2<f64>` and is deterministic:
//! ties are broken by total coordinate order, never by input order.

use nalgebra::{Point2, Vector2};
use std::cmp::Ordering;

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (b - a).norm()
}

/// Midpoint of the segment `a`-`b`.
#[inline]
pub fn midpoint(a: &Point2<f64>, b: &Point2<f64>) -> Point2<f64> {
    Point2::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}

/// Absolute shoelace area of a closed polygon.
pub fn polygon_area(points: &[Point2<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x * q.y - q.x * p.y;
    }
    twice_area.abs() * 0.5
}

fn cmp_xy(a: &Point2<f64>, b: &Point2<f64>) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

#[inline]
fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull via Andrew's monotone chain, counterclockwise in a y-up
/// frame, without the closing duplicate. Collinear points are dropped.
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut pts: Vec<Point2<f64>> = points.to_vec();
    pts.sort_by(cmp_xy);
    pts.dedup();
    let n = pts.len();
    if n < 3 {
        return pts;
    }

    let mut lower: Vec<Point2<f64>> = Vec::with_capacity(n);
    for p in &pts {
        while lower.len() >= 2
            && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point2<f64>> = Vec::with_capacity(n);
    for p in pts.iter().rev() {
        while upper.len() >= 2
            && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }

    // Each chain repeats the other's endpoint.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Minimum-area oriented bounding rectangle of a point set.
///
/// Returns the four rectangle corners in an unspecified winding; use
/// [`order_corners`] to canonicalize. `None` only for an empty input.
/// Degenerate inputs (a single point, a collinear run) yield a collapsed
/// rectangle with zero area.
pub fn min_area_rect(points: &[Point2<f64>]) -> Option<[Point2<f64>; 4]> {
    let hull = convex_hull(points);
    match hull.len() {
        0 => None,
        1 => Some([hull[0]; 4]),
        2 => Some([hull[0], hull[1], hull[1], hull[0]]),
        _ => {
            let mut best: Option<([Point2<f64>; 4], f64)> = None;
            for (i, origin) in hull.iter().enumerate() {
                let edge = hull[(i + 1) % hull.len()] - origin;
                let len = edge.norm();
                if len == 0.0 {
                    continue;
                }
                let u = edge / len;
                let v = Vector2::new(-u.y, u.x);

                let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
                let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
                for p in &hull {
                    let d = p - origin;
                    let su = d.dot(&u);
                    let sv = d.dot(&v);
                    min_u = min_u.min(su);
                    max_u = max_u.max(su);
                    min_v = min_v.min(sv);
                    max_v = max_v.max(sv);
                }

                let area = (max_u - min_u) * (max_v - min_v);
                if best.map_or(true, |(_, a)| area < a) {
                    let corner = |su: f64, sv: f64| origin + u * su + v * sv;
                    best = Some((
                        [
                            corner(min_u, min_v),
                            corner(max_u, min_v),
                            corner(max_u, max_v),
                            corner(min_u, max_v),
                        ],
                        area,
                    ));
                }
            }
            best.map(|(corners, _)| corners)
        }
    }
}

/// Canonicalize four quadrilateral corners to (top-left, top-right,
/// bottom-right, bottom-left) in image coordinates (y grows downward).
///
/// The labeling depends only on the corner coordinates, never on the input
/// order, so applying it to an already-ordered quadrilateral is a no-op.
pub fn order_corners(corners: [Point2<f64>; 4]) -> [Point2<f64>; 4] {
    // Composite keys give a strict ranking even for ties on the primary
    // sum/difference criterion.
    let sum_key = |p: &Point2<f64>| (p.x + p.y, p.x, p.y);
    let diff_key = |p: &Point2<f64>| (p.y - p.x, p.y, p.x);
    let cmp_keys = |a: (f64, f64, f64), b: (f64, f64, f64)| {
        a.0.total_cmp(&b.0)
            .then(a.1.total_cmp(&b.1))
            .then(a.2.total_cmp(&b.2))
    };

    let mut rest: Vec<Point2<f64>> = corners.to_vec();

    let take_extreme = |rest: &mut Vec<Point2<f64>>,
                        key: &dyn Fn(&Point2<f64>) -> (f64, f64, f64),
                        want_max: bool| {
        let mut pick = 0;
        for i in 1..rest.len() {
            let ord = cmp_keys(key(&rest[i]), key(&rest[pick]));
            let better = if want_max {
                ord == Ordering::Greater
            } else {
                ord == Ordering::Less
            };
            if better {
                pick = i;
            }
        }
        rest.swap_remove(pick)
    };

    // Smallest x+y is top-left, largest is bottom-right; among the two
    // remaining corners the smaller y-x is top-right.
    let tl = take_extreme(&mut rest, &sum_key, false);
    let br = take_extreme(&mut rest, &sum_key, true);
    let tr = take_extreme(&mut rest, &diff_key, false);
    let bl = rest[0];

    [tl, tr, br, bl]
}
