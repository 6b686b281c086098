//! Outline degree conversion.
//!
//! Cubic outlines convert to quadratic ones by recursive bisection: each
//! cubic is approximated by the quadratic whose control point is the
//! intersection of the end tangents, and split in half until that
//! approximation stays inside the error bound. Cubics that are
//! quadratics in disguise convert analytically, as does the exact
//! quadratic→cubic direction.

use kurbo::Point;
use thiserror::Error;

use crate::contour::Outline;
use crate::curve::Curve;

/// Subdivision depth budget; 2^8 quadratics per cubic is far beyond any
/// well-formed outline.
const MAX_DEPTH: u32 = 8;

#[derive(Debug, Error)]
pub enum ConvError {
    #[error("segment {0} exceeded the subdivision budget while converting to quadratics")]
    SubdivisionBudget(usize),
}

/// Rebuilds an outline with every segment quadratic or linear.
///
/// `error` is the geometric budget in font units; callers hinting for a
/// pixel grid scale it from the target pixels-per-em.
pub fn to_quadratics(outline: &Outline, error: f64) -> Result<Outline, ConvError> {
    let mut pen = Outline::builder();
    for ci in 0..outline.contours.len() {
        let ids = outline.contour_points(ci);
        pen.move_to(outline.points[ids[0]].pos);
        for si in outline.contour_curves(ci) {
            let curve = &outline.curves[si];
            let (p0, c1, c2, p3) = cubic_geometry(outline, curve);
            if curve.is_linear {
                pen.line_to(p3);
            } else if curve.is_quadratic {
                pen.quad_to(quad_ctrl(outline, curve), p3);
            } else {
                let mut pieces = Vec::new();
                if !approx_cubic(p0, c1, c2, p3, error, MAX_DEPTH, &mut pieces) {
                    return Err(ConvError::SubdivisionBudget(si));
                }
                for (ctrl, end) in pieces {
                    pen.quad_to(ctrl, end);
                }
            }
        }
        if outline.is_closed(ci) {
            pen.close();
        }
    }
    Ok(pen.build())
}

/// Rebuilds an outline with every segment cubic or linear; exact.
pub fn to_cubics(outline: &Outline) -> Outline {
    let mut pen = Outline::builder();
    for ci in 0..outline.contours.len() {
        let ids = outline.contour_points(ci);
        pen.move_to(outline.points[ids[0]].pos);
        for si in outline.contour_curves(ci) {
            let curve = &outline.curves[si];
            let (p0, c1, c2, p3) = cubic_geometry(outline, curve);
            if curve.is_linear {
                pen.line_to(p3);
            } else if curve.is_quadratic {
                let q = quad_ctrl(outline, curve);
                pen.curve_to(
                    p0.lerp(q, 2.0 / 3.0),
                    p3.lerp(q, 2.0 / 3.0),
                    p3,
                );
            } else {
                pen.curve_to(c1, c2, p3);
            }
        }
        if outline.is_closed(ci) {
            pen.close();
        }
    }
    pen.build()
}

fn cubic_geometry(outline: &Outline, curve: &Curve) -> (Point, Point, Point, Point) {
    let from = &outline.points[curve.from];
    let to = &outline.points[curve.to];
    let p0 = from.pos;
    let p3 = to.pos;
    let c1 = if from.next_ctrl_degenerate() {
        p0
    } else {
        from.next_ctrl
    };
    let c2 = if to.prev_ctrl_degenerate() { p3 } else { to.prev_ctrl };
    (p0, c1, c2, p3)
}

fn quad_ctrl(outline: &Outline, curve: &Curve) -> Point {
    let from = &outline.points[curve.from];
    let to = &outline.points[curve.to];
    if !from.next_ctrl_degenerate() {
        from.next_ctrl
    } else {
        to.prev_ctrl
    }
}

/// Approximates one cubic with quadratic pieces pushed as (ctrl, end).
fn approx_cubic(
    p0: Point,
    c1: Point,
    c2: Point,
    p3: Point,
    error: f64,
    depth: u32,
    out: &mut Vec<(Point, Point)>,
) -> bool {
    // A cubic coefficient near zero means this is a quadratic already.
    let ax = p3.x - p0.x + 3.0 * (c1.x - c2.x);
    let ay = p3.y - p0.y + 3.0 * (c1.y - c2.y);
    let scale = (p3 - p0).hypot().max((c1 - p0).hypot()).max((c2 - p3).hypot()).max(1.0);
    if ax.abs() < 1e-9 * scale && ay.abs() < 1e-9 * scale {
        // Exact: c1 = p0 + 2/3 (q - p0)
        let q = Point::new(
            p0.x + 1.5 * (c1.x - p0.x),
            p0.y + 1.5 * (c1.y - p0.y),
        );
        out.push((q, p3));
        return true;
    }
    if let Some(q) = tangent_intersection(p0, c1, c2, p3) {
        if quad_close_enough(p0, q, p3, (p0, c1, c2, p3), error) {
            out.push((q, p3));
            return true;
        }
    }
    if depth == 0 {
        return false;
    }
    // Bisect and try each half.
    let c1a = p0.midpoint(c1);
    let c2a = c1.midpoint(c2);
    let c3a = c2.midpoint(p3);
    let c1aa = c1a.midpoint(c2a);
    let c2aa = c2a.midpoint(c3a);
    let mid = c1aa.midpoint(c2aa);
    approx_cubic(p0, c1a, c1aa, mid, error, depth - 1, out)
        && approx_cubic(mid, c2aa, c3a, p3, error, depth - 1, out)
}

/// Intersection of the end tangents, when they meet on the forward side.
fn tangent_intersection(p0: Point, c1: Point, c2: Point, p3: Point) -> Option<Point> {
    let v0 = c1 - p0;
    let v1 = c2 - p3;
    let det = v0.x * v1.y - v0.y * v1.x;
    let scale = v0.hypot().max(v1.hypot()).max(1.0);
    if det.abs() < 1e-9 * scale * scale {
        return None;
    }
    let d = p3 - p0;
    let s = (d.x * v1.y - d.y * v1.x) / det;
    let u = (d.x * v0.y - d.y * v0.x) / det;
    // Both tangents must reach forward to their crossing.
    if s <= 0.0 || u <= 0.0 {
        return None;
    }
    Some(p0 + v0 * s)
}

fn quad_close_enough(
    q0: Point,
    q1: Point,
    q2: Point,
    cubic: (Point, Point, Point, Point),
    error: f64,
) -> bool {
    let (p0, c1, c2, p3) = cubic;
    for i in 1..8 {
        let t = i as f64 / 8.0;
        let one_t = 1.0 - t;
        let cub = Point::new(
            p0.x * one_t * one_t * one_t
                + 3.0 * c1.x * one_t * one_t * t
                + 3.0 * c2.x * one_t * t * t
                + p3.x * t * t * t,
            p0.y * one_t * one_t * one_t
                + 3.0 * c1.y * one_t * one_t * t
                + 3.0 * c2.y * one_t * t * t
                + p3.y * t * t * t,
        );
        let quad = Point::new(
            q0.x * one_t * one_t + 2.0 * q1.x * one_t * t + q2.x * t * t,
            q0.y * one_t * one_t + 2.0 * q1.y * one_t * t + q2.y * t * t,
        );
        if (cub - quad).hypot() > error {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch() -> Outline {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.curve_to(
            Point::new(20.0, 80.0),
            Point::new(80.0, 80.0),
            Point::new(100.0, 0.0),
        );
        pen.line_to(Point::new(0.0, 0.0));
        pen.close();
        pen.build()
    }

    fn min_distance_to(outline: &Outline, curve_ix: usize, p: Point) -> f64 {
        let curve = &outline.curves[curve_ix];
        (0..=256)
            .map(|i| (curve.eval(i as f64 / 256.0) - p).hypot())
            .fold(f64::MAX, f64::min)
    }

    #[test]
    fn cubic_arch_becomes_quadratics_within_budget() {
        let outline = arch();
        let quads = to_quadratics(&outline, 0.5).unwrap();
        assert!(quads.is_closed(0));
        assert!(quads.curves.iter().all(|c| c.is_linear || c.is_quadratic));
        assert!(quads.curves.len() > outline.curves.len());
        for point in &quads.points {
            assert!(min_distance_to(&outline, 0, point.pos) < 0.75);
        }
    }

    #[test]
    fn lines_pass_through_untouched() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.line_to(Point::new(100.0, 0.0));
        pen.line_to(Point::new(100.0, 100.0));
        pen.close();
        let outline = pen.build();
        let quads = to_quadratics(&outline, 0.5).unwrap();
        assert_eq!(quads.curves.len(), 3);
        assert!(quads.curves.iter().all(|c| c.is_linear));
        let cubics = to_cubics(&quads);
        assert_eq!(cubics.curves.len(), 3);
        assert!(cubics.curves.iter().all(|c| c.is_linear));
    }

    #[test]
    fn quad_to_cubic_is_exact() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.quad_to(Point::new(50.0, 100.0), Point::new(100.0, 0.0));
        let quads = pen.build();
        let cubics = to_cubics(&quads);
        for i in 0..=16 {
            let t = i as f64 / 16.0;
            let a = quads.curves[0].eval(t);
            let b = cubics.curves[0].eval(t);
            assert!((a - b).hypot() < 1e-9, "mismatch at t={t}");
        }
    }

    #[test]
    fn disguised_quadratic_converts_analytically() {
        // Cubic with controls at the exact 1/3 marks of a quadratic.
        let q = Point::new(50.0, 100.0);
        let p0 = Point::new(0.0, 0.0);
        let p3 = Point::new(100.0, 0.0);
        let mut pen = Outline::builder();
        pen.move_to(p0);
        pen.curve_to(p0.lerp(q, 2.0 / 3.0), p3.lerp(q, 2.0 / 3.0), p3);
        let outline = pen.build();
        let quads = to_quadratics(&outline, 0.01).unwrap();
        assert_eq!(quads.curves.len(), 1);
        let ctrl = quads.points[0].next_ctrl;
        assert!((ctrl - q).hypot() < 1e-6);
    }
}
