//! Curve–curve intersection.
//!
//! Lines against anything are solved exactly through the axis
//! polynomials; two true curves go through bounding-box pruning followed
//! by bisection of whichever sub-curve currently shows the larger
//! variation. Two coincident curves (all eight coefficients equal) have
//! an indeterminate point set and report `None` instead.

use arrayvec::ArrayVec;
use kurbo::{Point, Rect};
use log::warn;

use crate::curve::Curve;
use crate::poly::AxisPoly;
use crate::{X, Y};

/// Most intersections two cubics can have; also the solution budget.
pub const MAX_INTERSECTIONS: usize = 9;

/// One intersection with the parameter on each curve.
#[derive(Copy, Clone, Debug)]
pub struct CurveHit {
    pub pos: Point,
    pub t_a: f64,
    pub t_b: f64,
}

/// Intersections of two segments.
///
/// Returns `None` when the segments are coincident; the caller decides
/// what an indeterminate overlap means in its context. Exceeding the
/// solution budget is reported and the extra hits are dropped.
pub fn intersect_curves(a: &Curve, b: &Curve) -> Option<ArrayVec<CurveHit, MAX_INTERSECTIONS>> {
    if a.polys == b.polys {
        return None;
    }
    let mut hits = ArrayVec::new();
    let mut overflow = false;
    match (a.is_linear, b.is_linear) {
        (true, true) => line_line(a, b, &mut hits),
        (false, true) => curve_line(a, b, false, &mut hits, &mut overflow),
        (true, false) => curve_line(b, a, true, &mut hits, &mut overflow),
        (false, false) => {
            let mut state = RecurseState {
                hits: &mut hits,
                overflow: &mut overflow,
            };
            recurse(a, b, (0.0, 1.0), (0.0, 1.0), 0, &mut state);
        }
    }
    if overflow {
        warn!(
            "curve intersection exceeded its budget of {MAX_INTERSECTIONS} solutions; extra hits dropped"
        );
    }
    Some(hits)
}

fn line_line(a: &Curve, b: &Curve, hits: &mut ArrayVec<CurveHit, MAX_INTERSECTIONS>) {
    // P(t) = pa + va*t, Q(s) = pb + vb*s
    let (vax, vay) = (a.polys[X].c, a.polys[Y].c);
    let (vbx, vby) = (b.polys[X].c, b.polys[Y].c);
    let det = vax * vby - vay * vbx;
    let scale = vax.abs().max(vay.abs()).max(vbx.abs()).max(vby.abs()).max(1.0);
    if det.abs() < 1e-12 * scale * scale {
        // Parallel; overlap without exact coincidence reports nothing.
        return;
    }
    let dx = b.polys[X].d - a.polys[X].d;
    let dy = b.polys[Y].d - a.polys[Y].d;
    let t = (dx * vby - dy * vbx) / det;
    let s = (dx * vay - dy * vax) / det;
    if (-1e-9..=1.0 + 1e-9).contains(&t) && (-1e-9..=1.0 + 1e-9).contains(&s) {
        let t = t.clamp(0.0, 1.0);
        hits.push(CurveHit {
            pos: a.eval(t),
            t_a: t,
            t_b: s.clamp(0.0, 1.0),
        });
    }
}

fn curve_line(
    curve: &Curve,
    line: &Curve,
    swapped: bool,
    hits: &mut ArrayVec<CurveHit, MAX_INTERSECTIONS>,
    overflow: &mut bool,
) {
    let (vx, vy) = (line.polys[X].c, line.polys[Y].c);
    let len2 = vx * vx + vy * vy;
    if len2 < 1e-18 {
        return;
    }
    // Substitute the curve into the line's normal equation.
    let (nx, ny) = (-vy, vx);
    let combined = AxisPoly {
        a: nx * curve.polys[X].a + ny * curve.polys[Y].a,
        b: nx * curve.polys[X].b + ny * curve.polys[Y].b,
        c: nx * curve.polys[X].c + ny * curve.polys[Y].c,
        d: nx * curve.polys[X].d + ny * curve.polys[Y].d,
    };
    let target = nx * line.polys[X].d + ny * line.polys[Y].d;
    for t in combined.solve(target) {
        let pos = curve.eval(t);
        let s = ((pos.x - line.polys[X].d) * vx + (pos.y - line.polys[Y].d) * vy) / len2;
        if !(-1e-9..=1.0 + 1e-9).contains(&s) {
            continue;
        }
        let (t_a, t_b) = if swapped {
            (s.clamp(0.0, 1.0), t)
        } else {
            (t, s.clamp(0.0, 1.0))
        };
        push_hit(hits, overflow, CurveHit { pos, t_a, t_b });
    }
}

struct RecurseState<'a> {
    hits: &'a mut ArrayVec<CurveHit, MAX_INTERSECTIONS>,
    overflow: &'a mut bool,
}

/// Position agreement required before a subdivision cell becomes a hit.
const CELL_TOLERANCE: f64 = 1e-6;

fn recurse(
    a: &Curve,
    b: &Curve,
    (a0, a1): (f64, f64),
    (b0, b1): (f64, f64),
    depth: u32,
    state: &mut RecurseState,
) {
    if *state.overflow {
        return;
    }
    let box_a = a.bbox_range(a0, a1);
    let box_b = b.bbox_range(b0, b1);
    if !boxes_touch(&box_a, &box_b) {
        return;
    }
    let size_a = box_a.width().max(box_a.height());
    let size_b = box_b.width().max(box_b.height());
    if depth >= 48 || (size_a < CELL_TOLERANCE && size_b < CELL_TOLERANCE) {
        let t_a = 0.5 * (a0 + a1);
        let t_b = 0.5 * (b0 + b1);
        push_hit(
            state.hits,
            state.overflow,
            CurveHit {
                pos: a.eval(t_a),
                t_a,
                t_b,
            },
        );
        return;
    }
    // Bisect whichever side still varies more.
    if size_a >= size_b {
        let mid = 0.5 * (a0 + a1);
        recurse(a, b, (a0, mid), (b0, b1), depth + 1, state);
        recurse(a, b, (mid, a1), (b0, b1), depth + 1, state);
    } else {
        let mid = 0.5 * (b0 + b1);
        recurse(a, b, (a0, a1), (b0, mid), depth + 1, state);
        recurse(a, b, (a0, a1), (mid, b1), depth + 1, state);
    }
}

fn boxes_touch(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 + CELL_TOLERANCE
        && b.x0 <= a.x1 + CELL_TOLERANCE
        && a.y0 <= b.y1 + CELL_TOLERANCE
        && b.y0 <= a.y1 + CELL_TOLERANCE
}

fn push_hit(
    hits: &mut ArrayVec<CurveHit, MAX_INTERSECTIONS>,
    overflow: &mut bool,
    hit: CurveHit,
) {
    for seen in hits.iter() {
        if (seen.t_a - hit.t_a).abs() < 1e-4 && (seen.t_b - hit.t_b).abs() < 1e-4 {
            return;
        }
    }
    if hits.is_full() {
        *overflow = true;
    } else {
        hits.push(hit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::CurvePoint;

    fn line(p0: Point, p1: Point) -> Curve {
        let points = vec![CurvePoint::new(p0), CurvePoint::new(p1)];
        let mut curve = Curve::new(0, 1, false);
        curve.refigure(&points);
        curve
    }

    fn cubic(p0: Point, c0: Point, c1: Point, p1: Point) -> Curve {
        let mut a = CurvePoint::new(p0);
        a.next_ctrl = c0;
        a.has_next_ctrl = true;
        let mut b = CurvePoint::new(p1);
        b.prev_ctrl = c1;
        b.has_prev_ctrl = true;
        let points = vec![a, b];
        let mut curve = Curve::new(0, 1, false);
        curve.refigure(&points);
        curve
    }

    #[test]
    fn crossing_lines_meet_once() {
        let a = line(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        let b = line(Point::new(0.0, 100.0), Point::new(100.0, 0.0));
        let hits = intersect_curves(&a, &b).unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].pos - Point::new(50.0, 50.0)).hypot() < 1e-9);
        assert!((hits[0].t_a - 0.5).abs() < 1e-9);
    }

    #[test]
    fn parallel_lines_miss() {
        let a = line(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let b = line(Point::new(0.0, 10.0), Point::new(100.0, 10.0));
        assert!(intersect_curves(&a, &b).unwrap().is_empty());
    }

    #[test]
    fn coincident_curves_are_indeterminate() {
        let a = cubic(
            Point::new(0.0, 0.0),
            Point::new(30.0, 50.0),
            Point::new(70.0, 50.0),
            Point::new(100.0, 0.0),
        );
        assert!(intersect_curves(&a, &a.clone()).is_none());
    }

    #[test]
    fn line_through_an_arch_hits_twice() {
        let arch = cubic(
            Point::new(0.0, 0.0),
            Point::new(20.0, 80.0),
            Point::new(80.0, 80.0),
            Point::new(100.0, 0.0),
        );
        let cut = line(Point::new(-10.0, 30.0), Point::new(110.0, 30.0));
        let hits = intersect_curves(&arch, &cut).unwrap();
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            assert!((hit.pos.y - 30.0).abs() < 1e-6);
            let on_curve = arch.eval(hit.t_a);
            assert!((on_curve - hit.pos).hypot() < 1e-6);
        }
    }

    #[test]
    fn two_arches_cross_twice() {
        let up = cubic(
            Point::new(0.0, 0.0),
            Point::new(20.0, 90.0),
            Point::new(80.0, 90.0),
            Point::new(100.0, 0.0),
        );
        let down = cubic(
            Point::new(0.0, 50.0),
            Point::new(20.0, -40.0),
            Point::new(80.0, -40.0),
            Point::new(100.0, 50.0),
        );
        let hits = intersect_curves(&up, &down).unwrap();
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            let pa = up.eval(hit.t_a);
            let pb = down.eval(hit.t_b);
            assert!((pa - pb).hypot() < 1e-3, "params disagree: {hit:?}");
        }
    }

    #[test]
    fn disjoint_curves_miss() {
        let a = cubic(
            Point::new(0.0, 0.0),
            Point::new(30.0, 40.0),
            Point::new(70.0, 40.0),
            Point::new(100.0, 0.0),
        );
        let b = cubic(
            Point::new(0.0, 200.0),
            Point::new(30.0, 240.0),
            Point::new(70.0, 240.0),
            Point::new(100.0, 200.0),
        );
        assert!(intersect_curves(&a, &b).unwrap().is_empty());
    }
}
