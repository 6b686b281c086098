//! Curve segments: parametric form, bounds and sampling.

use arrayvec::ArrayVec;
use kurbo::{Point, Rect, Vec2};
use log::warn;

use crate::{point::CurvePoint, poly::AxisPoly, Dimension, X, Y};

/// A single curve between two arena points.
///
/// The parametric form is owned here, one polynomial per axis, and the
/// `is_linear` flag is kept in sync with the control state of the
/// endpoints by [`Curve::refigure`]: a segment is linear when neither
/// endpoint carries an effective control or when the polynomials
/// degenerate algebraically.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Curve {
    pub from: usize,
    pub to: usize,
    pub is_linear: bool,
    /// Quadratic outlines share one off-curve point per segment.
    pub is_quadratic: bool,
    pub polys: [AxisPoly; 2],
    pub(crate) dead: bool,
}

impl Curve {
    /// A segment between two points; call [`Curve::refigure`] before use.
    pub fn new(from: usize, to: usize, quadratic: bool) -> Self {
        Self {
            from,
            to,
            is_linear: true,
            is_quadratic: quadratic,
            polys: [AxisPoly::default(); 2],
            dead: false,
        }
    }

    /// Recomputes the parametric form from the endpoint arena.
    ///
    /// Must run whenever either endpoint or one of its controls moves.
    /// Non-finite coefficients are reported and the segment falls back to
    /// its chord rather than poisoning later passes.
    pub fn refigure(&mut self, points: &[CurvePoint]) {
        let p0 = &points[self.from];
        let p1 = &points[self.to];
        let from_flat = p0.next_ctrl_degenerate();
        let to_flat = p1.prev_ctrl_degenerate();
        if self.is_quadratic {
            if from_flat && to_flat {
                self.polys = chord_polys(p0.pos, p1.pos);
            } else {
                // The off-curve point is shared by both anchors.
                let ctrl = if !from_flat { p0.next_ctrl } else { p1.prev_ctrl };
                self.polys = [
                    AxisPoly::quadratic(p0.pos.x, ctrl.x, p1.pos.x),
                    AxisPoly::quadratic(p0.pos.y, ctrl.y, p1.pos.y),
                ];
            }
        } else if from_flat && to_flat {
            self.polys = chord_polys(p0.pos, p1.pos);
        } else {
            let c0 = if from_flat { p0.pos } else { p0.next_ctrl };
            let c1 = if to_flat { p1.pos } else { p1.prev_ctrl };
            self.polys = [
                AxisPoly::cubic(p0.pos.x, c0.x, c1.x, p1.pos.x),
                AxisPoly::cubic(p0.pos.y, c0.y, c1.y, p1.pos.y),
            ];
        }
        if !self.polys[X].is_finite() || !self.polys[Y].is_finite() {
            warn!(
                "non-finite coefficients refiguring segment {} -> {}; using the chord",
                self.from, self.to
            );
            self.polys = chord_polys(p0.pos, p1.pos);
        }
        self.is_linear = self.polys[X].degree() <= 1 && self.polys[Y].degree() <= 1;
    }

    pub fn eval(&self, t: f64) -> Point {
        Point::new(self.polys[X].eval(t), self.polys[Y].eval(t))
    }

    pub fn deriv(&self, t: f64) -> Vec2 {
        Vec2::new(self.polys[X].deriv(t), self.polys[Y].deriv(t))
    }

    pub fn start(&self) -> Point {
        Point::new(self.polys[X].d, self.polys[Y].d)
    }

    pub fn end(&self) -> Point {
        self.eval(1.0)
    }

    /// Extrema along one axis, interior to the parameter range.
    pub fn extrema(&self, dim: Dimension) -> ArrayVec<f64, 2> {
        self.polys[dim].extrema()
    }

    /// Tight bounding box over the parameter sub-range.
    pub fn bbox_range(&self, t0: f64, t1: f64) -> Rect {
        let mut x_min = f64::MAX;
        let mut x_max = f64::MIN;
        let mut y_min = f64::MAX;
        let mut y_max = f64::MIN;
        let mut take = |p: Point| {
            x_min = x_min.min(p.x);
            x_max = x_max.max(p.x);
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        };
        take(self.eval(t0));
        take(self.eval(t1));
        for dim in [X, Y] {
            for t in self.extrema(dim) {
                if t > t0 && t < t1 {
                    take(self.eval(t));
                }
            }
        }
        Rect::new(x_min, y_min, x_max, y_max)
    }

    /// Tight bounding box of the whole segment.
    pub fn bbox(&self) -> Rect {
        self.bbox_range(0.0, 1.0)
    }

    /// Parameters of the curvature sign changes, interior and in order.
    pub fn inflections(&self) -> ArrayVec<f64, 2> {
        // cross(B', B'') is quadratic in t for a cubic segment
        let (a1, b1, c1) = (self.polys[X].a, self.polys[X].b, self.polys[X].c);
        let (a2, b2, c2) = (self.polys[Y].a, self.polys[Y].b, self.polys[Y].c);
        let qa = 6.0 * (a2 * b1 - a1 * b2);
        let qb = 6.0 * (a2 * c1 - a1 * c2);
        let qc = 2.0 * (b2 * c1 - b1 * c2);
        let mut out = ArrayVec::new();
        let scale = qa.abs().max(qb.abs()).max(qc.abs()).max(1.0);
        if qa.abs() <= 1e-9 * scale {
            if qb.abs() > 1e-9 * scale {
                let t = -qc / qb;
                if t > 0.0 && t < 1.0 {
                    out.push(t);
                }
            }
            return out;
        }
        let disc = qb * qb - 4.0 * qa * qc;
        if disc > 0.0 {
            let sqrt_disc = disc.sqrt();
            let mut push = |t: f64| {
                if t > 0.0 && t < 1.0 {
                    out.push(t);
                }
            };
            if qa > 0.0 {
                push((-qb - sqrt_disc) / (2.0 * qa));
                push((-qb + sqrt_disc) / (2.0 * qa));
            } else {
                push((-qb + sqrt_disc) / (2.0 * qa));
                push((-qb - sqrt_disc) / (2.0 * qa));
            }
        }
        out
    }

    /// Chord-sampled length of a parameter sub-range.
    ///
    /// Sixteen chords per extremum-free piece is well inside the error
    /// the callers tolerate; exact arc length is not needed anywhere.
    pub fn arc_len_range(&self, t0: f64, t1: f64) -> f64 {
        if self.is_linear {
            return (self.eval(t1) - self.eval(t0)).hypot();
        }
        let mut len = 0.0;
        let mut prev = self.eval(t0);
        const STEPS: usize = 16;
        for i in 1..=STEPS {
            let t = t0 + (t1 - t0) * (i as f64) / (STEPS as f64);
            let next = self.eval(t);
            len += (next - prev).hypot();
            prev = next;
        }
        len
    }

    /// Chord-sampled length of the whole segment.
    pub fn arc_len(&self) -> f64 {
        self.arc_len_range(0.0, 1.0)
    }

    /// Distance from the chord within which both controls must lie for
    /// the segment to read as a line.
    pub fn close_to_linear(&self, points: &[CurvePoint], tolerance: f64) -> bool {
        if self.is_linear {
            return true;
        }
        let p0 = points[self.from].pos;
        let p1 = points[self.to].pos;
        let chord = p1 - p0;
        let len = chord.hypot();
        if len < 1e-9 {
            // Closed on itself; linear only if the controls collapse too.
            return self.bbox().width() <= tolerance && self.bbox().height() <= tolerance;
        }
        let dir = chord / len;
        // Sample rather than trust the control polygon: degenerate
        // controls with real midpoint deviation exist in the wild.
        for i in 1..8 {
            let p = self.eval(i as f64 / 8.0);
            let off = p - p0;
            if (off.x * dir.y - off.y * dir.x).abs() > tolerance {
                return false;
            }
            let along = off.x * dir.x + off.y * dir.y;
            if along < -tolerance || along > len + tolerance {
                return false;
            }
        }
        true
    }

    /// Signed-area contribution of this segment via Green's theorem.
    ///
    /// Summed over a closed contour this yields the enclosed area,
    /// positive for counter-clockwise winding.
    pub fn area_contribution(&self) -> f64 {
        // integral of (x*y' - y*x') / 2 over [0,1]
        let x = &self.polys[X];
        let y = &self.polys[Y];
        let xc = [x.d, x.c, x.b, x.a];
        let yc = [y.d, y.c, y.b, y.a];
        let dxc = [x.c, 2.0 * x.b, 3.0 * x.a];
        let dyc = [y.c, 2.0 * y.b, 3.0 * y.a];
        let mut total = 0.0;
        for (i, &xi) in xc.iter().enumerate() {
            for (j, &dyj) in dyc.iter().enumerate() {
                total += xi * dyj / ((i + j + 1) as f64);
            }
        }
        for (i, &yi) in yc.iter().enumerate() {
            for (j, &dxj) in dxc.iter().enumerate() {
                total -= yi * dxj / ((i + j + 1) as f64);
            }
        }
        total / 2.0
    }
}

fn chord_polys(p0: Point, p1: Point) -> [AxisPoly; 2] {
    [AxisPoly::line(p0.x, p1.x), AxisPoly::line(p0.y, p1.y)]
}
