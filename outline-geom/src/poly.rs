//! Per-axis cubic polynomials: evaluation, extrema and root solving.

use arrayvec::ArrayVec;

/// One axis of a parametric curve segment: `a*t^3 + b*t^2 + c*t + d`.
///
/// Lines and quadratics are stored with the leading coefficients at
/// zero, so every segment kind shares one representation.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AxisPoly {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

/// Coefficients smaller than this, relative to the polynomial's own
/// magnitude, collapse the effective degree.
const COEF_EPSILON: f64 = 1e-9;

impl AxisPoly {
    pub fn line(p0: f64, p1: f64) -> Self {
        Self {
            a: 0.0,
            b: 0.0,
            c: p1 - p0,
            d: p0,
        }
    }

    pub fn quadratic(p0: f64, ctrl: f64, p1: f64) -> Self {
        Self {
            a: 0.0,
            b: p1 - 2.0 * ctrl + p0,
            c: 2.0 * (ctrl - p0),
            d: p0,
        }
    }

    pub fn cubic(p0: f64, ctrl0: f64, ctrl1: f64, p1: f64) -> Self {
        Self {
            a: p1 - p0 + 3.0 * (ctrl0 - ctrl1),
            b: 3.0 * (p0 - 2.0 * ctrl0 + ctrl1),
            c: 3.0 * (ctrl0 - p0),
            d: p0,
        }
    }

    pub fn eval(&self, t: f64) -> f64 {
        ((self.a * t + self.b) * t + self.c) * t + self.d
    }

    pub fn deriv(&self, t: f64) -> f64 {
        (3.0 * self.a * t + 2.0 * self.b) * t + self.c
    }

    pub fn second_deriv(&self, t: f64) -> f64 {
        6.0 * self.a * t + 2.0 * self.b
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite() && self.d.is_finite()
    }

    fn magnitude(&self) -> f64 {
        self.a
            .abs()
            .max(self.b.abs())
            .max(self.c.abs())
            .max(self.d.abs())
            .max(1.0)
    }

    /// Effective degree once negligible leading coefficients collapse.
    pub fn degree(&self) -> usize {
        let scale = self.magnitude();
        if self.a.abs() > COEF_EPSILON * scale {
            3
        } else if self.b.abs() > COEF_EPSILON * scale {
            2
        } else if self.c.abs() > COEF_EPSILON * scale {
            1
        } else {
            0
        }
    }

    /// Interior parameters where the derivative vanishes, in order.
    ///
    /// These are the curve's extrema along this axis; at most two for a
    /// cubic, at most one for a quadratic.
    pub fn extrema(&self) -> ArrayVec<f64, 2> {
        let mut out = ArrayVec::new();
        // derivative: 3a*t^2 + 2b*t + c
        let qa = 3.0 * self.a;
        let qb = 2.0 * self.b;
        let qc = self.c;
        let scale = self.magnitude();
        if qa.abs() <= COEF_EPSILON * scale {
            if qb.abs() > COEF_EPSILON * scale {
                push_interior(&mut out, -qc / qb);
            }
            return out;
        }
        let disc = qb * qb - 4.0 * qa * qc;
        if disc > 0.0 {
            let sqrt_disc = disc.sqrt();
            let (t0, t1) = if qa > 0.0 {
                ((-qb - sqrt_disc) / (2.0 * qa), (-qb + sqrt_disc) / (2.0 * qa))
            } else {
                ((-qb + sqrt_disc) / (2.0 * qa), (-qb - sqrt_disc) / (2.0 * qa))
            };
            push_interior(&mut out, t0);
            push_interior(&mut out, t1);
        } else if disc == 0.0 {
            push_interior(&mut out, -qb / (2.0 * qa));
        }
        out
    }

    /// All real roots of `self(t) == v` by the closed form.
    ///
    /// Roots are not clamped to the parameter range. The closed form is
    /// fast but loses digits near t=0 and t=1; prefer [`AxisPoly::solve`]
    /// when the result feeds further geometry.
    pub fn roots(&self, v: f64) -> ArrayVec<f64, 3> {
        let mut result = ArrayVec::new();
        let scale = self.magnitude();
        let (a, b, c, d) = (self.a, self.b, self.c, self.d - v);
        if a.abs() <= COEF_EPSILON * scale {
            if b.abs() <= COEF_EPSILON * scale {
                if c.abs() > COEF_EPSILON * scale {
                    result.push(-d / c);
                }
                return result;
            }
            // quadratic
            let disc = c * c - 4.0 * b * d;
            if disc > 0.0 {
                let sqrt_disc = disc.sqrt();
                result.push((-c - sqrt_disc) / (2.0 * b));
                result.push((-c + sqrt_disc) / (2.0 * b));
            } else if disc == 0.0 {
                result.push(-c / (2.0 * b));
            }
            return result;
        }
        // Cardano on the normalized cubic.
        let bn = b / a;
        let cn = c / a;
        let dn = d / a;
        let frac_1_3 = 1.0 / 3.0;
        let delta0 = (3.0 * cn - bn * bn) / 9.0;
        let delta1 = (9.0 * bn * cn - 27.0 * dn - 2.0 * bn * bn * bn) / 54.0;
        let disc = delta0 * delta0 * delta0 + delta1 * delta1;
        if disc >= 0.0 {
            let s = (delta1 + disc.sqrt()).cbrt();
            let t = (delta1 - disc.sqrt()).cbrt();
            result.push(-bn * frac_1_3 + s + t);
            if (s - t).abs() < 1e-12 && s + t != 0.0 {
                result.push(-bn * frac_1_3 - (s + t) / 2.0);
            }
        } else {
            let theta = (delta1 / (-delta0 * delta0 * delta0).sqrt()).acos();
            let two_sqrt_delta0 = 2.0 * (-delta0).sqrt();
            use core::f64::consts::PI;
            result.push(two_sqrt_delta0 * (theta * frac_1_3).cos() - bn * frac_1_3);
            result.push(two_sqrt_delta0 * ((theta + 2.0 * PI) * frac_1_3).cos() - bn * frac_1_3);
            result.push(two_sqrt_delta0 * ((theta + 4.0 * PI) * frac_1_3).cos() - bn * frac_1_3);
        }
        result
    }

    /// Parameters in [0, 1] where the polynomial takes the value `v`,
    /// in increasing order.
    ///
    /// Subdivides at the extrema and bisects each monotonic piece, which
    /// stays accurate where the closed form suffers cancellation near the
    /// ends of the range.
    pub fn solve(&self, v: f64) -> ArrayVec<f64, 3> {
        let mut out = ArrayVec::new();
        let flat = 1e-9 * self.magnitude();
        let mut bounds: ArrayVec<f64, 4> = ArrayVec::new();
        bounds.push(0.0);
        for t in self.extrema() {
            bounds.push(t);
        }
        bounds.push(1.0);
        let mut lo = bounds[0];
        let mut f_lo = self.eval(lo) - v;
        for &hi in &bounds[1..] {
            let f_hi = self.eval(hi) - v;
            if f_lo.abs() <= flat {
                push_root(&mut out, lo);
            } else if f_lo * f_hi < 0.0 {
                push_root(&mut out, self.bisect(v, lo, hi, f_lo));
            }
            lo = hi;
            f_lo = f_hi;
        }
        if f_lo.abs() <= flat {
            push_root(&mut out, 1.0);
        }
        out
    }

    fn bisect(&self, v: f64, mut lo: f64, mut hi: f64, f_lo: f64) -> f64 {
        let lo_negative = f_lo < 0.0;
        for _ in 0..64 {
            let mid = 0.5 * (lo + hi);
            let f = self.eval(mid) - v;
            if f == 0.0 {
                return mid;
            }
            if (f < 0.0) == lo_negative {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }
}

fn push_interior(out: &mut ArrayVec<f64, 2>, t: f64) {
    if t > 0.0 && t < 1.0 && !out.iter().any(|&seen| (seen - t).abs() < 1e-12) {
        let pos = out.iter().position(|&seen| seen > t).unwrap_or(out.len());
        out.insert(pos, t);
    }
}

fn push_root(out: &mut ArrayVec<f64, 3>, t: f64) {
    if out.iter().any(|&seen| (seen - t).abs() < 1e-9) {
        return;
    }
    if !out.is_full() {
        out.push(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_agrees_with_sampling() {
        let poly = AxisPoly::cubic(10.0, 40.0, 80.0, 100.0);
        assert_eq!(poly.eval(0.0), 10.0);
        assert!((poly.eval(1.0) - 100.0).abs() < 1e-12);
        let quad = AxisPoly::quadratic(0.0, 50.0, 100.0);
        assert!((quad.eval(0.5) - 50.0).abs() < 1e-12);
        let line = AxisPoly::line(-5.0, 5.0);
        assert_eq!(line.eval(0.5), 0.0);
    }

    #[test]
    fn extrema_of_a_bump() {
        // symmetric quadratic peaking at t = 0.5
        let poly = AxisPoly::quadratic(0.0, 100.0, 0.0);
        let ex = poly.extrema();
        assert_eq!(ex.len(), 1);
        assert!((ex[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn closed_form_and_bisection_agree() {
        let poly = AxisPoly::cubic(0.0, 10.0, 90.0, 100.0);
        for &t0 in &[0.1, 0.25, 0.5, 0.75, 0.9] {
            let v = poly.eval(t0);
            let stable = poly.solve(v);
            assert!(
                stable.iter().any(|&t| (t - t0).abs() < 1e-4),
                "no stable root near {t0}"
            );
            let closed = poly.roots(v);
            assert!(closed.iter().any(|&t| (t - t0).abs() < 1e-4));
        }
    }

    #[test]
    fn solve_near_the_ends() {
        // The motivating case for the bisected path: values sitting very
        // close to the ends of the parameter range.
        let poly = AxisPoly::cubic(0.0, 1.0, 3.0, 700.0);
        for &t0 in &[1e-4, 1.0 - 1e-4] {
            let v = poly.eval(t0);
            let roots = poly.solve(v);
            assert!(roots.iter().any(|&t| (t - t0).abs() < 1e-4));
        }
    }

    #[test]
    fn solve_returns_every_crossing_of_a_wiggle() {
        // Cubic that crosses its midline three times.
        let poly = AxisPoly::cubic(0.0, 200.0, -100.0, 100.0);
        let roots = poly.solve(50.0);
        assert_eq!(roots.len(), 3);
        for &t in &roots {
            assert!((poly.eval(t) - 50.0).abs() < 1e-6);
        }
        for pair in roots.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn degenerate_degrees() {
        assert_eq!(AxisPoly::line(0.0, 1.0).degree(), 1);
        assert_eq!(AxisPoly::quadratic(0.0, 25.0, 100.0).degree(), 2);
        // control points on the chord at the uniform spacing degrade the
        // cubic algebraically
        let flat = AxisPoly::cubic(0.0, 100.0 / 3.0, 200.0 / 3.0, 100.0);
        assert!(flat.degree() <= 1);
        assert_eq!(AxisPoly::line(5.0, 5.0).degree(), 0);
    }
}
