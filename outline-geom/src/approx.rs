//! Floating point comparison helpers and shared tolerances.
//!
//! Geometry code in this crate never compares coordinates with `==`;
//! these helpers encode the error budgets everything else is written
//! against.

use kurbo::Vec2;

/// Sub-unit grid coordinates are snapped to after a transform.
pub const SNAP_GRID: f64 = 1.0 / 1024.0;

/// Tight angular tolerance in radians, about 2.9 degrees.
///
/// Used where strict alignment matters: snapping tangents to the axes
/// and matching stem edges.
pub const TIGHT_SLOPE: f64 = 0.0506;

/// Loose angular tolerance in radians, about 18 degrees.
///
/// Used for stub and serif detection where edges meet at shallow angles.
pub const LOOSE_SLOPE: f64 = 0.3142;

/// Returns true if `a` and `b` agree within a relative/absolute hybrid
/// tolerance of 1e-5.
pub fn near(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-5 * a.abs().max(b.abs()).max(1.0)
}

/// Returns true if `a` and `b` differ by no more than `fudge`.
pub fn within(a: f64, b: f64, fudge: f64) -> bool {
    (a - b).abs() <= fudge
}

/// Compares two values by their ratio rather than their difference.
///
/// Zero only matches zero; otherwise the quotient must lie within 1e-5
/// of one. Appropriate when both operands scale with the em size.
pub fn ratio(a: f64, b: f64) -> bool {
    if b == 0.0 {
        a == 0.0
    } else {
        within(a / b, 1.0, 1e-5)
    }
}

/// Signed angle from `a` to `b` in radians, in (-PI, PI].
pub fn angle_between(a: Vec2, b: Vec2) -> f64 {
    a.cross(b).atan2(a.dot(b))
}

/// Returns true if the lines carried by `a` and `b` agree within `tol`
/// radians, ignoring orientation.
pub fn parallel_within(a: Vec2, b: Vec2, tol: f64) -> bool {
    let angle = angle_between(a, b).abs();
    angle <= tol || core::f64::consts::PI - angle <= tol
}

/// Returns true if `a` and `b` point the same way within `tol` radians.
pub fn same_dir_within(a: Vec2, b: Vec2, tol: f64) -> bool {
    angle_between(a, b).abs() <= tol
}

/// Unit vector in the direction of `v`, or `None` when `v` is too short
/// to carry a direction.
pub fn unit(v: Vec2) -> Option<Vec2> {
    let len = v.hypot();
    if len < 1e-12 {
        None
    } else {
        Some(v / len)
    }
}

/// Snaps one coordinate to the [`SNAP_GRID`].
pub fn snap(value: f64) -> f64 {
    (value / SNAP_GRID).round() * SNAP_GRID
}

/// Snaps both coordinates of a point to the [`SNAP_GRID`].
pub fn snap_point(p: kurbo::Point) -> kurbo::Point {
    kurbo::Point::new(snap(p.x), snap(p.y))
}
