//! Per-point derived data: tangents, collinearity, symmetry and
//! extremum classification.
//!
//! Built once per analysis run, indexed by the glyph-local point index.
//! Everything downstream — collinear groups, stem discovery, masks —
//! reads these profiles instead of re-deriving geometry.

use arrayvec::ArrayVec;
use kurbo::{Point, Vec2};
use outline_geom::{approx, Curve, MonoRing, Outline, X, Y};

use crate::Tolerances;

/// A candidate opposite-edge crossing for one point.
#[derive(Copy, Clone, Debug)]
pub struct EdgeHit {
    pub curve: usize,
    pub t: f64,
    pub dist: f64,
}

/// A stem assignment on one side of a point, tagged with which of the
/// stem's two edges the point supports.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StemRef {
    pub stem: usize,
    pub left_edge: bool,
}

/// Derived tangent and classification data for one contour point.
#[derive(Clone, Debug)]
pub struct PointProfile {
    /// Index of the point in the outline arena.
    pub point: usize,
    pub pos: Point,
    /// Unit tangent leaving the point along its outgoing segment.
    pub next_unit: Vec2,
    /// Unit tangent leaving the point backward along its incoming
    /// segment.
    pub prev_unit: Vec2,
    /// The two tangents are nearly antiparallel.
    pub colinear: bool,
    /// Tangents mirror across a horizontal axis.
    pub symmetrical_h: bool,
    /// Tangents mirror across a vertical axis.
    pub symmetrical_v: bool,
    /// 0 none, 1 outer minimum, 2 outer maximum along x.
    pub x_extr: u8,
    /// 0 none, 1 outer minimum, 2 outer maximum along y.
    pub y_extr: u8,
    /// Like `x_extr` but the point turns a corner there.
    pub x_corner: u8,
    pub y_corner: u8,
    /// Opposite-edge candidates along the outgoing direction.
    pub next_hits: ArrayVec<EdgeHit, 2>,
    /// Opposite-edge candidates along the incoming direction.
    pub prev_hits: ArrayVec<EdgeHit, 2>,
    /// Stems this point supports on its outgoing side.
    pub next_stems: Vec<StemRef>,
    /// Stems this point supports on its incoming side.
    pub prev_stems: Vec<StemRef>,
    /// Index into the combined stem lists, or -1 when unset.
    pub preferred: i32,
}

impl PointProfile {
    fn new(point: usize, pos: Point) -> Self {
        Self {
            point,
            pos,
            next_unit: Vec2::ZERO,
            prev_unit: Vec2::ZERO,
            colinear: false,
            symmetrical_h: false,
            symmetrical_v: false,
            x_extr: 0,
            y_extr: 0,
            x_corner: 0,
            y_corner: 0,
            next_hits: ArrayVec::new(),
            prev_hits: ArrayVec::new(),
            next_stems: Vec::new(),
            prev_stems: Vec::new(),
            preferred: -1,
        }
    }

    /// All stems assigned to the point, next side first.
    pub fn assigned_stems(&self) -> impl Iterator<Item = StemRef> + '_ {
        self.next_stems
            .iter()
            .chain(self.prev_stems.iter())
            .copied()
    }

    pub fn is_assigned(&self, stem: usize) -> bool {
        self.assigned_stems().any(|r| r.stem == stem)
    }
}

/// Builds the profile table for an outline.
///
/// The returned vector is indexed by point arena index and sized up
/// front; later passes store cross-references into it.
pub(crate) fn build_profiles(
    outline: &Outline,
    ring: &MonoRing,
    tol: &Tolerances,
) -> Vec<PointProfile> {
    let mut profiles = Vec::with_capacity(outline.points.len());
    for (pi, point) in outline.points.iter().enumerate() {
        let mut profile = PointProfile::new(pi, point.pos);
        profile.next_unit = out_tangent(outline, pi, tol);
        profile.prev_unit = in_tangent(outline, pi, tol);
        // Open contour endpoints borrow the companion side.
        if profile.next_unit == Vec2::ZERO && profile.prev_unit != Vec2::ZERO {
            profile.next_unit = -profile.prev_unit;
        }
        if profile.prev_unit == Vec2::ZERO && profile.next_unit != Vec2::ZERO {
            profile.prev_unit = -profile.next_unit;
        }
        classify_tangent_pair(&mut profile, tol);
        profiles.push(profile);
    }
    classify_extrema(outline, ring, &mut profiles, tol);
    profiles
}

/// Tangent leaving the point along its outgoing segment.
fn out_tangent(outline: &Outline, pi: usize, tol: &Tolerances) -> Vec2 {
    let point = &outline.points[pi];
    let Some(si) = point.next else {
        return Vec2::ZERO;
    };
    let curve = &outline.curves[si];
    let far = &outline.points[curve.to];
    let nominal = if !point.next_ctrl_degenerate() {
        approx::unit(point.next_ctrl - point.pos)
    } else {
        approx::unit(far.pos - point.pos)
    };
    refine_tangent(curve, point.pos, 0.25, nominal, point.next_ctrl_degenerate(), tol)
}

/// Tangent leaving the point backward along its incoming segment.
fn in_tangent(outline: &Outline, pi: usize, tol: &Tolerances) -> Vec2 {
    let point = &outline.points[pi];
    let Some(si) = point.prev else {
        return Vec2::ZERO;
    };
    let curve = &outline.curves[si];
    let far = &outline.points[curve.from];
    let nominal = if !point.prev_ctrl_degenerate() {
        approx::unit(point.prev_ctrl - point.pos)
    } else {
        approx::unit(far.pos - point.pos)
    };
    refine_tangent(curve, point.pos, 0.75, nominal, point.prev_ctrl_degenerate(), tol)
}

/// Applies the optical-slope correction and axis snapping.
///
/// When the nominal control is degenerate but the segment truly curves,
/// a sampled interior point reveals the direction the eye sees; either
/// way, tangents within the tight tier of an axis snap exactly onto it.
fn refine_tangent(
    curve: &Curve,
    pos: Point,
    sample_t: f64,
    nominal: Option<Vec2>,
    ctrl_degenerate: bool,
    tol: &Tolerances,
) -> Vec2 {
    let mut unit = nominal.unwrap_or(Vec2::ZERO);
    if ctrl_degenerate && !curve.is_linear {
        if let Some(sampled) = approx::unit(curve.eval(sample_t) - pos) {
            if unit == Vec2::ZERO
                || approx::angle_between(unit, sampled).abs() > tol.slope_error
            {
                unit = sampled;
            }
        }
    }
    snap_to_axis(unit, tol)
}

fn snap_to_axis(unit: Vec2, tol: &Tolerances) -> Vec2 {
    if unit == Vec2::ZERO {
        return unit;
    }
    let snap_sin = tol.slope_error.sin();
    if unit.y.abs() <= snap_sin {
        Vec2::new(unit.x.signum(), 0.0)
    } else if unit.x.abs() <= snap_sin {
        Vec2::new(0.0, unit.y.signum())
    } else {
        unit
    }
}

fn classify_tangent_pair(profile: &mut PointProfile, tol: &Tolerances) {
    let next = profile.next_unit;
    let prev = profile.prev_unit;
    if next == Vec2::ZERO || prev == Vec2::ZERO {
        return;
    }
    profile.colinear =
        approx::parallel_within(next, prev, tol.slope_error) && next.dot(prev) < 0.0;
    if profile.colinear {
        return;
    }
    let mirror_sin = tol.stub_slope_error.sin();
    // Mirrored across a vertical axis: the shape of a 'v' bottom.
    profile.symmetrical_v = (next.x + prev.x).abs() <= mirror_sin
        && (next.y - prev.y).abs() <= mirror_sin
        && next.y.abs() > mirror_sin;
    // Mirrored across a horizontal axis: a leftward or rightward bend.
    profile.symmetrical_h = (next.y + prev.y).abs() <= mirror_sin
        && (next.x - prev.x).abs() <= mirror_sin
        && next.x.abs() > mirror_sin;
}

/// Marks outer extrema and extremal corners using the winding partition
/// at each candidate's coordinate.
fn classify_extrema(
    outline: &Outline,
    ring: &MonoRing,
    profiles: &mut [PointProfile],
    tol: &Tolerances,
) {
    let snap_sin = tol.slope_error.sin();
    for profile in profiles.iter_mut() {
        if profile.next_unit == Vec2::ZERO && profile.prev_unit == Vec2::ZERO {
            continue;
        }
        let point = &outline.points[profile.point];
        // Endpoints of open contours are extremes of their stroke even
        // though their synthetic companion tangent reads as collinear.
        let open_end = point.next.is_none() || point.prev.is_none();
        let corner_ok = !profile.colinear || open_end;
        let next_probe = point
            .next
            .map(|si| outline.curves[si].eval(0.25))
            .unwrap_or(profile.pos);
        let prev_probe = point
            .prev
            .map(|si| outline.curves[si].eval(0.75))
            .unwrap_or(profile.pos);
        let pos = profile.pos;
        let flat_next = profile.next_unit.y.abs() <= snap_sin;
        let flat_prev = profile.prev_unit.y.abs() <= snap_sin;
        let upright_next = profile.next_unit.x.abs() <= snap_sin;
        let upright_prev = profile.prev_unit.x.abs() <= snap_sin;
        // y extrema: both neighbors on one side, ties allowed so flat
        // runs keep their end points.
        if pos.y >= next_probe.y - 1e-9 && pos.y >= prev_probe.y - 1e-9 {
            if outer_beyond(outline, ring, pos, Y, true) {
                if flat_next || flat_prev {
                    profile.y_extr = 2;
                } else if corner_ok {
                    profile.y_corner = 2;
                }
            }
        } else if pos.y <= next_probe.y + 1e-9 && pos.y <= prev_probe.y + 1e-9 {
            if outer_beyond(outline, ring, pos, Y, false) {
                if flat_next || flat_prev {
                    profile.y_extr = 1;
                } else if corner_ok {
                    profile.y_corner = 1;
                }
            }
        }
        if pos.x >= next_probe.x - 1e-9 && pos.x >= prev_probe.x - 1e-9 {
            if outer_beyond(outline, ring, pos, X, true) {
                if upright_next || upright_prev {
                    profile.x_extr = 2;
                } else if corner_ok {
                    profile.x_corner = 2;
                }
            }
        } else if pos.x <= next_probe.x + 1e-9 && pos.x <= prev_probe.x + 1e-9 {
            if outer_beyond(outline, ring, pos, X, false) {
                if upright_next || upright_prev {
                    profile.x_extr = 1;
                } else if corner_ok {
                    profile.x_corner = 1;
                }
            }
        }
    }
}

/// True when the region just beyond `pos` along `dim` (toward +∞ for a
/// maximum, -∞ for a minimum) is outside the filled outline.
fn outer_beyond(
    outline: &Outline,
    ring: &MonoRing,
    pos: Point,
    dim: usize,
    toward_max: bool,
) -> bool {
    // The query line runs along `dim`, held at the cross coordinate.
    let (line_dim, line_value, probe) = if dim == Y {
        (X, pos.x, pos.y)
    } else {
        (Y, pos.y, pos.x)
    };
    let hits = ring.find_at(&outline.curves, line_dim, line_value);
    let fudge = 0.5;
    let coord = if toward_max {
        probe + fudge
    } else {
        probe - fudge
    };
    ring.winding_before(&hits, line_dim, coord) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tolerances;
    use outline_geom::MonoRing;

    fn profiles_for(outline: &Outline) -> Vec<PointProfile> {
        let ring = MonoRing::build(outline);
        build_profiles(outline, &ring, &Tolerances::new(1000.0))
    }

    fn rectangle() -> Outline {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.line_to(Point::new(100.0, 0.0));
        pen.line_to(Point::new(100.0, 200.0));
        pen.line_to(Point::new(0.0, 200.0));
        pen.close();
        pen.build()
    }

    #[test]
    fn rectangle_corners_classify() {
        let outline = rectangle();
        let profiles = profiles_for(&outline);
        // (0,0): outgoing right, incoming (backward) up.
        assert_eq!(profiles[0].next_unit, Vec2::new(1.0, 0.0));
        assert_eq!(profiles[0].prev_unit, Vec2::new(0.0, 1.0));
        assert!(!profiles[0].colinear);
        // Every corner is an outer extremum on both axes.
        assert_eq!(profiles[0].x_extr, 1);
        assert_eq!(profiles[0].y_extr, 1);
        assert_eq!(profiles[2].x_extr, 2);
        assert_eq!(profiles[2].y_extr, 2);
    }

    #[test]
    fn hole_extrema_are_not_outer() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.line_to(Point::new(300.0, 0.0));
        pen.line_to(Point::new(300.0, 300.0));
        pen.line_to(Point::new(0.0, 300.0));
        pen.close();
        // Hole wound clockwise.
        pen.move_to(Point::new(100.0, 100.0));
        pen.line_to(Point::new(100.0, 200.0));
        pen.line_to(Point::new(200.0, 200.0));
        pen.line_to(Point::new(200.0, 100.0));
        pen.close();
        let outline = pen.build();
        let profiles = profiles_for(&outline);
        // The hole's top edge points look like maxima locally but sit
        // inside ink; no outer flag.
        for profile in &profiles[4..] {
            assert_eq!(profile.y_extr, 0, "hole point {}", profile.point);
        }
        // The outer contour's flags survive.
        assert_eq!(profiles[0].y_extr, 1);
    }

    #[test]
    fn midpoint_on_a_straight_edge_is_colinear() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.line_to(Point::new(50.0, 0.0));
        pen.line_to(Point::new(100.0, 0.0));
        pen.line_to(Point::new(100.0, 100.0));
        pen.line_to(Point::new(0.0, 100.0));
        pen.close();
        let outline = pen.build();
        let profiles = profiles_for(&outline);
        assert!(profiles[1].colinear);
        assert!(!profiles[0].colinear);
    }

    #[test]
    fn v_bottom_is_symmetric() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 100.0));
        pen.line_to(Point::new(50.0, 0.0));
        pen.line_to(Point::new(100.0, 100.0));
        pen.line_to(Point::new(0.0, 100.0));
        pen.close();
        let outline = pen.build();
        let profiles = profiles_for(&outline);
        let apex = &profiles[1];
        assert!(apex.symmetrical_v);
        assert!(!apex.symmetrical_h);
    }

    #[test]
    fn shallow_tangents_snap_to_the_axes() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        // One unit of rise over one hundred: inside the tight tier.
        pen.line_to(Point::new(100.0, 1.0));
        pen.line_to(Point::new(100.0, 100.0));
        pen.line_to(Point::new(0.0, 100.0));
        pen.close();
        let outline = pen.build();
        let profiles = profiles_for(&outline);
        assert_eq!(profiles[0].next_unit, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn single_point_contour_profiles_cleanly() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(10.0, 10.0));
        pen.close();
        let outline = pen.build();
        let profiles = profiles_for(&outline);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].next_unit, Vec2::ZERO);
        assert!(!profiles[0].colinear);
        assert!(profiles[0].next_hits.is_empty());
    }
}
