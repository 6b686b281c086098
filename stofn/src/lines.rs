//! Runs of points lying on one near-straight line.
//!
//! Stem edges are much more stable when anchored to a whole run of
//! aligned points instead of a single anchor; these groups are built
//! greedily from tangent-compatible points before stem discovery runs.

use kurbo::{Point, Vec2};

use crate::profile::PointProfile;
use crate::Tolerances;

/// An ordered run of points on one line.
#[derive(Clone, Debug)]
pub struct CollinearGroup {
    /// Direction of the line.
    pub unit: Vec2,
    /// A point the line passes through.
    pub online: Point,
    /// Extent of the run along the line.
    pub length: f64,
    /// Member profile indices, ordered along the line.
    pub points: Vec<usize>,
}

/// Which side of a profile joined a group.
#[derive(Copy, Clone, Default)]
struct Used {
    next: bool,
    prev: bool,
}

/// Finds maximal runs of collinear points.
///
/// A point joins a candidate line when it lies within the stem distance
/// error of it and one of its tangents is parallel within the tight
/// tier. Each point side seeds or joins at most one group.
pub(crate) fn find_collinear_groups(
    profiles: &[PointProfile],
    tol: &Tolerances,
) -> Vec<CollinearGroup> {
    let mut groups = Vec::with_capacity(2 * profiles.len());
    let mut used = vec![Used::default(); profiles.len()];
    for seed_ix in 0..profiles.len() {
        for next_side in [true, false] {
            let seed = &profiles[seed_ix];
            let unit = if next_side {
                seed.next_unit
            } else {
                seed.prev_unit
            };
            if unit == Vec2::ZERO {
                continue;
            }
            if next_side && used[seed_ix].next || !next_side && used[seed_ix].prev {
                continue;
            }
            let dist_error = line_dist_error(unit, tol);
            let mut members: Vec<(f64, usize, bool, bool)> = Vec::new();
            for (ix, other) in profiles.iter().enumerate() {
                let offset = other.pos - seed.pos;
                let across = offset.x * unit.y - offset.y * unit.x;
                if across.abs() > dist_error {
                    continue;
                }
                let next_fits = !used[ix].next
                    && other.next_unit != Vec2::ZERO
                    && outline_geom::approx::parallel_within(
                        other.next_unit,
                        unit,
                        tol.slope_error,
                    );
                let prev_fits = !used[ix].prev
                    && other.prev_unit != Vec2::ZERO
                    && outline_geom::approx::parallel_within(
                        other.prev_unit,
                        unit,
                        tol.slope_error,
                    );
                if next_fits || prev_fits {
                    members.push((offset.dot(unit), ix, next_fits, prev_fits));
                }
            }
            if members.len() < 2 {
                continue;
            }
            members.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(core::cmp::Ordering::Equal));
            for &(_, ix, next_fits, prev_fits) in &members {
                if next_fits {
                    used[ix].next = true;
                }
                if prev_fits {
                    used[ix].prev = true;
                }
            }
            let length = members.last().unwrap().0 - members.first().unwrap().0;
            groups.push(CollinearGroup {
                unit,
                online: seed.pos,
                length,
                points: members.iter().map(|&(_, ix, _, _)| ix).collect(),
            });
        }
    }
    groups
}

fn line_dist_error(unit: Vec2, tol: &Tolerances) -> f64 {
    if unit.x.abs() < 1e-9 || unit.y.abs() < 1e-9 {
        tol.dist_error_hv
    } else {
        tol.dist_error_diag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::build_profiles;
    use outline_geom::{MonoRing, Outline};

    fn groups_for(outline: &Outline) -> Vec<CollinearGroup> {
        let tol = Tolerances::new(1000.0);
        let ring = MonoRing::build(outline);
        let profiles = build_profiles(outline, &ring, &tol);
        find_collinear_groups(&profiles, &tol)
    }

    #[test]
    fn rectangle_edges_form_four_groups() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.line_to(Point::new(100.0, 0.0));
        pen.line_to(Point::new(100.0, 200.0));
        pen.line_to(Point::new(0.0, 200.0));
        pen.close();
        let outline = pen.build();
        let groups = groups_for(&outline);
        assert_eq!(groups.len(), 4);
        for group in &groups {
            assert_eq!(group.points.len(), 2);
        }
        // The bottom edge group runs horizontally for the full width.
        let bottom = groups
            .iter()
            .find(|g| g.unit.y.abs() < 1e-9 && g.online.y == 0.0)
            .unwrap();
        assert!((bottom.length - 100.0).abs() < 1e-9);
    }

    #[test]
    fn nearly_aligned_points_share_a_group() {
        // Left edge broken by a midpoint two units off the line: inside
        // the diagonal error, outside the hv error.
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.line_to(Point::new(100.0, 0.0));
        pen.line_to(Point::new(100.0, 200.0));
        pen.line_to(Point::new(0.0, 200.0));
        pen.line_to(Point::new(-1.0, 100.0));
        pen.close();
        let outline = pen.build();
        let groups = groups_for(&outline);
        // The two long left-side segments are nearly vertical and the
        // three points involved group together.
        let left = groups
            .iter()
            .find(|g| g.points.len() == 3)
            .expect("a three-point group");
        assert!(left.unit.x.abs() < 0.02);
    }
}
