//! Stem discovery: the analyzer's core loop and the special-case
//! synthesizers that follow it.
//!
//! For every point that still lacks an opposite edge in a direction it
//! needs one, [`find_matching_edge`] locates the first compatible
//! crossing — through the winding machinery for axis-aligned candidates,
//! by a perturbed normal ray otherwise — and [`build_stem`] either
//! attaches the pair to an existing hypothesis or opens a new one. The
//! later passes normalize stubs, synthesize ghost, bounding-box and
//! corner stems, and fold in any pre-existing hints.

use kurbo::{Point, Vec2};
use log::trace;
use outline_geom::{approx, intersect, Curve, CurvePoint, X, Y};

use crate::analyzer::Analyzer;
use crate::profile::{EdgeHit, StemRef};
use crate::stem::{normalize_half_plane, StemChunk, StemHypothesis};

/// Runs the core discovery loop over every point and side.
pub(crate) fn detect_stems(az: &mut Analyzer) {
    for pi in 0..az.profiles.len() {
        for next_side in [true, false] {
            let profile = &az.profiles[pi];
            let dir = if next_side {
                profile.next_unit
            } else {
                profile.prev_unit
            };
            if dir == Vec2::ZERO {
                continue;
            }
            let already = if next_side {
                !profile.next_stems.is_empty()
            } else {
                !profile.prev_stems.is_empty()
            };
            if already {
                continue;
            }
            let Some((hit, winding_ok)) = find_matching_edge(az, pi, dir, next_side) else {
                continue;
            };
            let profile = &mut az.profiles[pi];
            let hits = if next_side {
                &mut profile.next_hits
            } else {
                &mut profile.prev_hits
            };
            if !hits.is_full() {
                hits.push(hit);
            }
            build_stem(az, pi, next_side, dir, hit, winding_ok);
        }
    }
}

/// Finds the first curve crossing compatible with a stem through `pi`.
///
/// Axis-aligned candidates use the winding query directly; diagonal ones
/// cast a perturbed normal ray. The primary search looks into the ink
/// (left of travel) for an antiparallel edge; when that fails, a
/// fallback accepts any nearly parallel edge on either side, flagged as
/// not winding-compatible.
pub(crate) fn find_matching_edge(
    az: &Analyzer,
    pi: usize,
    dir: Vec2,
    next_side: bool,
) -> Option<(EdgeHit, bool)> {
    let travel = if next_side { dir } else { -dir };
    let norm = Vec2::new(-travel.y, travel.x);
    if dir.x == 0.0 || dir.y == 0.0 {
        axis_edge_search(az, pi, travel, norm)
    } else {
        ray_edge_search(az, pi, travel, norm)
    }
}

fn axis_edge_search(
    az: &Analyzer,
    pi: usize,
    travel: Vec2,
    norm: Vec2,
) -> Option<(EdgeHit, bool)> {
    let pos = az.profiles[pi].pos;
    // The query line is perpendicular to the edge through the point.
    let (line_dim, line_value, probe, along) = if travel.y == 0.0 {
        // Horizontal edge: cast a vertical line, walk hits in y.
        (X, pos.x, pos.y, norm.y)
    } else {
        (Y, pos.y, pos.x, norm.x)
    };
    let hits = az.ring.find_at(&az.outline.curves, line_dim, line_value);
    let mut best: Option<(EdgeHit, bool)> = None;
    let mut fallback: Option<EdgeHit> = None;
    for hit in &hits {
        let span = &az.ring.spans[hit.span];
        let dist = (hit.coord - probe) * along;
        if dist.abs() < 1e-3 {
            // Our own position.
            continue;
        }
        let tangent = match approx::unit(az.outline.curves[span.curve].deriv(hit.t)) {
            Some(t) => t,
            None => continue,
        };
        if !approx::parallel_within(tangent, travel, az.tol.stub_slope_error) {
            continue;
        }
        let edge_hit = EdgeHit {
            curve: span.curve,
            t: hit.t,
            dist: dist.abs(),
        };
        if dist > 0.0 && tangent.dot(travel) < 0.0 {
            // Ink side, opposite winding: the real thing.
            if best.as_ref().map_or(true, |(b, _)| edge_hit.dist < b.dist) {
                best = Some((edge_hit, true));
            }
        } else if fallback.as_ref().map_or(true, |b| edge_hit.dist < b.dist) {
            fallback = Some(edge_hit);
        }
    }
    best.or(fallback.map(|hit| (hit, false)))
}

fn ray_edge_search(
    az: &Analyzer,
    pi: usize,
    travel: Vec2,
    norm: Vec2,
) -> Option<(EdgeHit, bool)> {
    let profile = &az.profiles[pi];
    let point = &az.outline.points[profile.point];
    let own = [point.next, point.prev];
    let reach = 2.0 * az.metrics.units_per_em;
    let mut result: Option<(EdgeHit, bool)> = None;
    for side in [1.0, -1.0] {
        let ray_dir = tilt(norm * side, 1e-3);
        let ray = synthetic_line(
            profile.pos + ray_dir * 1e-3,
            profile.pos + ray_dir * reach,
        );
        let mut best: Option<(EdgeHit, bool)> = None;
        for (ci, curve) in az.outline.curves.iter().enumerate() {
            if own.contains(&Some(ci)) {
                continue;
            }
            let Some(hits) = intersect::intersect_curves(&ray, curve) else {
                continue;
            };
            for hit in hits {
                let tangent = match approx::unit(curve.deriv(hit.t_b)) {
                    Some(t) => t,
                    None => continue,
                };
                if !approx::parallel_within(tangent, travel, az.tol.stub_slope_error) {
                    continue;
                }
                let dist = (hit.pos - profile.pos).hypot();
                let winding_ok = side > 0.0 && tangent.dot(travel) < 0.0;
                let edge_hit = EdgeHit {
                    curve: ci,
                    t: hit.t_b,
                    dist,
                };
                if best.as_ref().map_or(true, |(b, _)| dist < b.dist) {
                    best = Some((edge_hit, winding_ok));
                }
            }
        }
        match best {
            Some((hit, true)) => return Some((hit, true)),
            Some((hit, false)) if result.is_none() => result = Some((hit, false)),
            _ => {}
        }
    }
    result
}

fn tilt(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

fn synthetic_line(p0: Point, p1: Point) -> Curve {
    let points = [CurvePoint::new(p0), CurvePoint::new(p1)];
    let mut curve = Curve::new(0, 1, false);
    curve.refigure(&points);
    curve
}

/// Classifies a crossing and attaches or creates a stem for it.
///
/// Returns the index of the stem the pair landed on, if any.
pub(crate) fn build_stem(
    az: &mut Analyzer,
    pi: usize,
    next_side: bool,
    dir: Vec2,
    hit: EdgeHit,
    winding_ok: bool,
) -> Option<usize> {
    let tangent = approx::unit(az.outline.curves[hit.curve].deriv(hit.t))?;
    let clean = approx::parallel_within(tangent, dir, az.tol.slope_error);
    let stub = !clean && is_stub_or_intersection(az, dir, hit);
    let mut potential_opposite = !winding_ok;
    let opp_point = if clean || stub {
        nearest_endpoint(az, hit)
    } else {
        // Degenerate single-sided match: look for a point on the
        // opposite curve sharing the candidate's tangent direction.
        potential_opposite = true;
        half_stem_anchor(az, dir, hit)?
    };
    if opp_point == pi {
        return None;
    }
    let pos = az.profiles[pi].pos;
    let opp_pos = az.profiles[opp_point].pos;
    let unit = normalize_half_plane(dir);
    let l_to_r = Vec2::new(unit.y, -unit.x);
    let self_left = (opp_pos - pos).dot(l_to_r) > 0.0;
    let (left_profile, right_profile) = if self_left {
        (pi, opp_point)
    } else {
        (opp_point, pi)
    };
    let left_pos = az.profiles[left_profile].pos;
    let right_pos = az.profiles[right_profile].pos;
    let si = match find_stem_for_pair(az, unit, left_pos, right_pos) {
        Some(si) => {
            let stem = &mut az.stems[si];
            stem.adopt_left(left_pos);
            stem.adopt_right(right_pos);
            si
        }
        None => {
            let mut stem = StemHypothesis::new(unit, left_pos, right_pos);
            stem.italic = az.matches_italic(unit);
            az.stems.push(stem);
            az.stems.len() - 1
        }
    };
    let is_ball = stub && both_sides_curved(az, left_profile, right_profile);
    let (l_potential, r_potential) = if self_left {
        (false, potential_opposite)
    } else {
        (potential_opposite, false)
    };
    let chunk = StemChunk {
        l: Some(left_profile),
        r: Some(right_profile),
        l_potential,
        r_potential,
        stub,
        is_ball,
    };
    push_chunk(az, si, chunk);
    assign_stem(az, left_profile, si, true);
    assign_stem(az, right_profile, si, false);
    if next_side {
        trace!("stem {si}: point {pi} paired ahead with {opp_point}");
    }
    Some(si)
}

/// Serif, stub and feature-bend acceptance: the crossing itself is not
/// parallel, but an endpoint of the crossed curve close to the crossing
/// leaves parallel within the loose tier.
pub(crate) fn is_stub_or_intersection(az: &Analyzer, dir: Vec2, hit: EdgeHit) -> bool {
    let curve = &az.outline.curves[hit.curve];
    let hit_pos = curve.eval(hit.t);
    let near_limit = 2.0 * az.tol.dist_error_diag;
    for endpoint in [curve.from, curve.to] {
        let profile = &az.profiles[endpoint];
        if (profile.pos - hit_pos).hypot() > near_limit {
            continue;
        }
        for tangent in [profile.next_unit, profile.prev_unit] {
            if tangent != Vec2::ZERO
                && approx::parallel_within(tangent, dir, az.tol.stub_slope_error)
            {
                return true;
            }
        }
    }
    false
}

fn nearest_endpoint(az: &Analyzer, hit: EdgeHit) -> usize {
    let curve = &az.outline.curves[hit.curve];
    if hit.t < 0.5 {
        curve.from
    } else {
        curve.to
    }
}

fn half_stem_anchor(az: &Analyzer, dir: Vec2, hit: EdgeHit) -> Option<usize> {
    let curve = &az.outline.curves[hit.curve];
    for endpoint in [curve.from, curve.to] {
        let profile = &az.profiles[endpoint];
        for tangent in [profile.next_unit, profile.prev_unit] {
            if tangent != Vec2::ZERO
                && approx::parallel_within(tangent, dir, az.tol.stub_slope_error)
            {
                return Some(endpoint);
            }
        }
    }
    None
}

fn both_sides_curved(az: &Analyzer, a: usize, b: usize) -> bool {
    [a, b].iter().all(|&ix| {
        let point = &az.outline.points[az.profiles[ix].point];
        let curved = |seg: Option<usize>| {
            seg.map(|s| !az.outline.curves[s].is_linear).unwrap_or(false)
        };
        curved(point.next) || curved(point.prev)
    })
}

/// Finds an existing stem both points land on, in the correct
/// left/right order.
fn find_stem_for_pair(az: &Analyzer, unit: Vec2, left: Point, right: Point) -> Option<usize> {
    for (si, stem) in az.stems.iter().enumerate() {
        if stem.ghost || stem.bbox || stem.corner {
            continue;
        }
        if !approx::parallel_within(stem.unit, unit, az.tol.slope_error) {
            continue;
        }
        if both_on_stem(az, stem, left, right) {
            return Some(si);
        }
    }
    None
}

/// The parallelism-plus-overlap test: `left` must land in the left
/// edge's tolerance window and `right` in the right edge's.
pub(crate) fn both_on_stem(
    az: &Analyzer,
    stem: &StemHypothesis,
    left: Point,
    right: Point,
) -> bool {
    let fudge = az.stem_dist_error(stem.unit);
    stem.on_left_edge(left, fudge) && stem.on_right_edge(right, fudge)
}

fn push_chunk(az: &mut Analyzer, si: usize, chunk: StemChunk) {
    let stem = &mut az.stems[si];
    let duplicate = stem
        .chunks
        .iter()
        .any(|c| c.l == chunk.l && c.r == chunk.r);
    if !duplicate {
        stem.chunks.push(chunk);
    }
}

fn assign_stem(az: &mut Analyzer, profile_ix: usize, si: usize, left_edge: bool) {
    let stem_ref = StemRef {
        stem: si,
        left_edge,
    };
    let stem_unit = az.stems[si].unit;
    let loose = az.tol.stub_slope_error;
    let profile = &mut az.profiles[profile_ix];
    // Record the stem on each side whose tangent runs along it.
    let mut recorded = false;
    for (unit, list) in [
        (profile.next_unit, &mut profile.next_stems),
        (profile.prev_unit, &mut profile.prev_stems),
    ] {
        if unit != Vec2::ZERO
            && approx::parallel_within(unit, stem_unit, loose)
            && !list.contains(&stem_ref)
        {
            list.push(stem_ref);
            recorded = true;
        }
    }
    // Corner stems run along neither tangent; keep them reachable.
    if !recorded
        && !profile.next_stems.contains(&stem_ref)
        && !profile.prev_stems.contains(&stem_ref)
    {
        profile.next_stems.push(stem_ref);
    }
}

/// Widens stem edges with the collinear groups their points belong to.
///
/// A stem edge anchored by two members of a group adopts the whole run,
/// which keeps the edge stable against one badly placed anchor.
pub(crate) fn stabilize_edges_with_groups(az: &mut Analyzer) {
    for gi in 0..az.groups.len() {
        let unit = az.groups[gi].unit;
        let members: Vec<usize> = az.groups[gi].points.clone();
        for si in 0..az.stems.len() {
            let stem = &az.stems[si];
            if stem.ghost || stem.bbox || stem.corner {
                continue;
            }
            if !approx::parallel_within(stem.unit, unit, az.tol.slope_error) {
                continue;
            }
            let fudge = az.stem_dist_error(stem.unit);
            let on_left = members
                .iter()
                .filter(|&&p| az.stems[si].on_left_edge(az.profiles[p].pos, fudge))
                .count();
            let on_right = members
                .iter()
                .filter(|&&p| az.stems[si].on_right_edge(az.profiles[p].pos, fudge))
                .count();
            if on_left >= 2 {
                for &p in &members {
                    let pos = az.profiles[p].pos;
                    if az.stems[si].on_left_edge(pos, fudge) {
                        az.stems[si].adopt_left(pos);
                    }
                }
            }
            if on_right >= 2 {
                for &p in &members {
                    let pos = az.profiles[p].pos;
                    if az.stems[si].on_right_edge(pos, fudge) {
                        az.stems[si].adopt_right(pos);
                    }
                }
            }
        }
    }
}

/// Snaps stub stems to exact horizontal/vertical when their support is
/// consistent.
pub(crate) fn normalize_stubs(az: &mut Analyzer) {
    let snap_sin = az.tol.stub_slope_error.sin();
    for si in 0..az.stems.len() {
        let stem = &az.stems[si];
        if stem.ghost || stem.bbox || stem.corner || stem.positioned {
            continue;
        }
        if !stem.chunks.iter().all(|c| c.stub) || stem.chunks.is_empty() {
            continue;
        }
        let unit = stem.unit;
        let target = if unit.x.abs() <= snap_sin && unit.x != 0.0 {
            Some(Vec2::new(0.0, 1.0))
        } else if unit.y.abs() <= snap_sin && unit.y != 0.0 {
            Some(Vec2::new(-1.0, 0.0))
        } else {
            None
        };
        let Some(target) = target else {
            continue;
        };
        // Support is consistent when every supporting point keeps a
        // tangent within the loose tier of the snapped axis.
        let consistent = az.stems[si].chunks.iter().all(|c| {
            [c.l, c.r].into_iter().flatten().all(|p| {
                let profile = &az.profiles[p];
                [profile.next_unit, profile.prev_unit].into_iter().any(|u| {
                    u != Vec2::ZERO
                        && approx::parallel_within(u, target, az.tol.stub_slope_error)
                })
            })
        });
        if !consistent {
            continue;
        }
        let stem = &mut az.stems[si];
        stem.unit = target;
        stem.l_to_r = Vec2::new(target.y, -target.x);
        if (stem.right - stem.left).dot(stem.l_to_r) < 0.0 {
            core::mem::swap(&mut stem.left, &mut stem.right);
        }
        rebuild_windows(az, si);
    }
}

/// Recomputes the per-edge tolerance windows from the chunk points.
fn rebuild_windows(az: &mut Analyzer, si: usize) {
    let chunk_points: Vec<(Option<Point>, Option<Point>)> = az.stems[si]
        .chunks
        .iter()
        .map(|c| {
            (
                c.l.map(|ix| az.profiles[ix].pos),
                c.r.map(|ix| az.profiles[ix].pos),
            )
        })
        .collect();
    let stem = &mut az.stems[si];
    stem.lmin = 0.0;
    stem.lmax = 0.0;
    stem.rmin = 0.0;
    stem.rmax = 0.0;
    stem.lpcnt = 0;
    stem.rpcnt = 0;
    for (l, r) in chunk_points {
        if let Some(p) = l {
            stem.adopt_left(p);
        }
        if let Some(p) = r {
            stem.adopt_right(p);
        }
    }
}

/// Synthesizes zero-width alignment stems for blue-zone points without a
/// real opposite edge.
pub(crate) fn ghost_stems(az: &mut Analyzer) {
    let fuzz = az.tol.dist_error_hv;
    for pi in 0..az.profiles.len() {
        let profile = &az.profiles[pi];
        let vertical_extent = profile.y_extr.max(profile.y_corner);
        if vertical_extent == 0 {
            continue;
        }
        let has_real_horizontal = profile.assigned_stems().any(|r| {
            let stem = &az.stems[r.stem];
            !stem.ghost && stem.is_horizontal(az.tol.slope_error)
        });
        if has_real_horizontal {
            continue;
        }
        let pos = profile.pos;
        let Some(zone) = az
            .blues
            .iter()
            .position(|z| z.contains(pos.y, fuzz))
        else {
            continue;
        };
        // Attach to an existing ghost in the same zone at this height.
        let existing = az.stems.iter().position(|s| {
            s.ghost && s.blue == Some(zone) && (s.left.y - pos.y).abs() <= fuzz
        });
        let si = match existing {
            Some(si) => si,
            None => {
                let mut stem =
                    StemHypothesis::new(Vec2::new(-1.0, 0.0), pos, pos);
                stem.ghost = true;
                stem.blue = Some(zone);
                az.stems.push(stem);
                az.stems.len() - 1
            }
        };
        let chunk = if vertical_extent == 2 {
            StemChunk {
                r: Some(pi),
                ..Default::default()
            }
        } else {
            StemChunk {
                l: Some(pi),
                ..Default::default()
            }
        };
        push_chunk(az, si, chunk);
        assign_stem(az, pi, si, vertical_extent != 2);
    }
}

/// Synthesizes full-extent stems when nothing controls the glyph's
/// width or height.
pub(crate) fn bbox_stems(az: &mut Analyzer) {
    let bbox = az.outline.bbox();
    let fudge = az.tol.dist_error_hv;
    let mid = Point::new(
        (bbox.x0 + bbox.x1) / 2.0,
        (bbox.y0 + bbox.y1) / 2.0,
    );
    let width_controlled = az.stems.iter().any(|s| {
        !s.ghost
            && s.is_vertical(az.tol.slope_error)
            && ((s.left.x - bbox.x0).abs() <= fudge || (s.right.x - bbox.x1).abs() <= fudge)
    });
    if !width_controlled && bbox.width() > 0.0 {
        let mut stem = StemHypothesis::new(
            Vec2::new(0.0, 1.0),
            Point::new(bbox.x0, mid.y),
            Point::new(bbox.x1, mid.y),
        );
        stem.bbox = true;
        az.stems.push(stem);
        let si = az.stems.len() - 1;
        attach_extremal_points(az, si, true);
    }
    let height_controlled = az.stems.iter().any(|s| {
        !s.ghost
            && s.is_horizontal(az.tol.slope_error)
            && ((s.left.y - bbox.y0).abs() <= fudge || (s.right.y - bbox.y1).abs() <= fudge)
    });
    if !height_controlled && bbox.height() > 0.0 {
        let mut stem = StemHypothesis::new(
            Vec2::new(-1.0, 0.0),
            Point::new(mid.x, bbox.y0),
            Point::new(mid.x, bbox.y1),
        );
        stem.bbox = true;
        az.stems.push(stem);
        let si = az.stems.len() - 1;
        attach_extremal_points(az, si, false);
    }
}

fn attach_extremal_points(az: &mut Analyzer, si: usize, vertical: bool) {
    for pi in 0..az.profiles.len() {
        let profile = &az.profiles[pi];
        let extent = if vertical {
            profile.x_extr.max(profile.x_corner)
        } else {
            profile.y_extr.max(profile.y_corner)
        };
        if extent == 0 {
            continue;
        }
        let chunk = if extent == 2 {
            StemChunk {
                r: Some(pi),
                ..Default::default()
            }
        } else {
            StemChunk {
                l: Some(pi),
                ..Default::default()
            }
        };
        let pos = az.profiles[pi].pos;
        {
            let stem = &mut az.stems[si];
            if extent == 2 {
                stem.adopt_right(pos);
            } else {
                stem.adopt_left(pos);
            }
        }
        push_chunk(az, si, chunk);
        assign_stem(az, pi, si, extent != 2);
    }
}

/// Adds short diagonal stems across symmetric bend points.
pub(crate) fn diagonal_corner_stems(az: &mut Analyzer) {
    for pi in 0..az.profiles.len() {
        let profile = &az.profiles[pi];
        if !profile.symmetrical_h && !profile.symmetrical_v {
            continue;
        }
        if profile.assigned_stems().next().is_some() {
            continue;
        }
        let Some(bisector) = approx::unit(profile.next_unit + profile.prev_unit) else {
            continue;
        };
        let mut stem = StemHypothesis::new(bisector, profile.pos, profile.pos);
        stem.corner = true;
        az.stems.push(stem);
        let si = az.stems.len() - 1;
        push_chunk(
            az,
            si,
            StemChunk {
                l: Some(pi),
                r: Some(pi),
                ..Default::default()
            },
        );
        assign_stem(az, pi, si, true);
    }
}

/// Confirms pre-existing hints, creating positioned stems for any the
/// discovery passes missed.
pub(crate) fn apply_existing_hints(az: &mut Analyzer) {
    let hints: Vec<crate::StemHint> = az.hints.clone();
    let bbox = az.outline.bbox();
    let slope = az.tol.slope_error;
    let fudge = az.tol.dist_error_hv;
    for hint in hints {
        let found = az.stems.iter_mut().find(|s| {
            if s.ghost || s.corner {
                return false;
            }
            let (ok_orient, start, width) = if hint.vertical {
                (s.is_vertical(slope), s.left.x, s.right.x - s.left.x)
            } else {
                (s.is_horizontal(slope), s.left.y, s.right.y - s.left.y)
            };
            ok_orient
                && (start - hint.start).abs() <= fudge
                && (width - hint.width).abs() <= fudge
        });
        match found {
            Some(stem) => stem.positioned = true,
            None => {
                let (left, right, unit) = if hint.vertical {
                    (
                        Point::new(hint.start, (bbox.y0 + bbox.y1) / 2.0),
                        Point::new(hint.start + hint.width, (bbox.y0 + bbox.y1) / 2.0),
                        Vec2::new(0.0, 1.0),
                    )
                } else {
                    (
                        Point::new((bbox.x0 + bbox.x1) / 2.0, hint.start),
                        Point::new((bbox.x0 + bbox.x1) / 2.0, hint.start + hint.width),
                        Vec2::new(-1.0, 0.0),
                    )
                };
                let mut stem = StemHypothesis::new(unit, left, right);
                stem.positioned = true;
                az.stems.push(stem);
            }
        }
    }
}
