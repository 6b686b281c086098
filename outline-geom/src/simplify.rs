//! Outline simplification.
//!
//! Four passes per contour: zero-length segment removal, collapse of
//! near-linear curves into true lines, removal of redundant collinear
//! line joints, and optional smoothing of control directions at
//! near-corner points. Behavior is driven entirely by an explicit
//! [`SimplifyOptions`] value threaded through the entry point.

use kurbo::Point;

use crate::approx::{self, TIGHT_SLOPE};
use crate::contour::{Contour, Outline};
use crate::curve::Curve;
use crate::point::{CurvePoint, PointKind};

/// Tolerances and switches for [`simplify`].
#[derive(Copy, Clone, Debug)]
pub struct SimplifyOptions {
    /// Distance within which geometry is allowed to move.
    pub error: f64,
    /// Distance within which nearly collinear line joints straighten.
    pub line_fixup: f64,
    /// Merge runs of collinear lines into one segment.
    pub merge_lines: bool,
    /// Align control directions at near-corner points.
    pub smooth: bool,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            error: 1.0,
            line_fixup: 0.5,
            merge_lines: true,
            smooth: true,
        }
    }
}

/// Working copy of one point while its contour is being edited.
#[derive(Copy, Clone, Debug)]
struct WorkPoint {
    pos: Point,
    next_ctrl: Point,
    prev_ctrl: Point,
    has_next_ctrl: bool,
    has_prev_ctrl: bool,
    kind: PointKind,
    /// The outgoing segment keeps the quadratic convention.
    quad_next: bool,
}

impl WorkPoint {
    fn next_ctrl_live(&self) -> bool {
        self.has_next_ctrl && (self.next_ctrl - self.pos).hypot() >= 1e-9
    }

    fn prev_ctrl_live(&self) -> bool {
        self.has_prev_ctrl && (self.prev_ctrl - self.pos).hypot() >= 1e-9
    }
}

/// Simplifies an outline in place.
///
/// Arena indices are renumbered; callers holding indices across a
/// simplify must re-resolve them.
pub fn simplify(outline: &mut Outline, options: &SimplifyOptions) {
    let mut rebuilt: Vec<(Vec<WorkPoint>, bool)> = Vec::with_capacity(outline.contours.len());
    for ci in 0..outline.contours.len() {
        let closed = outline.is_closed(ci);
        let mut work = extract(outline, ci);
        drop_zero_segments(&mut work, closed, options.error);
        flatten_near_lines(&mut work, closed, options.error);
        if options.merge_lines {
            merge_collinear(&mut work, closed, options.line_fixup);
        }
        if options.smooth {
            smooth_corners(&mut work, closed);
        }
        rebuilt.push((work, closed));
    }
    *outline = rebuild(&rebuilt);
}

fn extract(outline: &Outline, contour_ix: usize) -> Vec<WorkPoint> {
    outline
        .contour_points(contour_ix)
        .into_iter()
        .map(|pi| {
            let p = &outline.points[pi];
            WorkPoint {
                pos: p.pos,
                next_ctrl: p.next_ctrl,
                prev_ctrl: p.prev_ctrl,
                has_next_ctrl: p.has_next_ctrl,
                has_prev_ctrl: p.has_prev_ctrl,
                kind: p.kind,
                quad_next: p
                    .next
                    .map(|s| outline.curves[s].is_quadratic)
                    .unwrap_or(false),
            }
        })
        .collect()
}

/// Segment from work item `i` to its successor, as a throwaway curve.
fn work_curve(work: &[WorkPoint], i: usize, closed: bool) -> Option<Curve> {
    let j = successor(work.len(), i, closed)?;
    let (a, b) = (&work[i], &work[j]);
    let mut points = [CurvePoint::new(a.pos), CurvePoint::new(b.pos)];
    points[0].next_ctrl = a.next_ctrl;
    points[0].has_next_ctrl = a.has_next_ctrl;
    points[1].prev_ctrl = b.prev_ctrl;
    points[1].has_prev_ctrl = b.has_prev_ctrl;
    let mut curve = Curve::new(0, 1, a.quad_next);
    curve.refigure(&points);
    Some(curve)
}

fn successor(len: usize, i: usize, closed: bool) -> Option<usize> {
    if i + 1 < len {
        Some(i + 1)
    } else if closed && len > 1 {
        Some(0)
    } else {
        None
    }
}

fn min_points(closed: bool) -> usize {
    if closed {
        2
    } else {
        1
    }
}

fn drop_zero_segments(work: &mut Vec<WorkPoint>, closed: bool, error: f64) {
    let mut i = 0;
    while i < work.len() && work.len() > min_points(closed) {
        let Some(j) = successor(work.len(), i, closed) else {
            break;
        };
        let chord = (work[j].pos - work[i].pos).hypot();
        let bulge = work[i].next_ctrl_live() || work[j].prev_ctrl_live();
        let tiny_bulge = (work[i].next_ctrl - work[i].pos).hypot() < error
            && (work[j].prev_ctrl - work[j].pos).hypot() < error;
        if chord < error && (!bulge || tiny_bulge) {
            // Fold the successor into this point; its outgoing side
            // survives.
            let follower = work[j];
            work[i].next_ctrl = follower.next_ctrl;
            work[i].has_next_ctrl = follower.has_next_ctrl;
            work[i].quad_next = follower.quad_next;
            work.remove(j);
            // Re-test the same index against its new successor.
            if j < i {
                i -= 1;
            }
            continue;
        }
        i += 1;
    }
}

fn flatten_near_lines(work: &mut [WorkPoint], closed: bool, error: f64) {
    for i in 0..work.len() {
        let Some(curve) = work_curve(work, i, closed) else {
            continue;
        };
        if curve.is_linear {
            continue;
        }
        let Some(j) = successor(work.len(), i, closed) else {
            continue;
        };
        let ends = [CurvePoint::new(work[i].pos), CurvePoint::new(work[j].pos)];
        if curve.close_to_linear(&ends, error) {
            work[i].has_next_ctrl = false;
            work[i].next_ctrl = work[i].pos;
            work[j].has_prev_ctrl = false;
            work[j].prev_ctrl = work[j].pos;
        }
    }
}

fn merge_collinear(work: &mut Vec<WorkPoint>, closed: bool, line_fixup: f64) {
    let mut i = 0;
    let mut scanned = 0;
    while work.len() > min_points(closed).max(2) && scanned <= 2 * work.len() {
        scanned += 1;
        if i >= work.len() {
            if !closed {
                break;
            }
            i = 0;
        }
        // `i` is the joint under test; it needs live neighbors on both
        // sides and straight segments without controls.
        let has_prev = closed || i > 0;
        let has_next = closed || i + 1 < work.len();
        if !has_prev || !has_next {
            i += 1;
            continue;
        }
        let prev = if i == 0 { work.len() - 1 } else { i - 1 };
        let next = if i + 1 == work.len() { 0 } else { i + 1 };
        let joint = &work[i];
        if joint.prev_ctrl_live()
            || joint.next_ctrl_live()
            || work[prev].next_ctrl_live()
            || work[next].prev_ctrl_live()
        {
            i += 1;
            continue;
        }
        let chord = work[next].pos - work[prev].pos;
        let Some(dir) = approx::unit(chord) else {
            i += 1;
            continue;
        };
        let off = joint.pos - work[prev].pos;
        let across = (off.x * dir.y - off.y * dir.x).abs();
        let along = off.x * dir.x + off.y * dir.y;
        if across <= line_fixup && along >= 0.0 && along <= chord.hypot() {
            work.remove(i);
            // Neighbors may have become collinear in turn; rescan.
            if i > 0 {
                i -= 1;
            }
            continue;
        }
        i += 1;
    }
}

fn smooth_corners(work: &mut [WorkPoint], closed: bool) {
    for i in 0..work.len() {
        let has_prev = closed || i > 0;
        let has_next = closed || i + 1 < work.len();
        if !has_prev || !has_next || work[i].kind != PointKind::Corner {
            continue;
        }
        if !work[i].prev_ctrl_live() || !work[i].next_ctrl_live() {
            continue;
        }
        let incoming = work[i].pos - work[i].prev_ctrl;
        let outgoing = work[i].next_ctrl - work[i].pos;
        let (Some(in_dir), Some(out_dir)) = (approx::unit(incoming), approx::unit(outgoing))
        else {
            continue;
        };
        if !approx::same_dir_within(in_dir, out_dir, TIGHT_SLOPE) {
            continue;
        }
        // Near-corner: share one direction between the two controls.
        let Some(avg) = approx::unit(in_dir + out_dir) else {
            continue;
        };
        let out_len = (work[i].next_ctrl - work[i].pos).hypot();
        let in_len = (work[i].prev_ctrl - work[i].pos).hypot();
        work[i].next_ctrl = work[i].pos + avg * out_len;
        work[i].prev_ctrl = work[i].pos - avg * in_len;
        work[i].kind = PointKind::Smooth;
    }
}

fn rebuild(contours: &[(Vec<WorkPoint>, bool)]) -> Outline {
    let mut outline = Outline::default();
    for (work, closed) in contours {
        if work.is_empty() {
            continue;
        }
        let base = outline.points.len();
        for (i, item) in work.iter().enumerate() {
            let mut point = CurvePoint::new(item.pos);
            point.next_ctrl = item.next_ctrl;
            point.prev_ctrl = item.prev_ctrl;
            point.has_next_ctrl = item.has_next_ctrl;
            point.has_prev_ctrl = item.has_prev_ctrl;
            point.kind = item.kind;
            point.is_first = i == 0;
            outline.points.push(point);
        }
        let count = work.len();
        let segments = if *closed && count > 1 { count } else { count - 1 };
        for i in 0..segments {
            let from = base + i;
            let to = base + (i + 1) % count;
            let si = outline.curves.len();
            outline.curves.push(Curve::new(from, to, work[i].quad_next));
            outline.points[from].next = Some(si);
            outline.points[to].prev = Some(si);
        }
        outline.contours.push(Contour {
            first: base,
            last: base + count - 1,
            bbox: kurbo::Rect::new(0.0, 0.0, 0.0, 0.0),
            visited: false,
        });
    }
    outline.refigure();
    outline.update_bboxes();
    outline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed(points: &[Point]) -> Outline {
        let mut pen = Outline::builder();
        pen.move_to(points[0]);
        for &p in &points[1..] {
            pen.line_to(p);
        }
        pen.close();
        pen.build()
    }

    #[test]
    fn zero_length_segments_disappear() {
        let mut outline = closed(&[
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 0.4),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]);
        simplify(&mut outline, &SimplifyOptions::default());
        assert_eq!(outline.contours.len(), 1);
        assert_eq!(outline.points.len(), 4);
        assert!(outline.is_closed(0));
    }

    #[test]
    fn near_linear_curves_become_lines() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.curve_to(
            Point::new(30.0, 0.2),
            Point::new(70.0, -0.2),
            Point::new(100.0, 0.0),
        );
        pen.line_to(Point::new(100.0, 100.0));
        let mut outline = pen.build();
        assert!(!outline.curves[0].is_linear);
        simplify(&mut outline, &SimplifyOptions::default());
        assert!(outline.curves[0].is_linear);
        assert!(!outline.points[0].has_next_ctrl);
    }

    #[test]
    fn collinear_joints_merge() {
        let mut outline = closed(&[
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.1),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]);
        simplify(&mut outline, &SimplifyOptions::default());
        assert_eq!(outline.points.len(), 4);
        let mut no_merge = closed(&[
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.1),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]);
        let options = SimplifyOptions {
            merge_lines: false,
            ..Default::default()
        };
        simplify(&mut no_merge, &options);
        assert_eq!(no_merge.points.len(), 5);
    }

    #[test]
    fn near_corner_controls_align() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.curve_to(
            Point::new(30.0, 40.0),
            Point::new(70.0, 60.0),
            Point::new(100.0, 100.0),
        );
        // Slightly bent continuation; tangents differ by about a degree.
        pen.curve_to(
            Point::new(131.0, 140.0),
            Point::new(170.0, 160.0),
            Point::new(200.0, 200.0),
        );
        let mut outline = pen.build();
        outline.points[1].kind = PointKind::Corner;
        simplify(&mut outline, &SimplifyOptions::default());
        assert_eq!(outline.points[1].kind, PointKind::Smooth);
        let p = &outline.points[1];
        let incoming = p.pos - p.prev_ctrl;
        let outgoing = p.next_ctrl - p.pos;
        assert!(approx::same_dir_within(
            approx::unit(incoming).unwrap(),
            approx::unit(outgoing).unwrap(),
            1e-9
        ));
    }

    #[test]
    fn single_point_contour_is_untouched() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(5.0, 5.0));
        pen.close();
        let mut outline = pen.build();
        simplify(&mut outline, &SimplifyOptions::default());
        assert_eq!(outline.points.len(), 1);
        assert_eq!(outline.contours.len(), 1);
    }
}
