//! Outline arenas: points, segments, contours and the operations on them.
//!
//! Contours are cyclic structures; points and segments reference each
//! other through arena indices rather than pointers, and ring closure is
//! an index equality test. Everything an editor does to a contour lives
//! here: building, transforming, reversing, joining, splitting and
//! winding-direction correction.

use kurbo::{Affine, Point, Rect};

use crate::approx::{self, snap_point};
use crate::curve::Curve;
use crate::monotonic::MonoRing;
use crate::point::{CurvePoint, PointKind};
use crate::Y;

/// One contour in an outline.
///
/// `bbox` and `visited` are transient scratch used by graph traversals
/// (direction correction, winding partition); they carry no outline
/// state of their own.
#[derive(Copy, Clone, Debug)]
pub struct Contour {
    pub first: usize,
    pub last: usize,
    pub bbox: Rect,
    pub visited: bool,
}

impl Contour {
    fn new(first: usize, last: usize) -> Self {
        Self {
            first,
            last,
            bbox: Rect::new(0.0, 0.0, 0.0, 0.0),
            visited: false,
        }
    }
}

/// An outline: arenas of points and segments plus the contour table.
#[derive(Default, Clone, Debug)]
pub struct Outline {
    pub points: Vec<CurvePoint>,
    pub curves: Vec<Curve>,
    pub contours: Vec<Contour>,
}

impl Outline {
    pub fn builder() -> OutlineBuilder {
        OutlineBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// True when the contour's last point leads back to its first.
    pub fn is_closed(&self, contour_ix: usize) -> bool {
        let contour = &self.contours[contour_ix];
        match self.points[contour.last].next {
            Some(seg) => self.curves[seg].to == contour.first,
            None => false,
        }
    }

    /// Point indices of a contour in winding order.
    ///
    /// Bounded by the arena size so a corrupted ring cannot spin.
    pub fn contour_points(&self, contour_ix: usize) -> Vec<usize> {
        let contour = &self.contours[contour_ix];
        let mut out = Vec::new();
        let mut ix = contour.first;
        loop {
            out.push(ix);
            let Some(seg) = self.points[ix].next else {
                break;
            };
            ix = self.curves[seg].to;
            if ix == contour.first || out.len() > self.points.len() {
                break;
            }
        }
        out
    }

    /// Segment indices of a contour in winding order.
    pub fn contour_curves(&self, contour_ix: usize) -> Vec<usize> {
        let contour = &self.contours[contour_ix];
        let mut out = Vec::new();
        let mut ix = contour.first;
        loop {
            let Some(seg) = self.points[ix].next else {
                break;
            };
            out.push(seg);
            ix = self.curves[seg].to;
            if ix == contour.first || out.len() > self.curves.len() {
                break;
            }
        }
        out
    }

    /// Index of the contour a point belongs to.
    pub fn contour_of(&self, point_ix: usize) -> Option<usize> {
        (0..self.contours.len()).find(|&ci| self.contour_points(ci).contains(&point_ix))
    }

    /// Recomputes every segment's parametric form.
    pub fn refigure(&mut self) {
        for ix in 0..self.curves.len() {
            if self.curves[ix].dead {
                continue;
            }
            let mut curve = self.curves[ix];
            curve.refigure(&self.points);
            self.curves[ix] = curve;
        }
    }

    /// Recomputes the two segments adjacent to a point after it moved.
    pub fn refigure_point(&mut self, point_ix: usize) {
        for seg in [self.points[point_ix].prev, self.points[point_ix].next]
            .into_iter()
            .flatten()
        {
            let mut curve = self.curves[seg];
            curve.refigure(&self.points);
            self.curves[seg] = curve;
        }
    }

    /// Applies a 2x3 affine matrix to every anchor and control point,
    /// snapping results to the 1/1024 grid to suppress rounding drift.
    pub fn transform(&mut self, affine: Affine) {
        for point in self.points.iter_mut().filter(|p| !p.dead) {
            point.pos = snap_point(affine * point.pos);
            point.next_ctrl = snap_point(affine * point.next_ctrl);
            point.prev_ctrl = snap_point(affine * point.prev_ctrl);
        }
        self.refigure();
        self.update_bboxes();
    }

    /// Reverses the winding of one contour.
    ///
    /// Closed contours keep their first point; open contours swap ends.
    pub fn reverse_contour(&mut self, contour_ix: usize) {
        let closed = self.is_closed(contour_ix);
        let point_ids = self.contour_points(contour_ix);
        if point_ids.len() < 2 {
            return;
        }
        // The point after `first` becomes the new `last` in a ring.
        let new_last = point_ids[1];
        for &pi in &point_ids {
            let p = &mut self.points[pi];
            core::mem::swap(&mut p.next, &mut p.prev);
            core::mem::swap(&mut p.next_ctrl, &mut p.prev_ctrl);
            core::mem::swap(&mut p.has_next_ctrl, &mut p.has_prev_ctrl);
        }
        for &si in &self.contour_curves_raw(&point_ids) {
            let curve = &mut self.curves[si];
            core::mem::swap(&mut curve.from, &mut curve.to);
        }
        let contour = &mut self.contours[contour_ix];
        if closed {
            contour.last = new_last;
        } else {
            let old_first = contour.first;
            let old_last = contour.last;
            contour.first = old_last;
            contour.last = old_first;
            self.points[old_first].is_first = false;
            self.points[old_last].is_first = true;
        }
        for &si in &self.contour_curves(contour_ix) {
            let mut curve = self.curves[si];
            curve.refigure(&self.points);
            self.curves[si] = curve;
        }
    }

    // Segment list gathered from a point list captured before links were
    // swapped; used mid-reverse when the ring is inconsistent.
    fn contour_curves_raw(&self, point_ids: &[usize]) -> Vec<usize> {
        let mut out = Vec::new();
        for &pi in point_ids {
            // prev was next before the swap
            if let Some(seg) = self.points[pi].prev {
                if !out.contains(&seg) {
                    out.push(seg);
                }
            }
            if let Some(seg) = self.points[pi].next {
                if !out.contains(&seg) {
                    out.push(seg);
                }
            }
        }
        out
    }

    /// Reverses every contour.
    pub fn reverse(&mut self) {
        for ci in 0..self.contours.len() {
            self.reverse_contour(ci);
        }
    }

    /// Joins two open contours, appending `other` after `base`.
    ///
    /// Coincident endpoints are merged; otherwise a connecting line is
    /// inserted. Returns false when either contour is closed.
    pub fn join(&mut self, base: usize, other: usize) -> bool {
        if base == other || self.is_closed(base) || self.is_closed(other) {
            return false;
        }
        let base_last = self.contours[base].last;
        let other_first = self.contours[other].first;
        let other_last = self.contours[other].last;
        self.points[other_first].is_first = false;
        let merge =
            (self.points[base_last].pos - self.points[other_first].pos).hypot() < 1e-6;
        if merge && base_last != other_first {
            // Absorb the seam point into the end of `base`.
            let seam = self.points[other_first];
            let tail = &mut self.points[base_last];
            tail.next_ctrl = seam.next_ctrl;
            tail.has_next_ctrl = seam.has_next_ctrl;
            tail.next = seam.next;
            if let Some(seg) = seam.next {
                self.curves[seg].from = base_last;
            }
            self.points[other_first].dead = true;
        } else {
            let si = self.curves.len();
            let mut line = Curve::new(base_last, other_first, false);
            line.refigure(&self.points);
            self.curves.push(line);
            self.points[base_last].next = Some(si);
            self.points[other_first].prev = Some(si);
        }
        self.contours[base].last = if merge && other_last == other_first {
            base_last
        } else {
            other_last
        };
        self.contours.remove(other);
        self.update_bboxes();
        true
    }

    /// Splits a contour at a point.
    ///
    /// A closed contour becomes one open contour starting and ending at
    /// the split point (which is duplicated); an open contour becomes
    /// two, and the index of the new contour is returned.
    pub fn split_at_point(&mut self, contour_ix: usize, point_ix: usize) -> Option<usize> {
        let closed = self.is_closed(contour_ix);
        let prev_seg = self.points[point_ix].prev?;
        let twin_ix = self.points.len();
        let mut twin = self.points[point_ix];
        twin.next = None;
        twin.has_next_ctrl = false;
        twin.is_first = false;
        self.points.push(twin);
        self.curves[prev_seg].to = twin_ix;
        self.points[point_ix].prev = None;
        self.points[point_ix].has_prev_ctrl = false;
        if closed {
            let contour = &mut self.contours[contour_ix];
            let old_first = contour.first;
            contour.first = point_ix;
            contour.last = twin_ix;
            self.points[old_first].is_first = false;
            self.points[point_ix].is_first = true;
            None
        } else {
            let old_last = self.contours[contour_ix].last;
            self.contours[contour_ix].last = twin_ix;
            self.points[point_ix].is_first = true;
            let new_ix = self.contours.len();
            self.contours.push(Contour::new(point_ix, old_last));
            Some(new_ix)
        }
    }

    /// Splits a segment at a parameter, inserting a new on-curve point.
    ///
    /// Returns the new point's index. Control points are subdivided with
    /// the control polygon so the shape is preserved exactly.
    pub fn split_curve(&mut self, curve_ix: usize, t: f64) -> usize {
        let curve = self.curves[curve_ix];
        let from = curve.from;
        let to = curve.to;
        let p0 = self.points[from].pos;
        let p3 = self.points[to].pos;
        let mid_ix = self.points.len();
        let new_seg_ix = self.curves.len();
        let mut mid = CurvePoint::new(curve.eval(t));
        mid.kind = if curve.is_linear {
            PointKind::Corner
        } else {
            PointKind::Smooth
        };
        if curve.is_linear {
            self.points.push(mid);
        } else if curve.is_quadratic {
            let ctrl = if !self.points[from].next_ctrl_degenerate() {
                self.points[from].next_ctrl
            } else {
                self.points[to].prev_ctrl
            };
            let c0 = p0.lerp(ctrl, t);
            let c1 = ctrl.lerp(p3, t);
            mid.pos = c0.lerp(c1, t);
            mid.prev_ctrl = c0;
            mid.has_prev_ctrl = true;
            mid.next_ctrl = c1;
            mid.has_next_ctrl = true;
            self.points.push(mid);
            self.points[from].next_ctrl = c0;
            self.points[from].has_next_ctrl = true;
            self.points[to].prev_ctrl = c1;
            self.points[to].has_prev_ctrl = true;
        } else {
            let c1 = if self.points[from].next_ctrl_degenerate() {
                p0
            } else {
                self.points[from].next_ctrl
            };
            let c2 = if self.points[to].prev_ctrl_degenerate() {
                p3
            } else {
                self.points[to].prev_ctrl
            };
            let c1a = p0.lerp(c1, t);
            let c2a = c1.lerp(c2, t);
            let c3a = c2.lerp(p3, t);
            let c1aa = c1a.lerp(c2a, t);
            let c2aa = c2a.lerp(c3a, t);
            mid.pos = c1aa.lerp(c2aa, t);
            mid.prev_ctrl = c1aa;
            mid.has_prev_ctrl = true;
            mid.next_ctrl = c2aa;
            mid.has_next_ctrl = true;
            self.points.push(mid);
            self.points[from].next_ctrl = c1a;
            self.points[from].has_next_ctrl = true;
            self.points[to].prev_ctrl = c3a;
            self.points[to].has_prev_ctrl = true;
        }
        let mut tail = Curve::new(mid_ix, to, curve.is_quadratic);
        self.curves[curve_ix].to = mid_ix;
        self.points[mid_ix].prev = Some(curve_ix);
        self.points[mid_ix].next = Some(new_seg_ix);
        self.points[to].prev = Some(new_seg_ix);
        tail.refigure(&self.points);
        self.curves.push(tail);
        let mut head = self.curves[curve_ix];
        head.refigure(&self.points);
        self.curves[curve_ix] = head;
        // Splitting the closing segment moves the ring's last point.
        for contour in &mut self.contours {
            if contour.last == from && contour.first == to {
                contour.last = mid_ix;
            }
        }
        mid_ix
    }

    /// Drops dead arena entries and remaps every index.
    pub fn compact(&mut self) {
        let mut point_map = vec![usize::MAX; self.points.len()];
        let mut next_ix = 0;
        for (ix, point) in self.points.iter().enumerate() {
            if !point.dead {
                point_map[ix] = next_ix;
                next_ix += 1;
            }
        }
        let mut curve_map = vec![usize::MAX; self.curves.len()];
        let mut next_ix = 0;
        for (ix, curve) in self.curves.iter().enumerate() {
            if !curve.dead {
                curve_map[ix] = next_ix;
                next_ix += 1;
            }
        }
        self.points.retain(|p| !p.dead);
        self.curves.retain(|c| !c.dead);
        for point in &mut self.points {
            point.next = point.next.map(|s| curve_map[s]);
            point.prev = point.prev.map(|s| curve_map[s]);
        }
        for curve in &mut self.curves {
            curve.from = point_map[curve.from];
            curve.to = point_map[curve.to];
        }
        for contour in &mut self.contours {
            contour.first = point_map[contour.first];
            contour.last = point_map[contour.last];
        }
    }

    /// Recomputes contour bounding boxes.
    pub fn update_bboxes(&mut self) {
        for ci in 0..self.contours.len() {
            let mut bbox: Option<Rect> = None;
            for si in self.contour_curves(ci) {
                let b = self.curves[si].bbox();
                bbox = Some(match bbox {
                    Some(acc) => Rect::new(
                        acc.x0.min(b.x0),
                        acc.y0.min(b.y0),
                        acc.x1.max(b.x1),
                        acc.y1.max(b.y1),
                    ),
                    None => b,
                });
            }
            let anchor = self.points[self.contours[ci].first].pos;
            self.contours[ci].bbox =
                bbox.unwrap_or(Rect::new(anchor.x, anchor.y, anchor.x, anchor.y));
        }
    }

    /// Bounding box of the whole outline.
    pub fn bbox(&self) -> Rect {
        let mut bbox: Option<Rect> = None;
        for contour in &self.contours {
            let b = contour.bbox;
            bbox = Some(match bbox {
                Some(acc) => Rect::new(
                    acc.x0.min(b.x0),
                    acc.y0.min(b.y0),
                    acc.x1.max(b.x1),
                    acc.y1.max(b.y1),
                ),
                None => b,
            });
        }
        bbox.unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Signed area of a closed contour; positive winds counter-clockwise.
    pub fn contour_area(&self, contour_ix: usize) -> f64 {
        self.contour_curves(contour_ix)
            .iter()
            .map(|&si| self.curves[si].area_contribution())
            .sum()
    }

    /// Makes outer contours wind counter-clockwise and holes clockwise.
    ///
    /// Containment depth comes from the winding partition along a
    /// horizontal line through each contour's leftmost anchor; the
    /// contour visited marks guard against re-processing.
    pub fn correct_direction(&mut self) {
        self.update_bboxes();
        for contour in &mut self.contours {
            contour.visited = false;
        }
        let ring = MonoRing::build(self);
        for ci in 0..self.contours.len() {
            if self.contours[ci].visited || !self.is_closed(ci) {
                continue;
            }
            let point_ids = self.contour_points(ci);
            let leftmost = point_ids
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    self.points[a]
                        .pos
                        .x
                        .partial_cmp(&self.points[b].pos.x)
                        .unwrap_or(core::cmp::Ordering::Equal)
                })
                .expect("closed contour has points");
            let probe = self.points[leftmost].pos;
            let mut depth = 0usize;
            for hit in ring.find_at(&self.curves, Y, probe.y) {
                let span = &ring.spans[hit.span];
                if span.contour != ci && hit.coord < probe.x - 1e-4 {
                    depth += 1;
                }
            }
            let area = self.contour_area(ci);
            let want_ccw = depth % 2 == 0;
            if (want_ccw && area < 0.0) || (!want_ccw && area > 0.0) {
                self.reverse_contour(ci);
            }
            self.contours[ci].visited = true;
        }
    }

    /// Classifies every point as corner, smooth or tangent from the
    /// geometry around it.
    pub fn infer_kinds(&mut self) {
        for ci in 0..self.contours.len() {
            for pi in self.contour_points(ci) {
                let point = &self.points[pi];
                let in_dir = point
                    .prev
                    .map(|s| self.curves[s].deriv(1.0))
                    .and_then(approx::unit);
                let out_dir = point
                    .next
                    .map(|s| self.curves[s].deriv(0.0))
                    .and_then(approx::unit);
                let (Some(in_dir), Some(out_dir)) = (in_dir, out_dir) else {
                    continue;
                };
                let prev_linear = point.prev.map(|s| self.curves[s].is_linear).unwrap_or(true);
                let next_linear = point.next.map(|s| self.curves[s].is_linear).unwrap_or(true);
                let smooth = approx::same_dir_within(in_dir, out_dir, approx::TIGHT_SLOPE);
                let kind = if !smooth {
                    PointKind::Corner
                } else if prev_linear != next_linear {
                    PointKind::Tangent
                } else if prev_linear && next_linear {
                    PointKind::Corner
                } else {
                    PointKind::Smooth
                };
                self.points[pi].kind = kind;
            }
        }
    }
}

/// Pen-style builder collaborators use to hand an outline to the kernel.
#[derive(Default)]
pub struct OutlineBuilder {
    outline: Outline,
    start: Option<usize>,
    current: Option<usize>,
}

impl OutlineBuilder {
    /// Starts a new contour, finishing any pending open one.
    pub fn move_to(&mut self, p: Point) {
        self.finish_contour();
        let ix = self.outline.points.len();
        let mut point = CurvePoint::new(p);
        point.is_first = true;
        self.outline.points.push(point);
        self.start = Some(ix);
        self.current = Some(ix);
    }

    pub fn line_to(&mut self, p: Point) {
        let to = self.push_point(p);
        self.push_curve(to, false);
    }

    pub fn quad_to(&mut self, ctrl: Point, p: Point) {
        let Some(cur) = self.current else {
            return;
        };
        self.outline.points[cur].next_ctrl = ctrl;
        self.outline.points[cur].has_next_ctrl = true;
        let to = self.push_point(p);
        self.outline.points[to].prev_ctrl = ctrl;
        self.outline.points[to].has_prev_ctrl = true;
        self.push_curve(to, true);
    }

    pub fn curve_to(&mut self, ctrl0: Point, ctrl1: Point, p: Point) {
        let Some(cur) = self.current else {
            return;
        };
        self.outline.points[cur].next_ctrl = ctrl0;
        self.outline.points[cur].has_next_ctrl = true;
        let to = self.push_point(p);
        self.outline.points[to].prev_ctrl = ctrl1;
        self.outline.points[to].has_prev_ctrl = true;
        self.push_curve(to, false);
    }

    /// Closes the current contour, merging a trailing point that landed
    /// on the start.
    pub fn close(&mut self) {
        let (Some(start), Some(cur)) = (self.start, self.current) else {
            return;
        };
        if start == cur {
            // Single point contour; stays open by convention.
            self.finish_contour();
            return;
        }
        let coincident =
            (self.outline.points[cur].pos - self.outline.points[start].pos).hypot() < 1e-6;
        let last = if coincident {
            let seam = self.outline.points[cur];
            let head = &mut self.outline.points[start];
            head.prev_ctrl = seam.prev_ctrl;
            head.has_prev_ctrl = seam.has_prev_ctrl;
            head.prev = seam.prev;
            let seg = seam.prev.expect("seam point has an incoming segment");
            self.outline.curves[seg].to = start;
            self.outline.points[cur].dead = true;
            self.outline.curves[seg].from
        } else {
            let si = self.outline.curves.len();
            self.outline
                .curves
                .push(Curve::new(cur, start, false));
            self.outline.points[cur].next = Some(si);
            self.outline.points[start].prev = Some(si);
            cur
        };
        self.outline.contours.push(Contour::new(start, last));
        self.start = None;
        self.current = None;
    }

    /// Finishes the outline: closes nothing, refigures everything.
    pub fn build(mut self) -> Outline {
        self.finish_contour();
        self.outline.compact();
        self.outline.refigure();
        self.outline.infer_kinds();
        self.outline.update_bboxes();
        self.outline
    }

    fn finish_contour(&mut self) {
        if let (Some(start), Some(cur)) = (self.start, self.current) {
            // Left open: last is wherever the pen stopped.
            self.outline.contours.push(Contour::new(start, cur));
        }
        self.start = None;
        self.current = None;
    }

    fn push_point(&mut self, p: Point) -> usize {
        let ix = self.outline.points.len();
        self.outline.points.push(CurvePoint::new(p));
        ix
    }

    fn push_curve(&mut self, to: usize, quadratic: bool) {
        let Some(cur) = self.current else {
            return;
        };
        let si = self.outline.curves.len();
        self.outline.curves.push(Curve::new(cur, to, quadratic));
        self.outline.points[cur].next = Some(si);
        self.outline.points[to].prev = Some(si);
        self.current = Some(to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Outline {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(x0, y0));
        pen.line_to(Point::new(x1, y0));
        pen.line_to(Point::new(x1, y1));
        pen.line_to(Point::new(x0, y1));
        pen.close();
        pen.build()
    }

    #[test]
    fn builder_produces_a_closed_ring() {
        let outline = rectangle(0.0, 0.0, 100.0, 200.0);
        assert_eq!(outline.contours.len(), 1);
        assert_eq!(outline.points.len(), 4);
        assert_eq!(outline.curves.len(), 4);
        assert!(outline.is_closed(0));
        assert_eq!(outline.contour_points(0), vec![0, 1, 2, 3]);
        assert!(outline.points[0].is_first);
        assert!(outline.contour_area(0) > 0.0);
    }

    #[test]
    fn double_reverse_is_identity() {
        let mut outline = rectangle(0.0, 0.0, 100.0, 200.0);
        let before: Vec<Point> = outline.points.iter().map(|p| p.pos).collect();
        let order_before = outline.contour_points(0);
        outline.reverse_contour(0);
        assert!(outline.contour_area(0) < 0.0);
        assert!(outline.is_closed(0));
        outline.reverse_contour(0);
        assert!(outline.contour_area(0) > 0.0);
        let after: Vec<Point> = outline.points.iter().map(|p| p.pos).collect();
        assert_eq!(before, after);
        assert_eq!(order_before, outline.contour_points(0));
    }

    #[test]
    fn transform_snaps_to_the_grid() {
        let mut outline = rectangle(0.0, 0.0, 100.0, 100.0);
        outline.transform(Affine::new([1.0 / 3.0, 0.0, 0.0, 1.0 / 3.0, 0.0, 0.0]));
        for point in &outline.points {
            let snapped = approx::snap(point.pos.x);
            assert_eq!(point.pos.x, snapped);
        }
        let bbox = outline.bbox();
        assert!((bbox.x1 - 100.0 / 3.0).abs() < 1.0 / 1024.0);
    }

    #[test]
    fn split_curve_preserves_shape() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.curve_to(
            Point::new(0.0, 55.0),
            Point::new(45.0, 100.0),
            Point::new(100.0, 100.0),
        );
        let mut outline = pen.build();
        let probe = outline.curves[0].eval(0.7);
        let mid = outline.split_curve(0, 0.4);
        assert_eq!(outline.points[mid].kind, PointKind::Smooth);
        // t = 0.7 of the original is t = 0.5 of the tail piece
        let tail = outline.points[mid].next.unwrap();
        let again = outline.curves[tail].eval(0.5);
        assert!((probe - again).hypot() < 1e-6);
    }

    #[test]
    fn split_and_join_round_trip() {
        let mut outline = rectangle(0.0, 0.0, 100.0, 100.0);
        outline.split_at_point(0, 2);
        assert_eq!(outline.contours.len(), 1);
        assert!(!outline.is_closed(0));
        assert_eq!(outline.contours[0].first, 2);
        let ids = outline.contour_points(0);
        assert_eq!(ids.len(), 5);
        // Splitting the open contour in the middle yields two contours.
        let second = outline.split_at_point(0, 0).unwrap();
        assert_eq!(outline.contours.len(), 2);
        assert!(outline.join(0, second));
        assert_eq!(outline.contours.len(), 1);
        assert_eq!(outline.contour_points(0).len(), 5);
    }

    #[test]
    fn correct_direction_fixes_a_hole() {
        // Outer square plus an inner square wound the same way; the
        // inner one must flip.
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.line_to(Point::new(300.0, 0.0));
        pen.line_to(Point::new(300.0, 300.0));
        pen.line_to(Point::new(0.0, 300.0));
        pen.close();
        pen.move_to(Point::new(100.0, 100.0));
        pen.line_to(Point::new(200.0, 100.0));
        pen.line_to(Point::new(200.0, 200.0));
        pen.line_to(Point::new(100.0, 200.0));
        pen.close();
        let mut outline = pen.build();
        assert!(outline.contour_area(0) > 0.0);
        assert!(outline.contour_area(1) > 0.0);
        outline.correct_direction();
        assert!(outline.contour_area(0) > 0.0);
        assert!(outline.contour_area(1) < 0.0);
    }

    #[test]
    fn single_point_contour_survives_everything() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(50.0, 50.0));
        pen.close();
        let mut outline = pen.build();
        assert_eq!(outline.contours.len(), 1);
        assert!(!outline.is_closed(0));
        outline.transform(Affine::new([2.0, 0.0, 0.0, 2.0, 10.0, 0.0]));
        assert_eq!(outline.points[0].pos, Point::new(110.0, 100.0));
        outline.reverse();
        outline.correct_direction();
        outline.update_bboxes();
        assert_eq!(outline.contour_points(0), vec![0]);
        assert!(outline.contours[0].bbox.width() == 0.0);
    }
}
