//! Monotonic decomposition and constant-coordinate queries.
//!
//! Every segment is cut at its axis extrema into spans over which both
//! coordinates vary monotonically. Spans link prev/next in the owning
//! contour's winding order, forming a ring parallel to the contour, and
//! back every winding-number style query in the crate: direction
//! correction, stem activity tests and extremum classification.

use kurbo::Rect;

use crate::contour::Outline;
use crate::curve::Curve;
use crate::{cross_dim, Dimension, X};

/// Extent below which a span counts as parallel to a query line.
const FLAT_EXTENT: f64 = 1e-9;

/// Combined extent below which a freshly cut span is noise and merges
/// into its neighbor instead of contributing spurious winding.
const MIN_SPAN_EXTENT: f64 = 1e-6;

/// A sub-range of one segment over which both coordinates are monotonic.
#[derive(Copy, Clone, Debug)]
pub struct MonoSpan {
    pub curve: usize,
    pub contour: usize,
    pub t0: f64,
    pub t1: f64,
    pub bbox: Rect,
    pub x_up: bool,
    pub y_up: bool,
    /// Next span in the owning contour's winding order.
    pub next: usize,
    /// Previous span in the owning contour's winding order.
    pub prev: usize,
    /// Scratch flag for selection-scoped queries.
    pub excluded: bool,
}

impl MonoSpan {
    pub fn goes_up(&self, dim: Dimension) -> bool {
        if dim == X {
            self.x_up
        } else {
            self.y_up
        }
    }

    /// Extent of the span along an axis.
    pub fn extent(&self, dim: Dimension) -> f64 {
        if dim == X {
            self.bbox.width()
        } else {
            self.bbox.height()
        }
    }

    fn low(&self, dim: Dimension) -> f64 {
        if dim == X {
            self.bbox.x0
        } else {
            self.bbox.y0
        }
    }

    fn high(&self, dim: Dimension) -> f64 {
        if dim == X {
            self.bbox.x1
        } else {
            self.bbox.y1
        }
    }
}

/// One crossing reported by [`MonoRing::find_at`].
#[derive(Copy, Clone, Debug)]
pub struct SpanHit {
    pub span: usize,
    pub t: f64,
    /// Coordinate along the cross axis where the span meets the line.
    pub coord: f64,
}

/// The monotonic spans of an outline, ringed per contour.
#[derive(Default, Clone, Debug)]
pub struct MonoRing {
    pub spans: Vec<MonoSpan>,
}

impl MonoRing {
    /// Decomposes every contour of an outline.
    pub fn build(outline: &Outline) -> Self {
        let mut spans: Vec<MonoSpan> = Vec::with_capacity(outline.curves.len() * 2);
        for ci in 0..outline.contours.len() {
            let ring_start = spans.len();
            for si in outline.contour_curves(ci) {
                let curve = &outline.curves[si];
                let mut cuts: Vec<f64> = Vec::with_capacity(6);
                cuts.push(0.0);
                for dim in [0usize, 1] {
                    for t in curve.extrema(dim) {
                        cuts.push(t);
                    }
                }
                cuts.push(1.0);
                cuts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));
                cuts.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
                let mut t0 = cuts[0];
                for &t1 in &cuts[1..] {
                    let bbox = curve.bbox_range(t0, t1);
                    if bbox.width() + bbox.height() < MIN_SPAN_EXTENT
                        && spans.len() > ring_start
                    {
                        // Noise: fold into the previous span of this ring.
                        let prev = spans.last_mut().unwrap();
                        if prev.curve == si {
                            prev.t1 = t1;
                            t0 = t1;
                            continue;
                        }
                    }
                    let p0 = curve.eval(t0);
                    let p1 = curve.eval(t1);
                    spans.push(MonoSpan {
                        curve: si,
                        contour: ci,
                        t0,
                        t1,
                        bbox,
                        x_up: p1.x >= p0.x,
                        y_up: p1.y >= p0.y,
                        next: 0,
                        prev: 0,
                        excluded: false,
                    });
                    t0 = t1;
                }
            }
            // Close the ring for this contour.
            let ring_end = spans.len();
            if ring_end > ring_start {
                for ix in ring_start..ring_end {
                    spans[ix].next = if ix + 1 == ring_end { ring_start } else { ix + 1 };
                    spans[ix].prev = if ix == ring_start { ring_end - 1 } else { ix - 1 };
                }
            }
        }
        Self { spans }
    }

    /// Spans belonging to one segment, in parameter order.
    pub fn spans_of_curve(&self, curve_ix: usize) -> Vec<usize> {
        (0..self.spans.len())
            .filter(|&ix| self.spans[ix].curve == curve_ix)
            .collect()
    }

    /// Every span crossing the line `dim == value`, sorted by the
    /// cross-axis coordinate.
    ///
    /// Crossings landing exactly on a boundary shared by two spans are
    /// reported once when the neighbors continue in the same direction
    /// and cancelled entirely when they are antiparallel (the line only
    /// grazes an extremum there). Spans parallel to the line never
    /// report; ring walks skip over them when pairing boundary hits.
    pub fn find_at(&self, curves: &[Curve], dim: Dimension, value: f64) -> Vec<SpanHit> {
        let cross = cross_dim(dim);
        let mut hits: Vec<SpanHit> = Vec::new();
        let mut hit_of_span: Vec<Option<usize>> = vec![None; self.spans.len()];
        for (ix, span) in self.spans.iter().enumerate() {
            if span.excluded || span.extent(dim) < FLAT_EXTENT {
                continue;
            }
            if value < span.low(dim) - 1e-9 || value > span.high(dim) + 1e-9 {
                continue;
            }
            let poly = &curves[span.curve].polys[dim];
            let mut t_hit = None;
            for t in poly.solve(value) {
                if t >= span.t0 - 1e-9 && t <= span.t1 + 1e-9 {
                    t_hit = Some(t.clamp(span.t0, span.t1));
                    break;
                }
            }
            let Some(t) = t_hit else {
                continue;
            };
            let coord = curves[span.curve].polys[cross].eval(t);
            hit_of_span[ix] = Some(hits.len());
            hits.push(SpanHit {
                span: ix,
                t,
                coord,
            });
        }
        let mut removed = vec![false; hits.len()];
        for i in 0..hits.len() {
            if removed[i] {
                continue;
            }
            let hit = hits[i];
            let span = &self.spans[hit.span];
            if (hit.t - span.t1).abs() > 1e-9 {
                continue;
            }
            // The crossing sits on this span's trailing boundary; walk
            // forward over parallel spans to the next transversal one.
            let mut j = span.next;
            let mut steps = 0;
            while self.spans[j].extent(dim) < FLAT_EXTENT && steps < self.spans.len() {
                j = self.spans[j].next;
                steps += 1;
            }
            let Some(k) = hit_of_span[j] else {
                continue;
            };
            if k == i || removed[k] {
                continue;
            }
            let other = hits[k];
            let other_span = &self.spans[other.span];
            if (other.t - other_span.t0).abs() > 1e-9 {
                continue;
            }
            if (other.coord - hit.coord).abs() > 1e-6 {
                continue;
            }
            if span.goes_up(dim) == other_span.goes_up(dim) {
                // One geometric crossing shared by two spans.
                removed[k] = true;
            } else {
                // Tangent touch at an extremum: no crossing at all.
                removed[i] = true;
                removed[k] = true;
            }
        }
        let mut out: Vec<SpanHit> = hits
            .into_iter()
            .zip(removed)
            .filter_map(|(hit, gone)| (!gone).then_some(hit))
            .collect();
        out.sort_by(|a, b| a.coord.partial_cmp(&b.coord).unwrap_or(core::cmp::Ordering::Equal));
        out
    }

    /// Nonzero-rule winding at `coord`, accumulated from the hits below
    /// it (a ray toward -infinity along the cross axis).
    ///
    /// Inside a counter-clockwise contour this is +1. The sign of a
    /// crossing depends on which axis the query line sits on: along a
    /// horizontal line an upward crossing left of the probe counts -1,
    /// along a vertical line a rightward crossing below it counts +1.
    pub fn winding_before(&self, hits: &[SpanHit], dim: Dimension, coord: f64) -> i32 {
        let up_sign = if dim == X { 1 } else { -1 };
        let mut winding = 0;
        for hit in hits {
            if hit.coord < coord - 1e-9 {
                winding += if self.spans[hit.span].goes_up(dim) {
                    up_sign
                } else {
                    -up_sign
                };
            }
        }
        winding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{X, Y};
    use kurbo::Point;

    fn closed_path(points: &[Point]) -> Outline {
        let mut pen = Outline::builder();
        pen.move_to(points[0]);
        for &p in &points[1..] {
            pen.line_to(p);
        }
        pen.close();
        pen.build()
    }

    #[test]
    fn decomposition_covers_the_parameter_range() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        // S-shaped curve with interior extrema on both axes
        pen.curve_to(
            Point::new(150.0, 120.0),
            Point::new(-50.0, -20.0),
            Point::new(100.0, 100.0),
        );
        let outline = pen.build();
        let ring = MonoRing::build(&outline);
        let spans = ring.spans_of_curve(0);
        assert!(spans.len() >= 2);
        let mut t = 0.0;
        for &ix in &spans {
            let span = &ring.spans[ix];
            assert!((span.t0 - t).abs() < 1e-6, "gap before t={t}");
            assert!(span.t1 > span.t0);
            t = span.t1;
        }
        assert!((t - 1.0).abs() < 1e-6);
    }

    #[test]
    fn find_at_reports_interior_crossings() {
        let outline = closed_path(&[
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]);
        let ring = MonoRing::build(&outline);
        let hits = ring.find_at(&outline.curves, Y, 50.0);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].coord - 0.0).abs() < 1e-9);
        assert!((hits[1].coord - 100.0).abs() < 1e-9);
        // Left edge runs downward on a counter-clockwise rectangle.
        assert!(ring.spans[hits[1].span].y_up);
        assert!(!ring.spans[hits[0].span].y_up);
        assert_eq!(ring.winding_before(&hits, Y, 50.0), 1);
        assert_eq!(ring.winding_before(&hits, Y, -10.0), 0);
    }

    #[test]
    fn find_at_cancels_a_grazed_apex() {
        // Triangle; a horizontal line through the apex must not report
        // a crossing pair there.
        let outline = closed_path(&[
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 80.0),
        ]);
        let ring = MonoRing::build(&outline);
        let hits = ring.find_at(&outline.curves, Y, 80.0);
        assert!(hits.is_empty());
        let hits = ring.find_at(&outline.curves, Y, 40.0);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn find_at_keeps_one_hit_at_a_passing_corner() {
        // Zig-zag where the line passes through a corner but the contour
        // genuinely crosses it there.
        let outline = closed_path(&[
            Point::new(0.0, 0.0),
            Point::new(60.0, 0.0),
            Point::new(80.0, 50.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]);
        let ring = MonoRing::build(&outline);
        let hits = ring.find_at(&outline.curves, Y, 50.0);
        // corner at (80, 50) counts once, left edge once
        assert_eq!(hits.len(), 2);
        assert!((hits[1].coord - 80.0).abs() < 1e-6);
    }

    #[test]
    fn excluded_spans_do_not_report() {
        let outline = closed_path(&[
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]);
        let mut ring = MonoRing::build(&outline);
        for span in &mut ring.spans {
            span.excluded = true;
        }
        assert!(ring.find_at(&outline.curves, Y, 50.0).is_empty());
    }
}
