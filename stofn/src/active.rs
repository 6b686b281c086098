//! Active-zone computation: where along its axis a stem is real.
//!
//! Every supporting point projects onto the stem axis and extends along
//! adjoining geometry while it stays close to the edge; the per-edge
//! interval lists are merged, the left and right lists intersected, and
//! the weighted total length later rejects stems wider than their
//! evidence is long.

use crate::analyzer::Analyzer;
use crate::stem::ActiveRange;

/// Steps of the curved-segment walk, per direction.
const WALK_LIMIT: usize = 64;

/// Computes the active ranges of every stem.
pub(crate) fn figure_all_active(az: &mut Analyzer) {
    for si in 0..az.stems.len() {
        figure_stem_active(az, si);
    }
}

/// Projects the stem's evidence onto its axis and intersects the edges.
pub(crate) fn figure_stem_active(az: &mut Analyzer, si: usize) {
    let mut left: Vec<ActiveRange> = Vec::new();
    let mut right: Vec<ActiveRange> = Vec::new();
    for chunk in az.stems[si].chunks.clone() {
        if let Some(p) = chunk.l {
            left.push(edge_extension(az, si, p, true));
        }
        if let Some(p) = chunk.r {
            right.push(edge_extension(az, si, p, false));
        }
    }
    merge_ranges(&mut left);
    merge_ranges(&mut right);
    let stem = &az.stems[si];
    let ranges = if left.is_empty() {
        // Ghost and single-edge stems live on one edge's evidence.
        right
    } else if right.is_empty() {
        left
    } else if stem.bbox || stem.corner {
        // Synthesized stems keep every shred of support.
        let mut all = left;
        all.extend(right);
        merge_ranges(&mut all);
        all
    } else {
        intersect_ranges(&left, &right)
    };
    let stem = &mut az.stems[si];
    stem.active = ranges;
    stem.recompute_clen();
}

/// The projection interval one supporting point contributes, extended
/// along its contour while the walk stays near the edge.
fn edge_extension(az: &Analyzer, si: usize, profile_ix: usize, is_left: bool) -> ActiveRange {
    let stem = &az.stems[si];
    let pos = az.profiles[profile_ix].pos;
    let center = stem.project(pos);
    let mut lo = center;
    let mut hi = center;
    let mut curved = false;
    let limit = az.tol.dist_error_curve;
    let window = if is_left {
        (stem.lmin, stem.lmax)
    } else {
        (stem.rmin, stem.rmax)
    };
    for forward in [true, false] {
        let mut point_ix = az.profiles[profile_ix].point;
        for _ in 0..WALK_LIMIT {
            let point = &az.outline.points[point_ix];
            let seg = if forward { point.next } else { point.prev };
            let Some(seg) = seg else {
                break;
            };
            let curve = &az.outline.curves[seg];
            let mut stopped = false;
            let samples = if forward {
                [0.25, 0.5, 0.75, 1.0]
            } else {
                [0.75, 0.5, 0.25, 0.0]
            };
            for t in samples {
                let p = curve.eval(t);
                let off = if is_left {
                    stem.left_offset(p)
                } else {
                    stem.right_offset(p)
                };
                if off < window.0 - limit || off > window.1 + limit {
                    stopped = true;
                    break;
                }
                let proj = stem.project(p);
                lo = lo.min(proj);
                hi = hi.max(proj);
                if !curve.is_linear {
                    curved = true;
                }
            }
            if stopped {
                break;
            }
            point_ix = if forward { curve.to } else { curve.from };
            if point_ix == az.profiles[profile_ix].point {
                break;
            }
        }
    }
    ActiveRange {
        start: lo,
        end: hi,
        curved,
    }
}

/// Merges overlapping or touching ranges in place.
pub(crate) fn merge_ranges(ranges: &mut Vec<ActiveRange>) {
    if ranges.len() < 2 {
        return;
    }
    ranges.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(core::cmp::Ordering::Equal));
    let mut merged: Vec<ActiveRange> = Vec::with_capacity(ranges.len());
    for range in ranges.drain(..) {
        match merged.last_mut() {
            Some(last) if range.start <= last.end + 1e-9 => {
                last.end = last.end.max(range.end);
                last.curved |= range.curved;
            }
            _ => merged.push(range),
        }
    }
    *ranges = merged;
}

/// Intersects two sorted merged range lists.
pub(crate) fn intersect_ranges(left: &[ActiveRange], right: &[ActiveRange]) -> Vec<ActiveRange> {
    let mut out = Vec::new();
    let mut li = 0;
    let mut ri = 0;
    while li < left.len() && ri < right.len() {
        let l = left[li];
        let r = right[ri];
        let start = l.start.max(r.start);
        let end = l.end.min(r.end);
        if end > start {
            out.push(ActiveRange {
                start,
                end,
                curved: l.curved || r.curved,
            });
        }
        if l.end < r.end {
            li += 1;
        } else {
            ri += 1;
        }
    }
    out
}

/// Rejects stems whose width exceeds their weighted active length:
/// wider than they are "tall", they are unlikely to be a real stroke.
pub(crate) fn find_unlikely_stems(az: &mut Analyzer) {
    let em = az.metrics.units_per_em;
    for stem in &mut az.stems {
        if stem.ghost || stem.bbox || stem.corner || stem.positioned {
            continue;
        }
        let width = stem.width();
        if width > stem.clen || width > 0.6 * em {
            stem.too_wide = true;
        }
    }
}
