//! Stem hypotheses and orientation bundles.

use kurbo::{Point, Vec2};

/// One piece of point-pair evidence supporting a stem.
///
/// Either side may be absent (half stems, ghost stems). `potential`
/// flags mark support that matched only within the loose angular tier
/// and may be stolen by a better stem later.
#[derive(Copy, Clone, Debug, Default)]
pub struct StemChunk {
    /// Profile index of the supporting point on the left edge.
    pub l: Option<usize>,
    /// Profile index of the supporting point on the right edge.
    pub r: Option<usize>,
    pub l_potential: bool,
    pub r_potential: bool,
    /// Set when the pair matched as a stub or feature-bend rather than
    /// a clean parallel pair.
    pub stub: bool,
    /// Set when the pair anchors a rounded terminal.
    pub is_ball: bool,
}

/// A range along the stem axis where evidence supports the stem.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ActiveRange {
    pub start: f64,
    pub end: f64,
    /// Came from walking curved rather than straight geometry.
    pub curved: bool,
}

impl ActiveRange {
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A stem that defers to a master during mask assembly.
#[derive(Copy, Clone, Debug)]
pub struct DependentStem {
    pub stem: usize,
    /// The dependent hangs off the master's left edge.
    pub l_base: bool,
}

/// A serif or ball terminal attached to a stem.
#[derive(Copy, Clone, Debug)]
pub struct SerifRef {
    pub stem: usize,
    pub is_ball: bool,
    pub l_base: bool,
}

/// A candidate stem: two parallel edges and the evidence for them.
#[derive(Clone, Debug)]
pub struct StemHypothesis {
    /// Orientation, normalized into the 90°–270° half-plane so diagonal
    /// stems sort consistently.
    pub unit: Vec2,
    /// Unit normal pointing from the left edge to the right edge.
    pub l_to_r: Vec2,
    /// Anchor point of the left edge.
    pub left: Point,
    /// Anchor point of the right edge.
    pub right: Point,
    /// Offset tolerance window of points accepted on the left edge.
    pub lmin: f64,
    pub lmax: f64,
    /// Offset tolerance window of points accepted on the right edge.
    pub rmin: f64,
    pub rmax: f64,
    pub chunks: Vec<StemChunk>,
    pub active: Vec<ActiveRange>,
    /// Zero-width stem aligning a feature to one blue-zone boundary.
    pub ghost: bool,
    /// Index of the blue zone a ghost stem aligns to.
    pub blue: Option<usize>,
    /// Synthesized to control the glyph's overall extent.
    pub bbox: bool,
    /// Synthesized across a symmetric bend point.
    pub corner: bool,
    /// Confirmed from a pre-existing hint rather than discovered.
    pub positioned: bool,
    /// Rejected: wider than its active evidence is long.
    pub too_wide: bool,
    /// Slanted along the font's italic angle.
    pub italic: bool,
    /// Master stem this one defers to during mask assembly.
    pub master: Option<usize>,
    pub dependents: Vec<DependentStem>,
    pub serifs: Vec<SerifRef>,
    /// Stable index once grouped into a bundle; bit position in masks.
    pub stem_idx: Option<usize>,
    /// Supporting point counts per edge.
    pub lpcnt: usize,
    pub rpcnt: usize,
    /// Weighted total active length.
    pub clen: f64,
}

impl StemHypothesis {
    /// A stem through `left` and `right` along `unit`.
    ///
    /// The orientation is normalized into the half-plane and the edges
    /// are swapped — never negated — so that width comes out
    /// non-negative.
    pub fn new(unit: Vec2, left: Point, right: Point) -> Self {
        let unit = normalize_half_plane(unit);
        let l_to_r = Vec2::new(unit.y, -unit.x);
        let (left, right) = if (right - left).dot(l_to_r) < 0.0 {
            (right, left)
        } else {
            (left, right)
        };
        Self {
            unit,
            l_to_r,
            left,
            right,
            lmin: 0.0,
            lmax: 0.0,
            rmin: 0.0,
            rmax: 0.0,
            chunks: Vec::new(),
            active: Vec::new(),
            ghost: false,
            blue: None,
            bbox: false,
            corner: false,
            positioned: false,
            too_wide: false,
            italic: false,
            master: None,
            dependents: Vec::new(),
            serifs: Vec::new(),
            stem_idx: None,
            lpcnt: 0,
            rpcnt: 0,
            clen: 0.0,
        }
    }

    /// Distance between the edges along the left-to-right normal.
    pub fn width(&self) -> f64 {
        (self.right - self.left).dot(self.l_to_r)
    }

    /// Offset of a point from the left edge along the normal.
    pub fn left_offset(&self, p: Point) -> f64 {
        (p - self.left).dot(self.l_to_r)
    }

    /// Offset of a point from the right edge along the normal.
    pub fn right_offset(&self, p: Point) -> f64 {
        (p - self.right).dot(self.l_to_r)
    }

    /// Projection of a point onto the stem axis, measured from the left
    /// anchor.
    pub fn project(&self, p: Point) -> f64 {
        (p - self.left).dot(self.unit)
    }

    /// True when `p` lies within the left edge's tolerance window,
    /// widened by `fudge`.
    pub fn on_left_edge(&self, p: Point, fudge: f64) -> bool {
        let off = self.left_offset(p);
        off >= self.lmin - fudge && off <= self.lmax + fudge
    }

    /// True when `p` lies within the right edge's tolerance window,
    /// widened by `fudge`.
    pub fn on_right_edge(&self, p: Point, fudge: f64) -> bool {
        let off = self.right_offset(p);
        off >= self.rmin - fudge && off <= self.rmax + fudge
    }

    /// Widens an edge window to admit a point already accepted there.
    pub fn adopt_left(&mut self, p: Point) {
        let off = self.left_offset(p);
        self.lmin = self.lmin.min(off);
        self.lmax = self.lmax.max(off);
        self.lpcnt += 1;
    }

    pub fn adopt_right(&mut self, p: Point) {
        let off = self.right_offset(p);
        self.rmin = self.rmin.min(off);
        self.rmax = self.rmax.max(off);
        self.rpcnt += 1;
    }

    /// True for stems whose orientation is exactly or nearly vertical.
    pub fn is_vertical(&self, slope_error: f64) -> bool {
        self.unit.x.abs() < slope_error.sin() && self.unit.y > 0.0
    }

    /// True for stems whose orientation is exactly or nearly horizontal.
    pub fn is_horizontal(&self, slope_error: f64) -> bool {
        self.unit.y.abs() < slope_error.sin() && self.unit.x < 0.0
    }

    /// Weighted active length; straight evidence counts in full, curved
    /// evidence at the preserved empirical factor.
    pub fn recompute_clen(&mut self) {
        const CURVED_WEIGHT: f64 = 0.75;
        self.clen = self
            .active
            .iter()
            .map(|r| {
                if r.curved {
                    r.len() * CURVED_WEIGHT
                } else {
                    r.len()
                }
            })
            .sum();
    }
}

/// Forces a direction into the 90°–270° half-plane.
pub fn normalize_half_plane(unit: Vec2) -> Vec2 {
    if unit.x > 0.0 || (unit.x == 0.0 && unit.y < 0.0) {
        Vec2::new(-unit.x, -unit.y)
    } else {
        unit
    }
}

/// An orientation axis and the stems sharing it, in cross-axis order.
#[derive(Clone, Debug, Default)]
pub struct StemBundle {
    pub unit: Vec2,
    pub stems: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_enforces_the_invariants() {
        // Swapped edges come out with non-negative width.
        let stem = StemHypothesis::new(
            Vec2::new(0.0, 1.0),
            Point::new(180.0, 0.0),
            Point::new(80.0, 0.0),
        );
        assert!(stem.width() >= 0.0);
        assert!((stem.width() - 100.0).abs() < 1e-9);
        assert_eq!(stem.left, Point::new(80.0, 0.0));
        // The orientation lands in the half-plane even when handed the
        // opposite direction.
        let flipped = StemHypothesis::new(
            Vec2::new(0.0, -1.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert_eq!(flipped.unit, Vec2::new(0.0, 1.0));
        assert!((flipped.right - flipped.left).dot(flipped.l_to_r) > 0.0);
    }

    #[test]
    fn projection_and_edges() {
        let stem = StemHypothesis::new(
            Vec2::new(0.0, 1.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert!((stem.project(Point::new(0.0, 250.0)) - 250.0).abs() < 1e-9);
        assert!(stem.on_left_edge(Point::new(1.0, 400.0), 2.0));
        assert!(!stem.on_left_edge(Point::new(10.0, 400.0), 2.0));
        assert!(stem.on_right_edge(Point::new(99.5, -10.0), 2.0));
    }

    #[test]
    fn clen_weights_curved_ranges() {
        let mut stem = StemHypothesis::new(
            Vec2::new(0.0, 1.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        stem.active.push(ActiveRange {
            start: 0.0,
            end: 100.0,
            curved: false,
        });
        stem.active.push(ActiveRange {
            start: 200.0,
            end: 300.0,
            curved: true,
        });
        stem.recompute_clen();
        assert!((stem.clen - 175.0).abs() < 1e-9);
    }
}
