//! The transient per-glyph analyzer and its outputs.
//!
//! One [`Analyzer`] is built per glyph per analysis request and
//! discarded once its outputs are consumed. Its arenas are sized from
//! the point count before any cross-referencing begins, so indices into
//! them stay valid for the whole run.

use kurbo::Vec2;
use outline_geom::{approx, MonoRing, Outline};

use crate::lines::CollinearGroup;
use crate::masks::{HintMask, MaskAssignment, MASK_BITS};
use crate::profile::PointProfile;
use crate::stem::{StemBundle, StemHypothesis};
use crate::{
    active, detect, hier, lines, masks, profile, AnalyzeError, BlueZone, FontMetrics, StemHint,
    Tolerances,
};

/// Scratch state for one glyph analysis.
///
/// All derived objects live in arenas owned here and reference each
/// other by index; nothing borrows into the vectors, so there is no
/// invalidate-on-resize hazard past the pre-sizing in [`Analyzer::new`].
pub struct Analyzer<'a> {
    pub(crate) outline: &'a Outline,
    pub(crate) metrics: FontMetrics,
    pub(crate) blues: Vec<BlueZone>,
    pub(crate) hints: Vec<StemHint>,
    pub(crate) tol: Tolerances,
    pub(crate) ring: MonoRing,
    pub(crate) profiles: Vec<PointProfile>,
    pub(crate) groups: Vec<CollinearGroup>,
    pub(crate) stems: Vec<StemHypothesis>,
    pub(crate) bundles: [StemBundle; 3],
}

/// What an analysis run produces for its collaborators.
#[derive(Clone, Debug)]
pub struct Analysis {
    /// Mask attachments by outline point index, in emission order.
    pub masks: Vec<MaskAssignment>,
    /// False when no stems conflicted and no attachment was needed.
    pub has_conflicts: bool,
    pub counter_masks: Vec<HintMask>,
    /// Every surviving hypothesis, including rejected ones (flagged).
    pub stems: Vec<StemHypothesis>,
    /// Horizontal, vertical and italic bundles, in that order.
    pub bundles: [StemBundle; 3],
}

impl<'a> Analyzer<'a> {
    pub fn new(
        outline: &'a Outline,
        metrics: FontMetrics,
        blues: Vec<BlueZone>,
        hints: Vec<StemHint>,
    ) -> Result<Self, AnalyzeError> {
        if outline.is_empty() {
            return Err(AnalyzeError::EmptyOutline);
        }
        let point_count = outline.points.len();
        Ok(Self {
            outline,
            metrics,
            blues,
            hints,
            tol: Tolerances::new(metrics.units_per_em),
            ring: MonoRing::build(outline),
            profiles: Vec::with_capacity(point_count),
            groups: Vec::with_capacity(2 * point_count),
            stems: Vec::with_capacity(2 * point_count),
            bundles: Default::default(),
        })
    }

    /// Distance error appropriate for a stem's orientation.
    pub(crate) fn stem_dist_error(&self, unit: Vec2) -> f64 {
        if unit.x == 0.0 || unit.y == 0.0 {
            self.tol.dist_error_hv
        } else {
            self.tol.dist_error_diag
        }
    }

    /// True when a direction runs along the font's italic slant.
    pub(crate) fn matches_italic(&self, unit: Vec2) -> bool {
        if self.metrics.italic_angle == 0.0 {
            return false;
        }
        let angle = self.metrics.italic_angle.to_radians();
        let italic = Vec2::new(angle.sin(), angle.cos());
        approx::parallel_within(unit, italic, self.tol.slope_error)
    }

    /// Runs every pass and consumes the analyzer.
    pub fn run(mut self) -> Result<Analysis, AnalyzeError> {
        self.profiles = profile::build_profiles(self.outline, &self.ring, &self.tol);
        self.groups = lines::find_collinear_groups(&self.profiles, &self.tol);
        detect::detect_stems(&mut self);
        detect::stabilize_edges_with_groups(&mut self);
        detect::normalize_stubs(&mut self);
        detect::ghost_stems(&mut self);
        detect::bbox_stems(&mut self);
        detect::diagonal_corner_stems(&mut self);
        detect::apply_existing_hints(&mut self);
        active::figure_all_active(&mut self);
        active::find_unlikely_stems(&mut self);
        hier::look_for_masters(&mut self);
        hier::bundle_stems(&mut self);
        let indexed = self.stems.iter().filter(|s| s.stem_idx.is_some()).count();
        if indexed > MASK_BITS {
            return Err(AnalyzeError::StemOverflow(MASK_BITS));
        }
        let (mask_list, has_conflicts) = masks::figure_hint_masks(&mut self);
        let (counter_masks, _) = masks::figure_counter_masks(&self);
        Ok(Analysis {
            masks: mask_list,
            has_conflicts,
            counter_masks,
            stems: self.stems,
            bundles: self.bundles,
        })
    }
}

/// Analyzes one glyph outline.
///
/// The outline must not be mutated for the duration of the call; the
/// returned [`Analysis`] owns everything it reports.
pub fn analyze(
    outline: &Outline,
    metrics: FontMetrics,
    blues: &[BlueZone],
    hints: &[StemHint],
) -> Result<Analysis, AnalyzeError> {
    Analyzer::new(outline, metrics, blues.to_vec(), hints.to_vec())?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use pretty_assertions::assert_eq;

    fn rect(pen: &mut outline_geom::OutlineBuilder, x0: f64, y0: f64, x1: f64, y1: f64) {
        pen.move_to(Point::new(x0, y0));
        pen.line_to(Point::new(x1, y0));
        pen.line_to(Point::new(x1, y1));
        pen.line_to(Point::new(x0, y1));
        pen.close();
    }

    fn run(outline: &Outline) -> Analysis {
        analyze(outline, FontMetrics::default(), &[], &[]).unwrap()
    }

    #[test]
    fn empty_outline_is_rejected() {
        let outline = Outline::default();
        assert!(matches!(
            analyze(&outline, FontMetrics::default(), &[], &[]),
            Err(AnalyzeError::EmptyOutline)
        ));
    }

    #[test]
    fn rectangle_yields_one_stem_per_axis() {
        let mut pen = Outline::builder();
        rect(&mut pen, 0.0, 0.0, 100.0, 200.0);
        let outline = pen.build();
        let analysis = run(&outline);
        let h = &analysis.bundles[0];
        let v = &analysis.bundles[1];
        assert_eq!(h.stems.len(), 1);
        assert_eq!(v.stems.len(), 1);
        assert!(analysis.bundles[2].stems.is_empty());
        let h_stem = &analysis.stems[h.stems[0]];
        let v_stem = &analysis.stems[v.stems[0]];
        assert!((v_stem.width() - 100.0).abs() < 1e-6);
        assert!((h_stem.width() - 200.0).abs() < 1e-6);
        // No conflicts anywhere: no mask attachments.
        assert!(!analysis.has_conflicts);
        assert!(analysis.masks.is_empty());
        // Invariants from the data model.
        for stem in &analysis.stems {
            if !stem.ghost {
                assert!(stem.width() >= 0.0);
                assert!((stem.right - stem.left).dot(stem.l_to_r) >= 0.0);
            }
            assert!(stem.unit.x < 0.0 || (stem.unit.x == 0.0 && stem.unit.y > 0.0));
        }
    }

    #[test]
    fn two_parallel_lines_make_one_full_height_stem() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.line_to(Point::new(0.0, 500.0));
        pen.move_to(Point::new(100.0, 0.0));
        pen.line_to(Point::new(100.0, 500.0));
        let outline = pen.build();
        let analysis = run(&outline);
        let v = &analysis.bundles[1];
        assert_eq!(v.stems.len(), 1);
        let stem = &analysis.stems[v.stems[0]];
        assert!((stem.width() - 100.0).abs() < 1e-6);
        let covered: f64 = stem.active.iter().map(|r| r.len()).sum();
        assert!(
            (covered - 500.0).abs() < 1.0,
            "active covers {covered} of 500"
        );
        assert!(!stem.too_wide);
    }

    #[test]
    fn three_even_bars_share_one_counter_mask() {
        let mut pen = Outline::builder();
        rect(&mut pen, 0.0, 0.0, 60.0, 400.0);
        rect(&mut pen, 100.0, 0.0, 160.0, 400.0);
        rect(&mut pen, 200.0, 0.0, 260.0, 400.0);
        let outline = pen.build();
        let analysis = run(&outline);
        assert_eq!(analysis.bundles[1].stems.len(), 3);
        assert_eq!(analysis.counter_masks.len(), 1);
        let mask = &analysis.counter_masks[0];
        assert_eq!(mask.count(), 3);
        for &si in &analysis.bundles[1].stems {
            let ix = analysis.stems[si].stem_idx.unwrap();
            assert!(mask.contains(ix), "stem bit {ix} missing from counter mask");
        }
    }

    #[test]
    fn uneven_gaps_make_no_counter_mask() {
        let mut pen = Outline::builder();
        rect(&mut pen, 0.0, 0.0, 60.0, 400.0);
        rect(&mut pen, 100.0, 0.0, 160.0, 400.0);
        rect(&mut pen, 260.0, 0.0, 320.0, 400.0);
        let outline = pen.build();
        let analysis = run(&outline);
        assert_eq!(analysis.bundles[1].stems.len(), 3);
        assert!(analysis.counter_masks.is_empty());
    }

    #[test]
    fn ghost_stem_appears_in_a_blue_zone() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.line_to(Point::new(0.0, 500.0));
        pen.move_to(Point::new(100.0, 0.0));
        pen.line_to(Point::new(100.0, 500.0));
        let outline = pen.build();
        let blues = [crate::BlueZone {
            start: 495.0,
            width: 10.0,
        }];
        let analysis = analyze(&outline, FontMetrics::default(), &blues, &[]).unwrap();
        let ghost = analysis
            .stems
            .iter()
            .find(|s| s.ghost)
            .expect("a ghost stem in the blue zone");
        assert_eq!(ghost.blue, Some(0));
        assert!((ghost.width() - 0.0).abs() < 1e-9);
        assert!((ghost.left.y - 500.0).abs() < 1e-9);
    }

    #[test]
    fn overlapping_stems_conflict_and_emit_masks() {
        let mut pen = Outline::builder();
        rect(&mut pen, 0.0, 0.0, 60.0, 300.0);
        rect(&mut pen, 30.0, 200.0, 90.0, 500.0);
        let outline = pen.build();
        let analysis = run(&outline);
        assert!(analysis.has_conflicts);
        assert!(!analysis.masks.is_empty());
        // Some vertical stem defers to a master.
        let vertical = &analysis.bundles[1];
        assert!(vertical.stems.len() >= 2);
        let masters: Vec<bool> = vertical
            .stems
            .iter()
            .map(|&si| analysis.stems[si].master.is_some())
            .collect();
        assert!(masters.iter().any(|&m| m) && !masters.iter().all(|&m| m));
        // No mask both activates a dependent and its master.
        for (_, mask) in &analysis.masks {
            for &si in &vertical.stems {
                let stem = &analysis.stems[si];
                if let (Some(master), Some(ix)) = (stem.master, stem.stem_idx) {
                    let master_ix = analysis.stems[master].stem_idx.unwrap();
                    assert!(!(mask.contains(ix) && mask.contains(master_ix)));
                }
            }
        }
    }

    #[test]
    fn analysis_is_deterministic_and_masks_idempotent() {
        let mut pen = Outline::builder();
        rect(&mut pen, 0.0, 0.0, 60.0, 300.0);
        rect(&mut pen, 30.0, 200.0, 90.0, 500.0);
        let outline = pen.build();
        let first = run(&outline);
        let second = run(&outline);
        assert_eq!(first.masks.len(), second.masks.len());
        for (a, b) in first.masks.iter().zip(second.masks.iter()) {
            assert_eq!(a.0, b.0);
            assert_eq!(a.1.bytes(), b.1.bytes());
        }
        assert_eq!(first.counter_masks.len(), second.counter_masks.len());
    }

    #[test]
    fn existing_hints_are_confirmed() {
        let mut pen = Outline::builder();
        rect(&mut pen, 0.0, 0.0, 100.0, 200.0);
        let outline = pen.build();
        let hints = [crate::StemHint {
            start: 0.0,
            width: 100.0,
            vertical: true,
        }];
        let analysis = analyze(&outline, FontMetrics::default(), &[], &hints).unwrap();
        let positioned: Vec<_> = analysis.stems.iter().filter(|s| s.positioned).collect();
        assert_eq!(positioned.len(), 1);
        assert!((positioned[0].width() - 100.0).abs() < 1e-6);
        // Confirmed, not duplicated.
        assert_eq!(analysis.bundles[1].stems.len(), 1);
    }

    #[test]
    fn single_point_contour_analyzes_without_panic() {
        let mut pen = Outline::builder();
        pen.move_to(Point::new(50.0, 50.0));
        pen.close();
        let outline = pen.build();
        let analysis = run(&outline);
        for stem in &analysis.stems {
            assert!(stem.width().is_finite());
        }
        assert!(analysis.counter_masks.is_empty());
    }

    #[test]
    fn italic_slant_is_recognized() {
        let metrics = FontMetrics {
            italic_angle: 12.0,
            ..Default::default()
        };
        // Parallelogram leaning 12 degrees: a slanted stem.
        let lean = (12.0_f64).to_radians().tan() * 400.0;
        let mut pen = Outline::builder();
        pen.move_to(Point::new(0.0, 0.0));
        pen.line_to(Point::new(60.0, 0.0));
        pen.line_to(Point::new(60.0 + lean, 400.0));
        pen.line_to(Point::new(lean, 400.0));
        pen.close();
        let outline = pen.build();
        let analysis = analyze(&outline, metrics, &[], &[]).unwrap();
        let italic_stems: Vec<_> = analysis.stems.iter().filter(|s| s.italic).collect();
        assert!(!italic_stems.is_empty());
        assert!(!analysis.bundles[2].stems.is_empty());
    }
}
