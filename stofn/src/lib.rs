//! Automatic stem-hint detection for letterform outlines.
//!
//! Given an outline and a handful of font-wide constants, [`analyze`]
//! runs a multi-pass heuristic analysis that discovers stems — parallel
//! edge features such as strokes, bars, serifs, bends and rounded
//! terminals — and reports, per contour point, which stems are
//! simultaneously enforceable there.
//!
//! The passes run leaf to root: per-point tangent profiles
//! ([`profile`]), collinear point groups ([`lines`]), stem discovery and
//! the special-case synthesizers ([`detect`]), active-zone computation
//! ([`active`]), conflict ranking and bundling ([`hier`]) and finally
//! mask assembly ([`masks`]). All derived state is scratch owned by one
//! [`Analyzer`] and dies with it; the outline is never mutated.

pub mod active;
pub mod analyzer;
pub mod detect;
pub mod hier;
pub mod lines;
pub mod masks;
pub mod profile;
pub mod stem;

use thiserror::Error;

pub use analyzer::{analyze, Analysis, Analyzer};
pub use lines::CollinearGroup;
pub use masks::HintMask;
pub use profile::PointProfile;
pub use stem::{StemBundle, StemHypothesis};

/// Font-wide constants the analyzer consumes.
#[derive(Copy, Clone, Debug)]
pub struct FontMetrics {
    pub units_per_em: f64,
    pub ascent: f64,
    pub descent: f64,
    /// Italic angle in degrees, clockwise from vertical; zero when
    /// upright.
    pub italic_angle: f64,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            units_per_em: 1000.0,
            ascent: 800.0,
            descent: 200.0,
            italic_angle: 0.0,
        }
    }
}

/// One alignment zone from the font's private dictionary.
///
/// `width` may be negative; [`BlueZone::bottom`] and [`BlueZone::top`]
/// order the pair either way.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlueZone {
    pub start: f64,
    pub width: f64,
}

impl BlueZone {
    pub fn bottom(&self) -> f64 {
        self.start.min(self.start + self.width)
    }

    pub fn top(&self) -> f64 {
        self.start.max(self.start + self.width)
    }

    /// True when `y` lies in the zone, widened by `fuzz` on both sides.
    pub fn contains(&self, y: f64, fuzz: f64) -> bool {
        y >= self.bottom() - fuzz && y <= self.top() + fuzz
    }
}

/// A pre-existing stem hint, supplied to bias the analysis toward
/// confirming rather than discovering stems.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StemHint {
    pub start: f64,
    pub width: f64,
    /// Vertical stems control x coordinates.
    pub vertical: bool,
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("outline has no contours")]
    EmptyOutline,
    #[error("analysis produced more than {0} stems")]
    StemOverflow(usize),
}

/// The empirically tuned tolerances, scaled from the em size.
///
/// These are preserved constants; re-deriving them changes behavior on
/// real fonts and any difference is a regression.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Tolerances {
    /// Tight angular tier in radians (strict alignment).
    pub slope_error: f64,
    /// Loose angular tier in radians (stub and serif detection).
    pub stub_slope_error: f64,
    /// Distance error for horizontal/vertical stem edges.
    pub dist_error_hv: f64,
    /// Distance error for diagonal stem edges.
    pub dist_error_diag: f64,
    /// Distance error when walking along curved segments.
    pub dist_error_curve: f64,
}

impl Tolerances {
    pub fn new(units_per_em: f64) -> Self {
        let per_mille = units_per_em / 1000.0;
        Self {
            slope_error: outline_geom::approx::TIGHT_SLOPE,
            stub_slope_error: outline_geom::approx::LOOSE_SLOPE,
            dist_error_hv: 3.5 * per_mille,
            dist_error_diag: 5.5 * per_mille,
            dist_error_curve: 2.2 * per_mille,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blue_zone_orders_either_way() {
        let up = BlueZone {
            start: 700.0,
            width: 15.0,
        };
        let down = BlueZone {
            start: 715.0,
            width: -15.0,
        };
        assert_eq!(up.bottom(), down.bottom());
        assert_eq!(up.top(), down.top());
        assert!(up.contains(716.0, 2.0));
        assert!(!up.contains(720.0, 2.0));
    }

    #[test]
    fn tolerances_scale_with_the_em() {
        let small = Tolerances::new(1000.0);
        let big = Tolerances::new(2048.0);
        assert!((small.dist_error_hv - 3.5).abs() < 1e-12);
        assert!((big.dist_error_hv - 3.5 * 2.048).abs() < 1e-9);
        assert_eq!(small.slope_error, big.slope_error);
    }
}
