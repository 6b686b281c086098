//! Geometry kernel for letterform outlines.
//!
//! An [`Outline`] is an arena of anchor points, curve segments and
//! contours addressed by index, in the shape editors keep them: points
//! carry optional control points toward either neighbor and segments own
//! the parametric form of the curve between two anchors.
//!
//! On top of the arena the crate provides the exact machinery a hinting
//! or editing layer needs: closed-form and bisected root solving
//! ([`poly`]), curve–curve intersection ([`intersect`]), decomposition
//! into axis-monotonic spans with winding queries ([`monotonic`]),
//! simplification ([`simplify`]) and outline degree conversion
//! ([`conv`]).

pub mod approx;
pub mod contour;
pub mod conv;
pub mod curve;
pub mod intersect;
pub mod monotonic;
pub mod point;
pub mod poly;
pub mod simplify;

pub use contour::{Contour, Outline, OutlineBuilder};
pub use curve::Curve;
pub use monotonic::{MonoRing, MonoSpan};
pub use point::{CurvePoint, PointKind};
pub use poly::AxisPoly;

/// Index of a coordinate axis.
///
/// A plain alias because it is used to index per-axis arrays.
pub type Dimension = usize;

/// The x axis.
pub const X: Dimension = 0;
/// The y axis.
pub const Y: Dimension = 1;

/// The other axis.
pub const fn cross_dim(dim: Dimension) -> Dimension {
    1 - dim
}
