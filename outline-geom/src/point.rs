//! Anchor points for outline arenas.

use kurbo::{Point, Vec2};

/// How a point joins its two curve segments.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PointKind {
    /// Tangents on either side are unconstrained.
    #[default]
    Corner,
    /// Tangents on either side stay antiparallel.
    Smooth,
    /// One side is a line and the curved side leaves along it.
    Tangent,
}

/// An anchor point in an outline arena.
///
/// Control points are absolute coordinates; the `has_*` flags say whether
/// the corresponding control is in effect (an editor can park a control
/// on its anchor without losing it). Neighbor links are indices into the
/// owning arena's segment list; `None` marks the end of an open contour.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurvePoint {
    pub pos: Point,
    /// Control point shaping the outgoing segment.
    pub next_ctrl: Point,
    /// Control point shaping the incoming segment.
    pub prev_ctrl: Point,
    pub has_next_ctrl: bool,
    pub has_prev_ctrl: bool,
    pub kind: PointKind,
    /// Set on the point that starts its contour.
    pub is_first: bool,
    /// Outgoing segment.
    pub next: Option<usize>,
    /// Incoming segment.
    pub prev: Option<usize>,
    /// Transient index for callers that number points during export.
    pub scratch: i32,
    pub(crate) dead: bool,
}

impl CurvePoint {
    pub fn new(pos: Point) -> Self {
        Self {
            pos,
            next_ctrl: pos,
            prev_ctrl: pos,
            has_next_ctrl: false,
            has_prev_ctrl: false,
            kind: PointKind::Corner,
            is_first: false,
            next: None,
            prev: None,
            scratch: -1,
            dead: false,
        }
    }

    /// Offset from the anchor to the outgoing control.
    pub fn next_off(&self) -> Vec2 {
        self.next_ctrl - self.pos
    }

    /// Offset from the anchor to the incoming control.
    pub fn prev_off(&self) -> Vec2 {
        self.prev_ctrl - self.pos
    }

    /// True when the outgoing control is absent or sits on its anchor.
    pub fn next_ctrl_degenerate(&self) -> bool {
        !self.has_next_ctrl || self.next_off().hypot() < 1e-9
    }

    /// True when the incoming control is absent or sits on its anchor.
    pub fn prev_ctrl_degenerate(&self) -> bool {
        !self.has_prev_ctrl || self.prev_off().hypot() < 1e-9
    }
}
