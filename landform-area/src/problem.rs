//! Records of geometric defects found while assembling an area.

use landform_core::NodeRef;

/// The kinds of defect that make a multipolygon invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    /// Two segments properly intersect.
    Intersection,
    /// A ring could not be closed; reported at both open endpoints.
    RingNotClosed,
    /// An inner ring has no containing outer ring.
    NoOuterRingForInner,
}

/// One defect, anchored at the node reference where it was observed.
///
/// Intersection problems use a synthetic reference with id 0 at the
/// computed crossing point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Problem {
    pub kind: ProblemKind,
    pub node: NodeRef,
}

impl Problem {
    pub fn new(kind: ProblemKind, node: NodeRef) -> Self {
        Self { kind, node }
    }
}
