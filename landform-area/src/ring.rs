//! Proto-rings: possibly unclosed polylines grown during assembly.

use std::collections::VecDeque;
use std::fmt;

use landform_core::{Location, NodeRef};

use crate::segment::{Segment, Vertex};

/// Index of a proto-ring in the assembler's ring table.
///
/// Ring ids are stable: when two rings merge, the absorbed slot is
/// vacated and the segments that pointed at it are relinked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RingId(pub(crate) usize);

/// A doubly-ended vertex sequence that grows into a ring.
///
/// The winding orientation is fixed when the ring is founded (clockwise
/// rings are outer rings) and survives merging; merged rings adopt the
/// orientation of the surviving ring.
#[derive(Debug, Clone)]
pub struct ProtoRing {
    nodes: VecDeque<Vertex>,
    cw: bool,
}

impl ProtoRing {
    /// Found a ring from a segment with the given winding orientation.
    pub fn from_segment(segment: &Segment, cw: bool) -> Self {
        let mut nodes = VecDeque::with_capacity(2);
        nodes.push_back(segment.first());
        nodes.push_back(segment.second());
        Self { nodes, cw }
    }

    pub fn first(&self) -> Vertex {
        *self.nodes.front().expect("proto-rings are never empty")
    }

    pub fn last(&self) -> Vertex {
        *self.nodes.back().expect("proto-rings are never empty")
    }

    /// A ring is closed once its endpoints meet.
    pub fn closed(&self) -> bool {
        self.first().location == self.last().location
    }

    /// Clockwise rings are outer rings, counter-clockwise rings holes.
    pub fn is_outer(&self) -> bool {
        self.cw
    }

    pub fn add_end(&mut self, vertex: Vertex) {
        self.nodes.push_back(vertex);
    }

    pub fn add_start(&mut self, vertex: Vertex) {
        self.nodes.push_front(vertex);
    }

    /// Concatenate another open ring onto this ring's end. The other
    /// ring's first vertex must coincide with this ring's last; pass
    /// `reversed` when its last vertex coincides instead.
    pub(crate) fn append_ring(&mut self, other: ProtoRing, reversed: bool) {
        let mut nodes = other.nodes;
        if reversed {
            nodes.make_contiguous().reverse();
        }
        nodes.pop_front();
        self.nodes.extend(nodes);
    }

    /// Concatenate another open ring onto this ring's start. The other
    /// ring's last vertex must coincide with this ring's first; pass
    /// `reversed` when its first vertex coincides instead.
    pub(crate) fn prepend_ring(&mut self, other: ProtoRing, reversed: bool) {
        let mut nodes = other.nodes;
        if reversed {
            nodes.make_contiguous().reverse();
        }
        nodes.pop_back();
        while let Some(vertex) = nodes.pop_back() {
            self.nodes.push_front(vertex);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.nodes.iter()
    }

    /// The vertex locations in ring order, for the planar predicates.
    pub fn locations(&self) -> Vec<Location> {
        self.nodes.iter().map(|vertex| vertex.location).collect()
    }

    /// The vertex sequence as node references, for emission.
    pub fn node_refs(&self) -> Vec<NodeRef> {
        self.nodes.iter().map(|vertex| vertex.node_ref()).collect()
    }
}

impl fmt::Display for ProtoRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut separate = false;
        for vertex in &self.nodes {
            if separate {
                write!(f, "-")?;
            }
            write!(f, "{}", vertex.location)?;
            separate = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn vertex(id: i64, x: i32, y: i32) -> Vertex {
        Vertex::new(id, Location::new(x, y))
    }

    fn segment(a: Vertex, b: Vertex) -> Segment {
        Segment::new(a, b).expect("not degenerate")
    }

    #[rstest]
    fn grows_at_both_ends_and_closes() {
        let mut ring = ProtoRing::from_segment(
            &segment(vertex(1, 0, 0), vertex(2, 0, 10)),
            true,
        );
        assert!(!ring.closed());

        ring.add_end(vertex(3, 10, 10));
        ring.add_start(vertex(4, 10, 0));
        assert_eq!(ring.first().id, 4);
        assert_eq!(ring.last().id, 3);

        ring.add_end(vertex(4, 10, 0));
        assert!(ring.closed());
        assert_eq!(ring.len(), 5);
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn append_ring_joins_sequences(#[case] reversed: bool) {
        // Target runs 0,0 -> 0,10; other covers 0,10 -> 20,10.
        let mut target = ProtoRing::from_segment(
            &segment(vertex(1, 0, 0), vertex(2, 0, 10)),
            true,
        );
        let mut other = ProtoRing::from_segment(
            &segment(vertex(2, 0, 10), vertex(3, 10, 10)),
            true,
        );
        other.add_end(vertex(4, 20, 10));
        let other = if reversed {
            let mut flipped = ProtoRing::from_segment(
                &segment(vertex(4, 20, 10), vertex(3, 10, 10)),
                true,
            );
            flipped.add_end(vertex(2, 0, 10));
            flipped
        } else {
            other
        };

        target.append_ring(other, reversed);
        let ids: Vec<i64> = target.vertices().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[rstest]
    fn prepend_ring_joins_sequences() {
        // Target runs 10,0 -> 10,10; other covers 0,0 -> 10,0.
        let mut target = ProtoRing::from_segment(
            &segment(vertex(3, 10, 0), vertex(4, 10, 10)),
            true,
        );
        let mut other = ProtoRing::from_segment(
            &segment(vertex(1, 0, 0), vertex(2, 5, 0)),
            true,
        );
        other.add_end(vertex(3, 10, 0));

        target.prepend_ring(other, false);
        let ids: Vec<i64> = target.vertices().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}
