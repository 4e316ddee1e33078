//! Ring assembly for multipolygon relations.

use log::{debug, trace, warn};

use landform_core::geom::{
    is_below, point_in_ring, ring_area_twice, segment_intersection, y_range_overlap,
};
use landform_core::{AreaBuilder, Buffer, NodeRef, Relation, Way};

use crate::problem::{Problem, ProblemKind};
use crate::ring::{ProtoRing, RingId};
use crate::segment::{Segment, Vertex};

// Which end of a ring an attachment grew.
#[derive(Debug, Clone, Copy)]
enum GrownEnd {
    Front,
    Back,
}

/// Assembles area entities from multipolygon relations and their way
/// members.
///
/// One assembler serves many relations; it carries only configuration
/// and, when enabled, the accumulated list of [`Problem`]s. Bad geometry
/// never fails the pipeline: the assembler always commits an area, and
/// an area it could not build rings for is simply invalid.
///
/// # Examples
/// ```
/// use landform_area::Assembler;
///
/// let mut assembler = Assembler::new();
/// assembler.remember_problems(true);
/// assert!(assembler.problems().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Assembler {
    problems: Vec<Problem>,
    remember_problems: bool,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable collection of problems found in the input
    /// data. Collection costs a little memory per defect, so it is off
    /// by default.
    pub fn remember_problems(&mut self, remember: bool) {
        self.remember_problems = remember;
    }

    /// The problems found so far, in detection order.
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn clear_problems(&mut self) {
        self.problems.clear();
    }

    /// Assemble `relation` from its way members and commit the result
    /// into `out`: a valid area with rings, or an invalid area without.
    pub fn assemble(&mut self, relation: &Relation, ways: &[&Way], out: &mut Buffer) {
        let mut segments = extract_segments(ways);
        debug!(
            "assembling relation {}: {} ways, {} segments",
            relation.id,
            ways.len(),
            segments.len()
        );

        segments.sort();
        cancel_duplicate_segments(&mut segments);

        // The area starts out without rings, which is the invalid area;
        // it can be committed at any point from here on.
        let mut builder = AreaBuilder::from_relation(relation);

        if self.find_intersections(&segments) {
            out.push(builder.finish());
            return;
        }

        let (rings, ring_order) = grow_rings(&mut segments);

        if self.check_for_open_rings(&rings) {
            debug!("relation {}: not all rings are closed", relation.id);
            out.push(builder.finish());
            return;
        }

        // Partition into outer and inner rings and nest each inner ring
        // under its smallest containing outer ring.
        let outer_ids: Vec<RingId> = ring_order
            .iter()
            .copied()
            .filter(|id| ring(&rings, *id).is_outer())
            .collect();
        let mut nested: Vec<Vec<RingId>> = vec![Vec::new(); outer_ids.len()];

        for &inner_id in ring_order.iter().filter(|id| !ring(&rings, **id).is_outer()) {
            let probe = ring(&rings, inner_id).first();
            let mut best: Option<(usize, i128)> = None;
            for (index, &outer_id) in outer_ids.iter().enumerate() {
                let locations = ring(&rings, outer_id).locations();
                if point_in_ring(probe.location, &locations) {
                    let area = ring_area_twice(&locations).abs();
                    if best.map_or(true, |(_, smallest)| area < smallest) {
                        best = Some((index, area));
                    }
                }
            }
            match best {
                Some((index, _)) => nested[index].push(inner_id),
                None => {
                    debug!(
                        "relation {}: no outer ring contains inner ring at {}",
                        relation.id, probe.location
                    );
                    if self.remember_problems {
                        self.problems.push(Problem::new(
                            ProblemKind::NoOuterRingForInner,
                            probe.node_ref(),
                        ));
                    }
                    out.push(builder.finish());
                    return;
                }
            }
        }

        for (index, &outer_id) in outer_ids.iter().enumerate() {
            let outer_index = builder.add_outer_ring(ring(&rings, outer_id).node_refs());
            for &inner_id in &nested[index] {
                builder.add_inner_ring(outer_index, ring(&rings, inner_id).node_refs());
            }
        }
        out.push(builder.finish());
    }

    // Planar sweep over the sorted segments; reports every proper
    // intersection, which makes the multipolygon invalid.
    fn find_intersections(&mut self, segments: &[Segment]) -> bool {
        let mut found = false;
        for (index, s1) in segments.iter().enumerate() {
            for s2 in &segments[index + 1..] {
                if s1 == s2 {
                    trace!("found overlap on segment {s1}");
                    continue;
                }
                if s2.first_location().x > s1.second_location().x {
                    break;
                }
                if !y_range_overlap(
                    s1.first_location(),
                    s1.second_location(),
                    s2.first_location(),
                    s2.second_location(),
                ) {
                    continue;
                }
                if let Some(intersection) = segment_intersection(
                    s1.first_location(),
                    s1.second_location(),
                    s2.first_location(),
                    s2.second_location(),
                ) {
                    found = true;
                    debug!("segments {s1} and {s2} intersecting at {intersection}");
                    if self.remember_problems {
                        self.problems.push(Problem::new(
                            ProblemKind::Intersection,
                            NodeRef::with_location(0, intersection),
                        ));
                    }
                }
            }
        }
        found
    }

    fn check_for_open_rings(&mut self, rings: &[Option<ProtoRing>]) -> bool {
        let mut open = false;
        for ring in rings.iter().flatten() {
            if !ring.closed() {
                open = true;
                if self.remember_problems {
                    self.problems.push(Problem::new(
                        ProblemKind::RingNotClosed,
                        ring.first().node_ref(),
                    ));
                    self.problems.push(Problem::new(
                        ProblemKind::RingNotClosed,
                        ring.last().node_ref(),
                    ));
                }
            }
        }
        open
    }
}

// Extract normalised segments from the member ways, dropping degenerate
// ones. A node ref without a resolved location breaks the chain; the
// "locations on ways" precondition means this only happens on damaged
// input, which then surfaces as unclosed rings.
fn extract_segments(ways: &[&Way]) -> Vec<Segment> {
    let mut segments = Vec::new();
    for way in ways {
        let mut last: Option<Vertex> = None;
        for node in &way.nodes {
            let Some(vertex) = Vertex::from_node_ref(node) else {
                warn!("way {} node {} has no location", way.id, node.id);
                last = None;
                continue;
            };
            if let Some(previous) = last {
                if let Some(segment) = Segment::new(previous, vertex) {
                    segments.push(segment);
                }
            }
            last = Some(vertex);
        }
    }
    segments
}

// Remove pairs of identical segments from the sorted list: shared
// borders between polygons must vanish. Of any k identical segments,
// 2 * floor(k / 2) are removed.
fn cancel_duplicate_segments(segments: &mut Vec<Segment>) {
    let mut index = 0;
    while index + 1 < segments.len() {
        if segments[index] == segments[index + 1] {
            trace!("erase duplicate segment {}", segments[index]);
            segments.drain(index..=index + 1);
        } else {
            index += 1;
        }
    }
}

// Place every segment into a proto-ring: attach to an open ring where an
// endpoint matches, combining rings that meet, or found a new ring with
// the winding orientation inherited from the nearest segment to the
// left. Returns the ring table and the founding order of live rings.
fn grow_rings(segments: &mut [Segment]) -> (Vec<Option<ProtoRing>>, Vec<RingId>) {
    let mut rings: Vec<Option<ProtoRing>> = Vec::new();

    for index in 0..segments.len() {
        let (seg_first, seg_second) = (segments[index].first(), segments[index].second());
        trace!("check segment {}", segments[index]);

        let mut attachment: Option<(usize, GrownEnd)> = None;
        for (ring_id, slot) in rings.iter_mut().enumerate() {
            let Some(ring) = slot else { continue };
            if ring.closed() {
                continue;
            }
            if ring.last().location == seg_first.location {
                ring.add_end(seg_second);
                attachment = Some((ring_id, GrownEnd::Back));
                break;
            }
            if ring.last().location == seg_second.location {
                ring.add_end(seg_first);
                attachment = Some((ring_id, GrownEnd::Back));
                break;
            }
            if ring.first().location == seg_first.location {
                ring.add_start(seg_second);
                attachment = Some((ring_id, GrownEnd::Front));
                break;
            }
            if ring.first().location == seg_second.location {
                ring.add_start(seg_first);
                attachment = Some((ring_id, GrownEnd::Front));
                break;
            }
        }

        if let Some((ring_id, grown_end)) = attachment {
            segments[index].set_ring(RingId(ring_id));
            combine_rings(&mut rings, segments, RingId(ring_id), grown_end);
            continue;
        }

        // No open ring matched: found a new ring. Scan the processed
        // segments in reverse for the nearest one to the left that is
        // vertically in range; the new ring winds opposite to it. The
        // leftmost ring in the plane defaults to clockwise, i.e. outer.
        let location = seg_first.location;
        let mut cw = true;
        for other in segments[..index].iter().rev() {
            let (min_y, max_y) = (
                other.first_location().y.min(other.second_location().y),
                other.first_location().y.max(other.second_location().y),
            );
            if min_y <= location.y && max_y >= location.y {
                if other.first_location().x <= location.x
                    && other.second_location().x <= location.x
                {
                    cw = !segment_orientation(&rings, other);
                    break;
                }
                if is_below(location, other.first_location(), other.second_location()) {
                    cw = !segment_orientation(&rings, other);
                    break;
                }
            }
        }
        trace!(
            "new {} ring for segment {}",
            if cw { "cw" } else { "ccw" },
            segments[index]
        );

        let ring_id = RingId(rings.len());
        rings.push(Some(ProtoRing::from_segment(&segments[index], cw)));
        segments[index].set_ring(ring_id);
    }

    let order: Vec<RingId> = rings
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_some())
        .map(|(id, _)| RingId(id))
        .collect();
    (rings, order)
}

// After growing one end of `target`, look for another open ring whose
// endpoint now coincides with the grown end and concatenate it; the
// absorbed ring's segments are relinked to the survivor.
fn combine_rings(
    rings: &mut [Option<ProtoRing>],
    segments: &mut [Segment],
    target: RingId,
    grown_end: GrownEnd,
) {
    let meet = {
        let ring = ring(rings, target);
        if ring.closed() {
            return;
        }
        match grown_end {
            GrownEnd::Back => ring.last().location,
            GrownEnd::Front => ring.first().location,
        }
    };

    let mut found = None;
    for (other_id, slot) in rings.iter().enumerate() {
        if other_id == target.0 {
            continue;
        }
        let Some(other) = slot else { continue };
        if other.closed() {
            continue;
        }
        let matched = match grown_end {
            GrownEnd::Back => {
                if other.first().location == meet {
                    Some(false)
                } else if other.last().location == meet {
                    Some(true)
                } else {
                    None
                }
            }
            GrownEnd::Front => {
                if other.last().location == meet {
                    Some(false)
                } else if other.first().location == meet {
                    Some(true)
                } else {
                    None
                }
            }
        };
        if let Some(reversed) = matched {
            found = Some((other_id, reversed));
            break;
        }
    }

    let Some((other_id, reversed)) = found else {
        return;
    };
    let other = rings[other_id].take().unwrap_or_else(|| {
        panic!("ring {other_id} vanished while combining");
    });
    trace!("combining ring {} into ring {}", other_id, target.0);
    let survivor = match &mut rings[target.0] {
        Some(ring) => ring,
        None => panic!("target ring {} vanished while combining", target.0),
    };
    match grown_end {
        GrownEnd::Back => survivor.append_ring(other, reversed),
        GrownEnd::Front => survivor.prepend_ring(other, reversed),
    }
    for segment in segments.iter_mut() {
        segment.relink_ring(RingId(other_id), target);
    }
}

fn ring<'a>(rings: &'a [Option<ProtoRing>], id: RingId) -> &'a ProtoRing {
    match &rings[id.0] {
        Some(ring) => ring,
        None => panic!("ring {} vanished from the ring table", id.0),
    }
}

// A processed segment's orientation is the orientation of the ring it
// was placed into.
fn segment_orientation(rings: &[Option<ProtoRing>], segment: &Segment) -> bool {
    segment
        .ring()
        .map_or(true, |id| ring(rings, id).is_outer())
}
