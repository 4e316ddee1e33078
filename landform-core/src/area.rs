//! Derived area entities.
//!
//! Areas are not part of the OSM data model; they are produced by the
//! assembler from multipolygon relations. An area carries the tags and
//! metadata of its source relation plus zero or more outer rings, each
//! with its nested inner rings. An area without rings is, by definition,
//! invalid: the assembler commits one whenever it finds geometry it
//! cannot turn into rings.

use std::mem;

use crate::entity::{NodeRef, Relation};
use crate::meta::Meta;
use crate::tags::TagList;

/// An inner ring (a hole) nested in an outer ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerRing {
    pub nodes: Vec<NodeRef>,
}

/// An outer ring together with the inner rings it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuterRing {
    pub nodes: Vec<NodeRef>,
    pub inners: Vec<InnerRing>,
}

/// An area assembled from a multipolygon relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub id: i64,
    pub tags: TagList,
    pub meta: Meta,
    pub outers: Vec<OuterRing>,
}

impl Area {
    /// The id an area derived from the given relation id carries.
    ///
    /// Doubling keeps relation-derived ids disjoint from way-derived
    /// area ids used elsewhere in the ecosystem; the `+ 1` marks the
    /// relation origin.
    pub fn id_from_relation(relation_id: i64) -> i64 {
        relation_id * 2 + 1
    }

    /// An area is valid when it has at least one outer ring.
    pub fn is_valid(&self) -> bool {
        !self.outers.is_empty()
    }

    /// Approximate memory footprint in bytes, for buffer accounting.
    pub fn stored_size(&self) -> usize {
        mem::size_of::<Self>()
            + self.tags.stored_size()
            + self.meta.stored_size()
            + self
                .outers
                .iter()
                .map(|outer| {
                    outer.nodes.capacity() * mem::size_of::<NodeRef>()
                        + outer
                            .inners
                            .iter()
                            .map(|inner| inner.nodes.capacity() * mem::size_of::<NodeRef>())
                            .sum::<usize>()
                })
                .sum::<usize>()
    }
}

/// Incremental construction of an [`Area`] from a source relation.
///
/// # Examples
/// ```
/// use landform_core::{AreaBuilder, Relation};
///
/// let relation = Relation::new(4, vec![]);
/// let mut builder = AreaBuilder::from_relation(&relation);
/// let outer = builder.add_outer_ring(vec![]);
/// builder.add_inner_ring(outer, vec![]);
/// let area = builder.finish();
/// assert_eq!(area.id, 9);
/// ```
#[derive(Debug)]
pub struct AreaBuilder {
    area: Area,
}

impl AreaBuilder {
    /// Start an area for `relation`, copying its tags and metadata and
    /// deriving the area id.
    pub fn from_relation(relation: &Relation) -> Self {
        Self {
            area: Area {
                id: Area::id_from_relation(relation.id),
                tags: relation.tags.clone(),
                meta: relation.meta.clone(),
                outers: Vec::new(),
            },
        }
    }

    /// Append an outer ring and return its index for nesting inner rings.
    pub fn add_outer_ring(&mut self, nodes: Vec<NodeRef>) -> usize {
        self.area.outers.push(OuterRing {
            nodes,
            inners: Vec::new(),
        });
        self.area.outers.len() - 1
    }

    /// Append an inner ring to the outer ring at `outer`.
    ///
    /// # Panics
    /// Panics if `outer` is not an index returned by
    /// [`AreaBuilder::add_outer_ring`].
    pub fn add_inner_ring(&mut self, outer: usize, nodes: Vec<NodeRef>) {
        self.area.outers[outer].inners.push(InnerRing { nodes });
    }

    /// The finished area; without any outer rings it is the invalid area.
    pub fn finish(self) -> Area {
        self.area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Relation;
    use crate::location::Location;
    use rstest::rstest;

    fn node_ref(id: i64, x: i32, y: i32) -> NodeRef {
        NodeRef::with_location(id, Location::new(x, y))
    }

    #[rstest]
    #[case(1, 3)]
    #[case(2, 5)]
    #[case(123_456, 246_913)]
    fn area_id_law(#[case] relation_id: i64, #[case] area_id: i64) {
        assert_eq!(Area::id_from_relation(relation_id), area_id);
    }

    #[rstest]
    fn builder_copies_tags_and_meta() {
        let mut relation = Relation::new(10, vec![]);
        relation.tags.insert("type", "multipolygon");
        relation.meta.version = 3;
        relation.meta.user = "mapper".to_owned();

        let area = AreaBuilder::from_relation(&relation).finish();
        assert_eq!(area.id, 21);
        assert!(area.tags.has("type", "multipolygon"));
        assert_eq!(area.meta.version, 3);
        assert_eq!(area.meta.user, "mapper");
        assert!(!area.is_valid());
    }

    #[rstest]
    fn inner_rings_nest_under_their_outer() {
        let relation = Relation::new(1, vec![]);
        let mut builder = AreaBuilder::from_relation(&relation);
        let first = builder.add_outer_ring(vec![node_ref(1, 0, 0)]);
        let second = builder.add_outer_ring(vec![node_ref(2, 100, 100)]);
        builder.add_inner_ring(second, vec![node_ref(3, 110, 110)]);

        let area = builder.finish();
        assert!(area.is_valid());
        assert!(area.outers[first].inners.is_empty());
        assert_eq!(area.outers[second].inners.len(), 1);
    }
}
