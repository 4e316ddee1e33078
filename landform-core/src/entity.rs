//! The OSM entity model: nodes, ways, relations and their references.

use std::mem;

use crate::location::Location;
use crate::meta::Meta;
use crate::stash::ItemHandle;
use crate::tags::TagList;

/// The three OSM entity kinds, in their canonical stream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemKind {
    Node,
    Way,
    Relation,
}

/// A node: one coordinate plus tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: i64,
    pub location: Location,
    pub tags: TagList,
    pub meta: Meta,
}

impl Node {
    pub fn new(id: i64, location: Location) -> Self {
        Self {
            id,
            location,
            tags: TagList::new(),
            meta: Meta::default(),
        }
    }

    /// Approximate memory footprint in bytes, for memory telemetry.
    pub fn stored_size(&self) -> usize {
        mem::size_of::<Self>() + self.tags.stored_size() + self.meta.stored_size()
    }
}

/// A reference to a node from a way, optionally carrying the resolved
/// location. The assembler requires resolved locations on every ref.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef {
    pub id: i64,
    pub location: Option<Location>,
}

impl NodeRef {
    pub fn new(id: i64) -> Self {
        Self { id, location: None }
    }

    pub fn with_location(id: i64, location: Location) -> Self {
        Self {
            id,
            location: Some(location),
        }
    }
}

/// A way: an ordered list of node references plus tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Way {
    pub id: i64,
    pub nodes: Vec<NodeRef>,
    pub tags: TagList,
    pub meta: Meta,
}

impl Way {
    pub fn new(id: i64, nodes: Vec<NodeRef>) -> Self {
        Self {
            id,
            nodes,
            tags: TagList::new(),
            meta: Meta::default(),
        }
    }

    /// Approximate memory footprint in bytes, for memory telemetry.
    pub fn stored_size(&self) -> usize {
        mem::size_of::<Self>()
            + self.nodes.capacity() * mem::size_of::<NodeRef>()
            + self.tags.stored_size()
            + self.meta.stored_size()
    }
}

/// One typed member reference inside a relation.
///
/// `id == 0` is reserved: the first pass overwrites the ids of members it
/// is not interested in, so later stages can skip them. When a member is
/// satisfied in the second pass, `handle` is patched to point at the
/// stashed copy of the member entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub kind: ItemKind,
    pub id: i64,
    pub role: String,
    pub handle: Option<ItemHandle>,
}

impl Member {
    pub fn new(kind: ItemKind, id: i64, role: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            role: role.into(),
            handle: None,
        }
    }
}

/// A relation: an ordered list of typed member references plus tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub id: i64,
    pub members: Vec<Member>,
    pub tags: TagList,
    pub meta: Meta,
}

impl Relation {
    pub fn new(id: i64, members: Vec<Member>) -> Self {
        Self {
            id,
            members,
            tags: TagList::new(),
            meta: Meta::default(),
        }
    }

    /// Approximate memory footprint in bytes, for memory telemetry.
    pub fn stored_size(&self) -> usize {
        mem::size_of::<Self>()
            + self.members.capacity() * mem::size_of::<Member>()
            + self
                .members
                .iter()
                .map(|member| member.role.capacity())
                .sum::<usize>()
            + self.tags.stored_size()
            + self.meta.stored_size()
    }
}

/// Any OSM entity; the unit stored in the item stash and delivered by
/// readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

impl Entity {
    pub fn kind(&self) -> ItemKind {
        match self {
            Entity::Node(_) => ItemKind::Node,
            Entity::Way(_) => ItemKind::Way,
            Entity::Relation(_) => ItemKind::Relation,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Entity::Node(node) => node.id,
            Entity::Way(way) => way.id,
            Entity::Relation(relation) => relation.id,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Entity::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_way(&self) -> Option<&Way> {
        match self {
            Entity::Way(way) => Some(way),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&Relation> {
        match self {
            Entity::Relation(relation) => Some(relation),
            _ => None,
        }
    }

    pub fn as_relation_mut(&mut self) -> Option<&mut Relation> {
        match self {
            Entity::Relation(relation) => Some(relation),
            _ => None,
        }
    }

    /// Approximate memory footprint in bytes, for memory telemetry.
    pub fn stored_size(&self) -> usize {
        match self {
            Entity::Node(node) => node.stored_size(),
            Entity::Way(way) => way.stored_size(),
            Entity::Relation(relation) => relation.stored_size(),
        }
    }
}

impl From<Node> for Entity {
    fn from(node: Node) -> Self {
        Entity::Node(node)
    }
}

impl From<Way> for Entity {
    fn from(way: Way) -> Self {
        Entity::Way(way)
    }
}

impl From<Relation> for Entity {
    fn from(relation: Relation) -> Self {
        Entity::Relation(relation)
    }
}

/// Typed access to entities stored in the stash.
///
/// Implemented by the three concrete entity types so that generic code,
/// notably the per-kind members databases, cannot mix kinds up: a
/// database parameterised over [`Way`] can only ever yield ways.
pub trait StashItem: Clone {
    const KIND: ItemKind;

    fn id(&self) -> i64;

    fn into_entity(self) -> Entity;

    fn from_entity(entity: &Entity) -> Option<&Self>;
}

impl StashItem for Node {
    const KIND: ItemKind = ItemKind::Node;

    fn id(&self) -> i64 {
        self.id
    }

    fn into_entity(self) -> Entity {
        Entity::Node(self)
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        entity.as_node()
    }
}

impl StashItem for Way {
    const KIND: ItemKind = ItemKind::Way;

    fn id(&self) -> i64 {
        self.id
    }

    fn into_entity(self) -> Entity {
        Entity::Way(self)
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        entity.as_way()
    }
}

impl StashItem for Relation {
    const KIND: ItemKind = ItemKind::Relation;

    fn id(&self) -> i64 {
        self.id
    }

    fn into_entity(self) -> Entity {
        Entity::Relation(self)
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        entity.as_relation()
    }
}
