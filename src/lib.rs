//! Facade crate for the landform OSM area assembly library.
//!
//! This crate re-exports the entity model and the two-pass relations
//! machinery from the member crates. Enable the `pbf` feature to read
//! first-pass relations straight from an OSM PBF file.

#![forbid(unsafe_code)]

pub use landform_core::{
    apply, Area, AreaBuilder, Buffer, CallbackBuffer, Entity, EntityReader, Handler, HandlerError,
    InnerRing, ItemHandle, ItemKind, ItemStash, Location, Member, Meta, Node, NodeRef, OrderChecker,
    OrderError, OuterRing, Relation, TagList, VecReader, Way,
};

pub use landform_relations::{
    print_used_memory, read_relations, read_relations_with_progress, CompletionContext,
    FirstPassHandler, Interest, ManagerPolicy, MembersDatabase, MemoryUsage, RelationHandle,
    RelationsCollector, RelationsDatabase, RelationsManager, SecondPassHandler,
};

pub use landform_area::{
    Assembler, MultipolygonManager, MultipolygonPolicy, Problem, ProblemKind, ProtoRing, Segment,
    Vertex,
};

#[cfg(feature = "pbf")]
pub use landform_relations::{read_relations_from_pbf, PbfReadError};
