//! Two-pass assembly of OSM relations.
//!
//! Responsibilities:
//! - Decide in a first pass which relations to keep and which of their
//!   members to wait for.
//! - Stream through the input a second time, stashing members as they
//!   arrive and dispatching a completion callback when the last missing
//!   member of a relation shows up.
//!
//! Boundaries:
//! - No geometry: what happens on completion is the policy's business
//!   (`landform-area` provides the multipolygon policy).
//! - No file formats; input arrives through `landform-core` readers and
//!   handlers. The optional `pbf` feature adapts OSM PBF files for the
//!   first pass.

pub mod database;
pub mod manager;
pub mod members;
#[cfg(feature = "pbf")]
pub mod pbf;
pub mod util;

pub use database::{RelationHandle, RelationsDatabase};
pub use manager::{
    CompletionContext, FirstPassHandler, Interest, ManagerPolicy, RelationsManager,
    SecondPassHandler,
};
pub use members::MembersDatabase;
#[cfg(feature = "pbf")]
pub use pbf::{read_relations_from_pbf, PbfReadError};
pub use util::{
    print_used_memory, read_relations, read_relations_with_progress, MemoryUsage,
    RelationsCollector,
};
