//! Assembly of area geometries from multipolygon relations.
//!
//! Responsibilities:
//! - Turn the way members of a completed multipolygon relation into
//!   outer rings with nested inner rings, or into an invalid area with
//!   a record of what went wrong.
//! - Provide the multipolygon policy that plugs the assembler into a
//!   `landform-relations` manager.
//!
//! The assembly works on undirected, normalised segments and survives
//! adversarial topology: duplicated shared borders cancel, proper
//! self-intersections and unclosed rings mark the area invalid, and
//! inner rings are nested under their smallest containing outer ring.

pub mod assembler;
pub mod multipolygon;
pub mod problem;
pub mod ring;
pub mod segment;

pub use assembler::Assembler;
pub use multipolygon::{MultipolygonManager, MultipolygonPolicy};
pub use problem::{Problem, ProblemKind};
pub use ring::ProtoRing;
pub use segment::{Segment, Vertex};
