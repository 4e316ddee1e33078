//! Core domain types for the landform OSM area assembly library.
//!
//! Responsibilities:
//! - Define the OSM entity model (nodes, ways, relations, derived areas)
//!   on exact fixed-point coordinates.
//! - Own entity copies in a handle-based, reference-counted stash.
//! - Provide the output buffer, ordering checker and the handler/reader
//!   seams the two-pass pipeline is built on.
//!
//! Boundaries:
//! - No file format parsing; readers are adapted behind [`EntityReader`].
//! - No relation bookkeeping (lives in `landform-relations`) and no ring
//!   assembly (lives in `landform-area`).

pub mod area;
pub mod buffer;
pub mod entity;
pub mod geom;
pub mod handler;
pub mod location;
pub mod meta;
pub mod order;
pub mod reader;
pub mod stash;
pub mod tags;

pub use area::{Area, AreaBuilder, InnerRing, OuterRing};
pub use buffer::{Buffer, CallbackBuffer, DEFAULT_FLUSH_THRESHOLD};
pub use entity::{Entity, ItemKind, Member, Node, NodeRef, Relation, StashItem, Way};
pub use handler::{apply, Handler, HandlerError};
pub use location::Location;
pub use meta::Meta;
pub use order::{OrderChecker, OrderError};
pub use reader::{EntityReader, VecReader};
pub use stash::{ItemHandle, ItemStash};
pub use tags::TagList;
