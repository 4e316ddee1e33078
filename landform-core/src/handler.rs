//! The handler seam the pipeline passes entities through.

use thiserror::Error;

use crate::entity::{Entity, Node, Relation, Way};
use crate::order::OrderError;

/// Errors surfaced by handlers; ordering violations are the one fatal
/// condition the core itself raises.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error(transparent)]
    OutOfOrder(#[from] OrderError),
}

/// Receives a stream of entities, one callback per kind.
///
/// All methods default to doing nothing, so implementations only write
/// the callbacks they care about; the first-pass handler of a relations
/// manager, for instance, only implements `relation`.
pub trait Handler {
    fn node(&mut self, _node: &Node) -> Result<(), HandlerError> {
        Ok(())
    }

    fn way(&mut self, _way: &Way) -> Result<(), HandlerError> {
        Ok(())
    }

    fn relation(&mut self, _relation: &Relation) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Called when the driver wants buffered output pushed downstream.
    fn flush(&mut self) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Feed a slice of entities through a handler in order.
pub fn apply<H: Handler + ?Sized>(entities: &[Entity], handler: &mut H) -> Result<(), HandlerError> {
    for entity in entities {
        match entity {
            Entity::Node(node) => handler.node(node)?,
            Entity::Way(way) => handler.way(way)?,
            Entity::Relation(relation) => handler.relation(relation)?,
        }
    }
    Ok(())
}
