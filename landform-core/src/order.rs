//! Input ordering enforcement for the second pass.

use thiserror::Error;

use crate::entity::ItemKind;

/// Fatal violations of the node → way → relation, ascending-id contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// An entity kind appeared after a later kind had already been seen.
    #[error("{kind:?} with id {id} arrived after the input had advanced to {seen:?}s")]
    KindRegression {
        kind: ItemKind,
        id: i64,
        seen: ItemKind,
    },
    /// Ids within one kind were not strictly ascending.
    #[error("{kind:?} ids must be strictly ascending: id {id} arrived after {previous}")]
    IdNotAscending {
        kind: ItemKind,
        id: i64,
        previous: i64,
    },
}

/// Tracks the ordering contract across one pass of the input stream.
///
/// # Examples
/// ```
/// use landform_core::{ItemKind, OrderChecker};
///
/// let mut checker = OrderChecker::new();
/// assert!(checker.check(ItemKind::Node, 1).is_ok());
/// assert!(checker.check(ItemKind::Way, 1).is_ok());
/// assert!(checker.check(ItemKind::Node, 2).is_err());
/// ```
#[derive(Debug, Default)]
pub struct OrderChecker {
    seen: Option<(ItemKind, i64)>,
}

impl OrderChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the next entity against everything seen so far.
    pub fn check(&mut self, kind: ItemKind, id: i64) -> Result<(), OrderError> {
        if let Some((seen_kind, seen_id)) = self.seen {
            if kind < seen_kind {
                return Err(OrderError::KindRegression {
                    kind,
                    id,
                    seen: seen_kind,
                });
            }
            if kind == seen_kind && id <= seen_id {
                return Err(OrderError::IdNotAscending {
                    kind,
                    id,
                    previous: seen_id,
                });
            }
        }
        self.seen = Some((kind, id));
        Ok(())
    }
}
