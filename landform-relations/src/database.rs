//! The database of kept relations.

use std::mem;

use landform_core::{Entity, ItemHandle, ItemStash, Relation};

/// Opaque handle to an entry in a [`RelationsDatabase`].
///
/// Unlike a raw stash handle, a relation handle identifies the
/// bookkeeping entry that carries the relation's outstanding-member
/// counter. All mutation goes through the database, which receives the
/// stash explicitly; handles hold no back references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationHandle(u32);

#[derive(Debug)]
struct Entry {
    handle: ItemHandle,
    outstanding: u32,
}

/// Indexed collection of the relations kept by the first pass.
///
/// Each entry owns a stashed copy of its relation and counts the
/// interesting members the second pass has not delivered yet. When the
/// counter reaches zero the relation is complete and must be dispatched
/// exactly once.
#[derive(Debug, Default)]
pub struct RelationsDatabase {
    entries: Vec<Option<Entry>>,
    free: Vec<u32>,
    count: usize,
}

impl RelationsDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `relation` into the stash and register it with an
    /// outstanding count of zero; the manager increments the count as it
    /// tracks members.
    pub fn add(&mut self, stash: &mut ItemStash, relation: Relation) -> RelationHandle {
        let entry = Entry {
            handle: stash.add(Entity::from(relation)),
            outstanding: 0,
        };
        match self.free.pop() {
            Some(index) => {
                self.entries[index as usize] = Some(entry);
                self.count += 1;
                RelationHandle(index)
            }
            None => {
                let index = u32::try_from(self.entries.len())
                    .unwrap_or_else(|_| panic!("relations database exceeded {} entries", u32::MAX));
                self.entries.push(Some(entry));
                self.count += 1;
                RelationHandle(index)
            }
        }
    }

    fn entry(&self, handle: RelationHandle) -> &Entry {
        match &self.entries[handle.0 as usize] {
            Some(entry) => entry,
            None => panic!("stale relation handle {handle:?}"),
        }
    }

    fn entry_mut(&mut self, handle: RelationHandle) -> &mut Entry {
        match &mut self.entries[handle.0 as usize] {
            Some(entry) => entry,
            None => panic!("stale relation handle {handle:?}"),
        }
    }

    /// Read-only view of the stashed relation behind `handle`.
    pub fn relation<'a>(&self, stash: &'a ItemStash, handle: RelationHandle) -> &'a Relation {
        match stash.get(self.entry(handle).handle) {
            Entity::Relation(relation) => relation,
            other => panic!("relation handle {handle:?} points at a {:?}", other.kind()),
        }
    }

    /// Mutable view of the stashed relation behind `handle`, for member
    /// patching.
    pub fn relation_mut<'a>(
        &self,
        stash: &'a mut ItemStash,
        handle: RelationHandle,
    ) -> &'a mut Relation {
        match stash.get_mut(self.entry(handle).handle) {
            Entity::Relation(relation) => relation,
            other => panic!("relation handle {handle:?} points at a {:?}", other.kind()),
        }
    }

    /// Count one more interesting member the relation is waiting for.
    pub fn increment_outstanding(&mut self, handle: RelationHandle) {
        self.entry_mut(handle).outstanding += 1;
    }

    /// Record the arrival of one interesting member; returns `true`
    /// exactly when the relation became complete.
    pub fn decrement_outstanding(&mut self, handle: RelationHandle) -> bool {
        let entry = self.entry_mut(handle);
        assert!(
            entry.outstanding > 0,
            "decrement on relation {handle:?} with no outstanding members"
        );
        entry.outstanding -= 1;
        entry.outstanding == 0
    }

    /// Number of members the relation is still waiting for.
    pub fn outstanding(&self, handle: RelationHandle) -> u32 {
        self.entry(handle).outstanding
    }

    /// Drop the entry and release its stash slots: one reference for
    /// every resolved member plus the relation itself.
    pub fn remove(&mut self, stash: &mut ItemStash, handle: RelationHandle) {
        let entry = match self.entries[handle.0 as usize].take() {
            Some(entry) => entry,
            None => panic!("stale relation handle {handle:?}"),
        };
        self.count -= 1;
        self.free.push(handle.0);

        let member_handles: Vec<ItemHandle> = match stash.get(entry.handle) {
            Entity::Relation(relation) => {
                relation.members.iter().filter_map(|m| m.handle).collect()
            }
            other => panic!("relation handle {handle:?} points at a {:?}", other.kind()),
        };
        for member_handle in member_handles {
            stash.remove(member_handle);
        }
        stash.remove(entry.handle);
    }

    /// Number of registered relations.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Handles of all registered relations, for debugging and telemetry.
    pub fn handles(&self) -> impl Iterator<Item = RelationHandle> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_some())
            .map(|(index, _)| RelationHandle(index as u32))
    }

    /// Approximate memory used by the database in bytes, excluding the
    /// stashed relations themselves.
    pub fn used_memory(&self) -> usize {
        self.entries.capacity() * mem::size_of::<Option<Entry>>()
            + self.free.capacity() * mem::size_of::<u32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landform_core::{ItemKind, Member};
    use rstest::rstest;

    fn relation_with_member(id: i64) -> Relation {
        Relation::new(id, vec![Member::new(ItemKind::Way, 10, "outer")])
    }

    #[rstest]
    fn outstanding_counts_down_to_completion() {
        let mut stash = ItemStash::new();
        let mut db = RelationsDatabase::new();
        let handle = db.add(&mut stash, relation_with_member(1));

        db.increment_outstanding(handle);
        db.increment_outstanding(handle);
        assert_eq!(db.outstanding(handle), 2);
        assert!(!db.decrement_outstanding(handle));
        assert!(db.decrement_outstanding(handle));
    }

    #[rstest]
    fn remove_releases_relation_and_resolved_members() {
        let mut stash = ItemStash::new();
        let mut db = RelationsDatabase::new();
        let handle = db.add(&mut stash, relation_with_member(1));

        let way = stash.add(Entity::from(landform_core::Way::new(10, vec![])));
        db.relation_mut(&mut stash, handle).members[0].handle = Some(way);

        assert_eq!(stash.count(), 2);
        db.remove(&mut stash, handle);
        assert!(stash.is_empty());
        assert!(db.is_empty());
    }

    #[rstest]
    fn handles_stay_valid_across_removals() {
        let mut stash = ItemStash::new();
        let mut db = RelationsDatabase::new();
        let first = db.add(&mut stash, relation_with_member(1));
        let second = db.add(&mut stash, relation_with_member(2));
        db.remove(&mut stash, first);
        assert_eq!(db.relation(&stash, second).id, 2);
        assert_eq!(db.handles().count(), 1);
    }
}
