//! Pending-member tables driving relation completion.
//!
//! One database exists per member kind. The first pass `track`s every
//! interesting member; between the passes `prepare_for_lookup` sorts the
//! records by member id, and the second pass merge-joins the sorted
//! records against the id-sorted entity stream. Total work after the
//! sort is linear in records plus entities.

use std::marker::PhantomData;
use std::mem;

use landform_core::{ItemStash, StashItem};

use crate::database::{RelationHandle, RelationsDatabase};

#[derive(Debug, Clone, Copy)]
struct MemberRecord {
    member_id: i64,
    relation: RelationHandle,
    position: usize,
    dead: bool,
}

/// Pending members of one kind, mapping member id to the relations (and
/// member positions) waiting for it.
///
/// The type parameter pins the entity kind: a `MembersDatabase<Way>` can
/// only be satisfied with ways. The same `(member, relation, position)`
/// triple may be tracked more than once when a relation lists a member
/// repeatedly; every record is satisfied independently.
#[derive(Debug)]
pub struct MembersDatabase<T: StashItem> {
    records: Vec<MemberRecord>,
    sorted: bool,
    cursor: usize,
    pending: usize,
    _kind: PhantomData<fn() -> T>,
}

impl<T: StashItem> Default for MembersDatabase<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            sorted: false,
            cursor: 0,
            pending: 0,
            _kind: PhantomData,
        }
    }
}

impl<T: StashItem> MembersDatabase<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build phase: remember that `relation` waits for `member_id` at
    /// member slot `position`, and count it as outstanding.
    pub fn track(
        &mut self,
        relations: &mut RelationsDatabase,
        relation: RelationHandle,
        member_id: i64,
        position: usize,
    ) {
        debug_assert!(!self.sorted, "track must not run after prepare_for_lookup");
        self.records.push(MemberRecord {
            member_id,
            relation,
            position,
            dead: false,
        });
        self.pending += 1;
        relations.increment_outstanding(relation);
    }

    /// Switch from the build phase to the query phase by sorting the
    /// records; insertion order among equal ids is preserved.
    pub fn prepare_for_lookup(&mut self) {
        self.records.sort_by_key(|record| record.member_id);
        self.sorted = true;
        self.cursor = 0;
    }

    /// Query phase: offer an entity from the second-pass stream.
    ///
    /// When records are waiting for the entity's id, the entity is
    /// copied into the stash once and every waiting record is satisfied:
    /// the relation's member slot is patched with the stash handle and
    /// its outstanding count drops. `on_complete` fires for each
    /// relation whose count reaches zero, in record order.
    ///
    /// Returns whether at least one record was satisfied.
    pub fn add(
        &mut self,
        item: &T,
        stash: &mut ItemStash,
        relations: &mut RelationsDatabase,
        mut on_complete: impl FnMut(RelationHandle),
    ) -> bool {
        debug_assert!(self.sorted, "prepare_for_lookup must run before lookups");
        let id = item.id();
        while self.cursor < self.records.len() && self.records[self.cursor].member_id < id {
            self.cursor += 1;
        }
        let start = self.cursor;
        let mut end = start;
        while end < self.records.len() && self.records[end].member_id == id {
            end += 1;
        }
        self.cursor = end;

        let mut stashed = None;
        for index in start..end {
            if self.records[index].dead {
                continue;
            }
            let handle = match stashed {
                Some(handle) => {
                    stash.retain(handle);
                    handle
                }
                None => {
                    let handle = stash.add(item.clone().into_entity());
                    stashed = Some(handle);
                    handle
                }
            };
            let record = self.records[index];
            self.records[index].dead = true;
            self.pending -= 1;

            let relation = relations.relation_mut(stash, record.relation);
            relation.members[record.position].handle = Some(handle);
            if relations.decrement_outstanding(record.relation) {
                on_complete(record.relation);
            }
        }
        stashed.is_some()
    }

    /// Delete any surviving record matching both ids. Used after a
    /// relation completes to clear records its completion made moot.
    pub fn remove(
        &mut self,
        stash: &ItemStash,
        relations: &RelationsDatabase,
        member_id: i64,
        relation_id: i64,
    ) {
        debug_assert!(self.sorted, "remove only runs during the query phase");
        let start = self
            .records
            .partition_point(|record| record.member_id < member_id);
        for record in self.records[start..]
            .iter_mut()
            .take_while(|record| record.member_id == member_id)
        {
            if !record.dead && relations.relation(stash, record.relation).id == relation_id {
                record.dead = true;
                self.pending -= 1;
            }
        }
    }

    /// Records not yet satisfied or purged.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Approximate memory used by the records in bytes.
    pub fn used_memory(&self) -> usize {
        self.records.capacity() * mem::size_of::<MemberRecord>()
    }
}
