//! Reference-counted storage for entity copies.
//!
//! Everything the two-pass pipeline buffers lives in one [`ItemStash`]
//! per manager. Components never hold references into the stash; they
//! hold opaque [`ItemHandle`]s, which stay valid while the slot table
//! grows and while other slots are reclaimed.

use std::mem;

use crate::entity::Entity;

/// Opaque, stable handle to an entity in an [`ItemStash`].
///
/// A handle does not own the entity; ownership is expressed through the
/// slot's reference count. Cloning a handle without calling
/// [`ItemStash::retain`] does not extend the entity's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemHandle(u32);

#[derive(Debug)]
enum Slot {
    Occupied { item: Entity, refcount: u32 },
    Vacant,
}

/// Arena-like store for entity copies with per-entity reference counts.
///
/// Slots of removed entities are recycled for later insertions, so the
/// table does not grow beyond the high-water mark of live entities.
/// Running out of memory is not a recoverable condition here and will
/// abort the process, as any allocation failure does.
///
/// # Examples
/// ```
/// use landform_core::{Entity, ItemStash, Location, Node};
///
/// let mut stash = ItemStash::new();
/// let handle = stash.add(Entity::from(Node::new(1, Location::new(0, 0))));
/// assert_eq!(stash.get(handle).id(), 1);
/// stash.remove(handle);
/// assert_eq!(stash.count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct ItemStash {
    slots: Vec<Slot>,
    free: Vec<u32>,
    count: usize,
    item_bytes: usize,
}

impl ItemStash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entity and return a handle with a reference count of one.
    pub fn add(&mut self, item: Entity) -> ItemHandle {
        self.item_bytes += item.stored_size();
        self.count += 1;
        match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Slot::Occupied { item, refcount: 1 };
                ItemHandle(index)
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .unwrap_or_else(|_| panic!("item stash exceeded {} slots", u32::MAX));
                self.slots.push(Slot::Occupied { item, refcount: 1 });
                ItemHandle(index)
            }
        }
    }

    /// Increment the reference count of the entity behind `handle`.
    ///
    /// # Panics
    /// Panics if the handle is stale.
    pub fn retain(&mut self, handle: ItemHandle) {
        match &mut self.slots[handle.0 as usize] {
            Slot::Occupied { refcount, .. } => *refcount += 1,
            Slot::Vacant => panic!("stale stash handle {handle:?}"),
        }
    }

    /// Read-only view of the entity behind `handle`.
    ///
    /// # Panics
    /// Panics if the handle is stale.
    pub fn get(&self, handle: ItemHandle) -> &Entity {
        match &self.slots[handle.0 as usize] {
            Slot::Occupied { item, .. } => item,
            Slot::Vacant => panic!("stale stash handle {handle:?}"),
        }
    }

    /// Mutable view of the entity behind `handle`.
    ///
    /// # Panics
    /// Panics if the handle is stale.
    pub fn get_mut(&mut self, handle: ItemHandle) -> &mut Entity {
        match &mut self.slots[handle.0 as usize] {
            Slot::Occupied { item, .. } => item,
            Slot::Vacant => panic!("stale stash handle {handle:?}"),
        }
    }

    /// Drop one reference to the entity behind `handle`, reclaiming the
    /// slot when the count reaches zero.
    ///
    /// # Panics
    /// Panics if the handle is stale.
    pub fn remove(&mut self, handle: ItemHandle) {
        let slot = &mut self.slots[handle.0 as usize];
        match slot {
            Slot::Occupied { item, refcount } => {
                *refcount -= 1;
                if *refcount == 0 {
                    self.item_bytes -= item.stored_size();
                    self.count -= 1;
                    *slot = Slot::Vacant;
                    self.free.push(handle.0);
                }
            }
            Slot::Vacant => panic!("stale stash handle {handle:?}"),
        }
    }

    /// Number of live entities.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Approximate memory used by the stash in bytes.
    pub fn used_memory(&self) -> usize {
        self.slots.capacity() * mem::size_of::<Slot>()
            + self.free.capacity() * mem::size_of::<u32>()
            + self.item_bytes
    }
}
