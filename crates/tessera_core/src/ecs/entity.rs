//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - A slot index into component stores
//! - A generation counter for detecting stale handles
//!
//! The world keeps one [`EntityRecord`] per slot. Live records are threaded
//! into an intrusive doubly-linked list so removal is O(1) and iteration
//! follows insertion order even when slots are recycled.

use std::fmt;

use super::mask::Mask;
use crate::memory::IndexPool;

/// Handle to an entity in a [`World`](super::World).
///
/// Handles are `Copy` and never own anything. Once the entity is removed the
/// slot's generation moves on, so every copy of the old handle is rejected
/// with [`EcsError::StaleEntity`](crate::EcsError::StaleEntity) even after
/// the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    index: usize,
    generation: u32,
}

impl Entity {
    /// Null/invalid entity handle.
    pub const NULL: Self = Self {
        index: usize::MAX,
        generation: u32::MAX,
    };

    /// Creates a handle from slot index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index of this handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Returns the generation of this handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Checks if this handle is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == usize::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index, self.generation)
        }
    }
}

/// Per-slot bookkeeping kept by the world.
#[derive(Debug, Clone)]
pub(crate) struct EntityRecord {
    /// Generation of the current (or next) occupant.
    pub generation: u32,
    /// Whether this slot is currently alive.
    pub alive: bool,
    /// Components attached to the occupant.
    pub mask: Mask,
    /// Previous live slot in insertion order.
    prev: Option<usize>,
    /// Next live slot in insertion order.
    next: Option<usize>,
}

/// Slot arena plus the ordered live-entity list.
#[derive(Debug)]
pub(crate) struct EntityList {
    records: Vec<EntityRecord>,
    indexes: IndexPool,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    /// Width of every entity mask.
    component_count: usize,
}

impl EntityList {
    pub fn new(component_count: usize, capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            indexes: IndexPool::with_capacity(capacity),
            head: None,
            tail: None,
            len: 0,
            component_count,
        }
    }

    /// Allocates a slot and appends it to the live list with an empty mask.
    pub fn spawn(&mut self) -> Entity {
        let index = self.indexes.acquire();
        if index == self.records.len() {
            self.records.push(EntityRecord {
                generation: 0,
                alive: false,
                mask: Mask::new(self.component_count),
                prev: None,
                next: None,
            });
        }

        let prev = self.tail;
        let record = &mut self.records[index];
        debug_assert!(!record.alive, "slot {index} handed out while alive");
        debug_assert!(record.mask.is_empty(), "slot {index} reused with residual mask");
        record.alive = true;
        record.prev = prev;
        record.next = None;
        let entity = Entity::new(index, record.generation);

        match prev {
            Some(tail) => self.records[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        entity
    }

    /// Unlinks a live slot, invalidates its handles and frees the slot.
    ///
    /// The caller detaches components before calling this; the mask is
    /// cleared here.
    pub fn despawn(&mut self, index: usize) {
        let (prev, next) = {
            let record = &mut self.records[index];
            debug_assert!(record.alive, "despawning dead slot {index}");
            record.alive = false;
            record.generation = record.generation.wrapping_add(1);
            record.mask.clear_all();
            (record.prev.take(), record.next.take())
        };

        match prev {
            Some(prev) => self.records[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.records[next].prev = prev,
            None => self.tail = prev,
        }

        self.len -= 1;
        self.indexes.release(index);
    }

    /// Returns the record for a live handle.
    #[inline]
    pub fn live(&self, entity: Entity) -> Option<&EntityRecord> {
        self.records
            .get(entity.index)
            .filter(|record| record.alive && record.generation == entity.generation)
    }

    /// Returns the record for a live handle mutably.
    #[inline]
    pub fn live_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        self.records
            .get_mut(entity.index)
            .filter(|record| record.alive && record.generation == entity.generation)
    }

    /// Returns the record of a slot known to be live.
    #[inline]
    pub fn record(&self, index: usize) -> &EntityRecord {
        &self.records[index]
    }

    /// Returns the current handle of a slot.
    #[inline]
    pub fn handle(&self, index: usize) -> Entity {
        Entity::new(index, self.records[index].generation)
    }

    /// First live slot in insertion order.
    #[inline]
    pub fn first(&self) -> Option<usize> {
        self.head
    }

    /// Live slot after `index` in insertion order.
    #[inline]
    pub fn next_of(&self, index: usize) -> Option<usize> {
        self.records[index].next
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Iterates over live slots in insertion order.
    ///
    /// The successor is read before a slot is yielded.
    pub fn iter(&self) -> LiveSlots<'_> {
        LiveSlots {
            list: self,
            cursor: self.head,
        }
    }
}

/// Iterator over live slot indices in insertion order.
pub(crate) struct LiveSlots<'a> {
    list: &'a EntityList,
    cursor: Option<usize>,
}

impl Iterator for LiveSlots<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        self.cursor = self.list.next_of(index);
        Some(index)
    }
}
