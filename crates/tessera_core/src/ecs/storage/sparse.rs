//! Sparse-indirected storage: a compact array reached through a slot map.

use std::collections::HashMap;

use super::dense::DenseStore;
use super::Store;
use crate::memory::IndexPool;

/// Compacted storage for components held by few entities.
///
/// Values live in a private [`DenseStore`] over compact slots. A map
/// translates entity slots to compact slots, and a private [`IndexPool`]
/// recycles compact slots on detach, so memory tracks the number of holders
/// rather than the entity capacity.
///
/// Every access costs one extra hop through the map.
#[derive(Debug, Clone)]
pub struct SparseStore<T> {
    /// Compact values.
    values: DenseStore<T>,
    /// Entity slot -> compact slot.
    mapping: HashMap<usize, usize>,
    /// Free compact slots.
    indexes: IndexPool,
}

impl<T> SparseStore<T> {
    /// Creates a store with room for `capacity` holders.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: DenseStore::new(capacity),
            mapping: HashMap::with_capacity(capacity),
            indexes: IndexPool::with_capacity(capacity),
        }
    }

    /// Returns the number of compact slots backed by storage.
    #[inline]
    #[must_use]
    pub fn compact_capacity(&self) -> usize {
        self.values.capacity()
    }
}

impl<T> Store<T> for SparseStore<T> {
    fn add(&mut self, slot: usize, value: T) {
        debug_assert!(
            !self.mapping.contains_key(&slot),
            "slot {slot} already holds a value"
        );
        let index = self.indexes.acquire();
        self.mapping.insert(slot, index);
        self.values.add(index, value);
    }

    #[inline]
    fn get(&self, slot: usize) -> Option<&T> {
        let index = *self.mapping.get(&slot)?;
        self.values.get(index)
    }

    #[inline]
    fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        let index = *self.mapping.get(&slot)?;
        self.values.get_mut(index)
    }

    fn set(&mut self, slot: usize, value: T) {
        debug_assert!(self.mapping.contains_key(&slot), "slot {slot} holds no value");
        match self.mapping.get(&slot) {
            Some(&index) => self.values.set(index, value),
            None => self.add(slot, value),
        }
    }

    fn rem(&mut self, slot: usize) -> bool {
        let Some(index) = self.mapping.remove(&slot) else {
            return false;
        };

        self.values.rem(index);
        self.indexes.release(index);
        true
    }

    #[inline]
    fn locate(&self, slot: usize) -> Option<usize> {
        self.mapping.get(&slot).copied()
    }

    #[inline]
    fn at(&self, location: usize) -> Option<&T> {
        self.values.get(location)
    }

    #[inline]
    fn at_mut(&mut self, location: usize) -> Option<&mut T> {
        self.values.get_mut(location)
    }

    #[inline]
    fn len(&self) -> usize {
        self.mapping.len()
    }
}
