//! Dense-indexed storage: the value lives at the entity's slot index.

use super::Store;

/// Contiguous storage indexed directly by entity slot.
///
/// This storage guarantees:
/// - O(1) access by slot, no indirection
/// - Capacity doubles to the next power of two when a slot exceeds it
/// - Existing values keep their slot across growth
///
/// Empty slots hold no value. A read of an empty slot returns `None`
/// instead of a fabricated default.
///
/// # Example
///
/// ```rust
/// use tessera_core::{DenseStore, Store};
///
/// let mut store: DenseStore<f32> = DenseStore::new(4);
/// store.add(0, 1.5);
/// store.add(9, 2.5); // grows to 16 slots
/// assert_eq!(store.capacity(), 16);
/// assert_eq!(store.get(0), Some(&1.5));
/// ```
#[derive(Debug, Clone)]
pub struct DenseStore<T> {
    /// One entry per slot; `None` when nothing is attached.
    slots: Vec<Option<T>>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> DenseStore<T> {
    /// Creates a store with `capacity` empty slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, len: 0 }
    }

    /// Returns the number of slots currently backed by storage.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Ensures slots `0..required` exist.
    ///
    /// Grows to the next power of two at or above `required`. Values move
    /// with their slot index.
    pub fn ensure_capacity(&mut self, required: usize) {
        if required <= self.slots.len() {
            return;
        }

        let capacity = required.next_power_of_two();
        self.slots.resize_with(capacity, || None);
    }

    /// Iterates over occupied slots and their values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, value)| value.as_ref().map(|v| (slot, v)))
    }
}

impl<T> Store<T> for DenseStore<T> {
    fn add(&mut self, slot: usize, value: T) {
        self.ensure_capacity(slot + 1);
        let entry = &mut self.slots[slot];
        debug_assert!(entry.is_none(), "slot {slot} already holds a value");
        if entry.replace(value).is_none() {
            self.len += 1;
        }
    }

    #[inline]
    fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot)?.as_ref()
    }

    #[inline]
    fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.slots.get_mut(slot)?.as_mut()
    }

    fn set(&mut self, slot: usize, value: T) {
        debug_assert!(self.get(slot).is_some(), "slot {slot} holds no value");
        self.ensure_capacity(slot + 1);
        if self.slots[slot].replace(value).is_none() {
            self.len += 1;
        }
    }

    fn rem(&mut self, slot: usize) -> bool {
        match self.slots.get_mut(slot).and_then(Option::take) {
            Some(_) => {
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    #[inline]
    fn locate(&self, slot: usize) -> Option<usize> {
        self.get(slot).map(|_| slot)
    }

    #[inline]
    fn at(&self, location: usize) -> Option<&T> {
        self.get(location)
    }

    #[inline]
    fn at_mut(&mut self, location: usize) -> Option<&mut T> {
        self.get_mut(location)
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_creation() {
        let store: DenseStore<u32> = DenseStore::new(1000);
        assert_eq!(store.capacity(), 1000);
        assert!(store.is_empty());
    }

    #[test]
    fn test_storage_get_set() {
        let mut store: DenseStore<String> = DenseStore::new(100);
        store.add(50, "first".to_owned());
        store.set(50, "second".to_owned());

        assert_eq!(store.get(50).map(String::as_str), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_mut_writes_through() {
        let mut store: DenseStore<u32> = DenseStore::new(4);
        store.add(2, 10);
        *store.get_mut(2).unwrap() += 5;
        assert_eq!(store.get(2), Some(&15));
    }

    #[test]
    fn test_empty_slot_is_none() {
        let store: DenseStore<u32> = DenseStore::new(100);
        assert!(store.get(10).is_none());
        assert!(store.get(100).is_none());
    }

    #[test]
    fn test_growth_preserves_lower_slots() {
        let mut store: DenseStore<u64> = DenseStore::new(2);
        store.add(0, 42);
        store.add(1, 43);

        // Past the first doubling threshold and then some
        store.add(2, 44);
        assert_eq!(store.capacity(), 4);
        store.add(37, 45);
        assert_eq!(store.capacity(), 64);

        assert_eq!(store.get(0), Some(&42));
        assert_eq!(store.get(1), Some(&43));
        assert_eq!(store.get(2), Some(&44));
        assert_eq!(store.get(37), Some(&45));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_zero_capacity_grows() {
        let mut store: DenseStore<u8> = DenseStore::new(0);
        store.add(0, 1);
        assert_eq!(store.capacity(), 1);
    }

    #[test]
    fn test_rem_frees_slot() {
        let mut store: DenseStore<u8> = DenseStore::new(8);
        store.add(3, 1);
        assert!(store.rem(3));
        assert!(store.get(3).is_none());
        store.add(3, 2);
        assert_eq!(store.get(3), Some(&2));
        assert_eq!(store.iter().collect::<Vec<_>>(), vec![(3, &2)]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "already holds a value")]
    fn test_double_add_panics() {
        let mut store: DenseStore<u8> = DenseStore::new(8);
        store.add(1, 1);
        store.add(1, 2);
    }
}
