//! Singleton storage: one value shared by every holder.

use super::dense::DenseStore;
use super::Store;

/// Storage holding a single world-wide value.
///
/// The store is the only owner of the value, established at registration.
/// Entities hold the component by reference only: attaching records the
/// entity as a holder and drops the value passed in, detaching forgets the
/// holder and never touches the shared value.
///
/// Every holder observes the same value, so a write through one holder is
/// visible through all of them.
///
/// Every slot resolves to location `0`.
#[derive(Debug, Clone)]
pub struct SingletonStore<T> {
    /// The authoritative value.
    value: T,
    /// Slots currently holding the singleton.
    holders: DenseStore<()>,
}

impl<T> SingletonStore<T> {
    /// Creates a singleton store around its authoritative value.
    #[must_use]
    pub fn new(value: T, capacity: usize) -> Self {
        Self {
            value,
            holders: DenseStore::new(capacity),
        }
    }

    /// Returns the shared value regardless of holders.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Returns the shared value mutably regardless of holders.
    #[inline]
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    #[inline]
    fn holds(&self, slot: usize) -> bool {
        self.holders.get(slot).is_some()
    }
}

impl<T> Store<T> for SingletonStore<T> {
    fn add(&mut self, slot: usize, _value: T) {
        tracing::trace!(slot, "singleton attached, supplied value discarded");
        self.holders.add(slot, ());
    }

    #[inline]
    fn get(&self, slot: usize) -> Option<&T> {
        self.holds(slot).then_some(&self.value)
    }

    #[inline]
    fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        if self.holds(slot) {
            Some(&mut self.value)
        } else {
            None
        }
    }

    fn set(&mut self, slot: usize, _value: T) {
        debug_assert!(self.holds(slot), "slot {slot} holds no value");
    }

    fn rem(&mut self, slot: usize) -> bool {
        self.holders.rem(slot)
    }

    #[inline]
    fn locate(&self, slot: usize) -> Option<usize> {
        self.holds(slot).then_some(0)
    }

    #[inline]
    fn at(&self, location: usize) -> Option<&T> {
        (location == 0).then_some(&self.value)
    }

    #[inline]
    fn at_mut(&mut self, location: usize) -> Option<&mut T> {
        if location == 0 {
            Some(&mut self.value)
        } else {
            None
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.holders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_value_is_authoritative() {
        let mut store = SingletonStore::new(3_u32, 4);
        store.add(0, 100);
        store.add(1, 200);

        assert_eq!(store.get(0), Some(&3));
        assert_eq!(store.get(1), Some(&3));
    }

    #[test]
    fn test_mutation_visible_to_all_holders() {
        let mut store = SingletonStore::new(String::from("dawn"), 4);
        store.add(0, String::new());
        store.add(2, String::new());

        store.get_mut(0).unwrap().push_str("-dusk");
        assert_eq!(store.get(2).map(String::as_str), Some("dawn-dusk"));
        assert!(std::ptr::eq(store.get(0).unwrap(), store.get(2).unwrap()));
    }

    #[test]
    fn test_non_holder_sees_nothing() {
        let mut store = SingletonStore::new(1_u8, 4);
        store.add(0, 0);
        assert!(store.get(1).is_none());
        assert!(store.locate(1).is_none());
    }

    #[test]
    fn test_rem_keeps_value() {
        let mut store = SingletonStore::new(9_u8, 4);
        store.add(0, 0);
        *store.get_mut(0).unwrap() = 10;

        assert!(store.rem(0));
        assert!(store.get(0).is_none());
        assert!(store.is_empty());
        assert_eq!(*store.value(), 10);

        store.add(0, 0);
        assert_eq!(store.get(0), Some(&10));
    }

    #[test]
    fn test_set_is_ignored() {
        let mut store = SingletonStore::new(1_u8, 1);
        store.add(0, 0);
        store.set(0, 55);
        assert_eq!(store.get(0), Some(&1));
    }
}
