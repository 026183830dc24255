//! # Index Pool
//!
//! Recycling allocator for small integer slot identifiers.

/// A recycling allocator for slot indices.
///
/// Released indices are handed out again before any new index is minted.
/// When the free list is empty the pool grows monotonically: the next index
/// is one past the highest index ever acquired.
///
/// Used for entity slots in the world and for compact slots inside
/// [`SparseStore`](crate::ecs::SparseStore).
///
/// # Contract
///
/// Releasing an index that is not currently acquired, or releasing the same
/// index twice, corrupts the free list. Debug builds detect both and panic.
///
/// # Example
///
/// ```rust
/// use tessera_core::IndexPool;
///
/// let mut pool = IndexPool::new();
/// let a = pool.acquire();
/// let b = pool.acquire();
/// assert_eq!((a, b), (0, 1));
///
/// pool.release(a);
/// assert_eq!(pool.acquire(), a); // reused
/// assert_eq!(pool.acquire(), 2); // fresh
/// ```
#[derive(Debug, Clone, Default)]
pub struct IndexPool {
    /// Free list - indices available for reuse (LIFO).
    free: Vec<usize>,
    /// Next never-used index.
    next: usize,
    /// Free flag per minted index, for double-release checks.
    #[cfg(debug_assertions)]
    is_free: Vec<bool>,
}

impl IndexPool {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            free: Vec::new(),
            next: 0,
            #[cfg(debug_assertions)]
            is_free: Vec::new(),
        }
    }

    /// Creates an empty pool whose free list can hold `capacity` released
    /// indices without reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            next: 0,
            #[cfg(debug_assertions)]
            is_free: Vec::new(),
        }
    }

    /// Acquires an index, reusing the most recently released one if any.
    ///
    /// This is an **O(1)** operation.
    #[inline]
    pub fn acquire(&mut self) -> usize {
        if let Some(index) = self.free.pop() {
            #[cfg(debug_assertions)]
            {
                self.is_free[index] = false;
            }
            return index;
        }

        let index = self.next;
        self.next += 1;
        index
    }

    /// Returns an index to the pool for later reuse.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `index` was never acquired or is already
    /// free.
    #[inline]
    pub fn release(&mut self, index: usize) {
        debug_assert!(
            index < self.next,
            "released index {index} was never acquired"
        );
        #[cfg(debug_assertions)]
        {
            if self.is_free.len() < self.next {
                self.is_free.resize(self.next, false);
            }
            assert!(!self.is_free[index], "index {index} released twice");
            self.is_free[index] = true;
        }
        self.free.push(index);
    }

    /// Returns the number of indices currently acquired.
    #[inline]
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.next - self.free.len()
    }

    /// Returns one past the highest index ever handed out.
    #[inline]
    #[must_use]
    pub const fn high_water(&self) -> usize {
        self.next
    }

    /// Returns the number of released indices waiting for reuse.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pool_monotonic_growth() {
        let mut pool = IndexPool::with_capacity(4);
        for expected in 0..10 {
            assert_eq!(pool.acquire(), expected);
        }
        assert_eq!(pool.in_use(), 10);
        assert_eq!(pool.high_water(), 10);
    }

    #[test]
    fn test_pool_reuse_is_lifo() {
        let mut pool = IndexPool::new();
        let _ = (pool.acquire(), pool.acquire(), pool.acquire());

        pool.release(0);
        pool.release(2);
        assert_eq!(pool.free_count(), 2);

        assert_eq!(pool.acquire(), 2);
        assert_eq!(pool.acquire(), 0);
        assert_eq!(pool.acquire(), 3);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "released twice")]
    fn test_pool_double_release_panics() {
        let mut pool = IndexPool::new();
        let index = pool.acquire();
        pool.release(index);
        pool.release(index);
    }

    #[test]
    fn test_pool_many_releases_then_reacquire() {
        let mut pool = IndexPool::new();
        let held: Vec<usize> = (0..10_000).map(|_| pool.acquire()).collect();
        for &index in &held {
            pool.release(index);
        }
        assert_eq!(pool.free_count(), 10_000);

        // Reacquired indices can be released again.
        let again = pool.acquire();
        assert_eq!(again, 9_999);
        pool.release(again);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "never acquired")]
    fn test_pool_release_unknown_panics() {
        let mut pool = IndexPool::new();
        pool.release(7);
    }

    proptest! {
        #[test]
        fn prop_acquired_indices_are_unique(ops in proptest::collection::vec(any::<bool>(), 0..200)) {
            let mut pool = IndexPool::new();
            let mut held: Vec<usize> = Vec::new();

            for acquire in ops {
                if acquire || held.is_empty() {
                    let index = pool.acquire();
                    prop_assert!(!held.contains(&index));
                    held.push(index);
                } else {
                    let index = held.swap_remove(0);
                    pool.release(index);
                }
                prop_assert_eq!(pool.in_use(), held.len());
            }
        }
    }
}
