//! # Component Masks
//!
//! Fixed-width bitsets over registered component identifiers.
//!
//! ```text
//! component id:  0 1 2 3 ... 63 | 64 65 ...
//! word:          [      0       ] [    1    ] ...
//! ```
//!
//! Every mask in a world is built with the same width, derived from the
//! number of registered components when the world is built.

use std::fmt;

/// Bits per storage word.
const WORD_BITS: usize = 64;

/// A fixed-width bit vector recording component presence.
///
/// Bit `i` is set on an entity's mask iff the entity currently holds a
/// value for the component with identifier `i`.
///
/// ## Performance
///
/// - `set` / `clear` / `get`: O(1)
/// - `contains`: O(words), one word per 64 registered components
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Mask {
    /// 64 components per u64.
    words: Box<[u64]>,
}

impl Mask {
    /// Creates an empty mask wide enough for `component_count` components.
    ///
    /// A mask always has at least one word, so a world with no registered
    /// components still produces comparable masks.
    #[must_use]
    pub fn new(component_count: usize) -> Self {
        let word_count = component_count.div_ceil(WORD_BITS).max(1);
        Self {
            words: vec![0u64; word_count].into_boxed_slice(),
        }
    }

    /// Returns the number of bits this mask can hold.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.words.len() * WORD_BITS
    }

    /// Sets bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the mask width.
    #[inline]
    pub fn set(&mut self, index: usize) {
        self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
    }

    /// Clears bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the mask width.
    #[inline]
    pub fn clear(&mut self, index: usize) {
        self.words[index / WORD_BITS] &= !(1u64 << (index % WORD_BITS));
    }

    /// Tests bit `index`. Bits outside the mask width read as unset.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        self.words
            .get(index / WORD_BITS)
            .is_some_and(|word| (word >> (index % WORD_BITS)) & 1 == 1)
    }

    /// Returns `true` if every bit set in `other` is also set in `self`.
    ///
    /// Extra bits in `self` are permitted; this is the required-components
    /// match used by views and systems.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the masks were built with different widths.
    #[inline]
    #[must_use]
    pub fn contains(&self, other: &Mask) -> bool {
        debug_assert_eq!(
            self.words.len(),
            other.words.len(),
            "comparing masks of different widths"
        );
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(&mine, &theirs)| mine & theirs == theirs)
    }

    /// Returns `true` if no bit is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// Returns the number of set bits.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Clears every bit.
    pub fn clear_all(&mut self) {
        for word in self.words.iter_mut() {
            *word = 0;
        }
    }

    /// Iterates over set bit indices in ascending order.
    pub fn iter_ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter_ones()).finish()
    }
}

/// Iterator over set bit indices of a [`Mask`].
pub struct Ones<'a> {
    words: &'a [u64],
    word_idx: usize,
    current_word: u64,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit = self.current_word.trailing_zeros() as usize;
                // Clear lowest set bit
                self.current_word &= self.current_word - 1;
                return Some(self.word_idx * WORD_BITS + bit);
            }

            self.word_idx += 1;
            self.current_word = *self.words.get(self.word_idx)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_width() {
        assert_eq!(Mask::new(0).width(), 64);
        assert_eq!(Mask::new(64).width(), 64);
        assert_eq!(Mask::new(65).width(), 128);
    }

    #[test]
    fn test_set_get_clear() {
        let mut mask = Mask::new(130);
        assert!(!mask.get(5));

        mask.set(5);
        mask.set(129);
        assert!(mask.get(5));
        assert!(mask.get(129));
        assert_eq!(mask.count(), 2);

        mask.clear(5);
        assert!(!mask.get(5));
        assert!(mask.get(129));
    }

    #[test]
    fn test_get_outside_width_is_unset() {
        let mask = Mask::new(3);
        assert!(!mask.get(1000));
    }

    #[test]
    fn test_contains_allows_extra_bits() {
        let mut entity = Mask::new(100);
        entity.set(1);
        entity.set(2);
        entity.set(70);

        let mut required = Mask::new(100);
        required.set(1);
        required.set(70);
        assert!(entity.contains(&required));

        required.set(3);
        assert!(!entity.contains(&required));
    }

    #[test]
    fn test_empty_is_contained_everywhere() {
        let required = Mask::new(10);
        assert!(Mask::new(10).contains(&required));
        assert!(required.is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "different widths")]
    fn test_contains_width_mismatch_panics() {
        let _ = Mask::new(10).contains(&Mask::new(200));
    }

    #[test]
    fn test_iter_ones_across_words() {
        let mut mask = Mask::new(200);
        for bit in [0, 63, 64, 150] {
            mask.set(bit);
        }
        assert_eq!(mask.iter_ones().collect::<Vec<_>>(), vec![0, 63, 64, 150]);

        mask.clear_all();
        assert!(mask.is_empty());
        assert_eq!(mask.iter_ones().next(), None);
    }
}
