//! # Component Storage
//!
//! Per-component storage strategies behind one contract.
//!
//! Each registered component type gets exactly one store, chosen at
//! registration:
//!
//! ```text
//! Dense:      value lives at the entity's slot index
//!             [ A0 | -- | A2 | A3 | -- | ... ]      O(1), no indirection
//!
//! Sparse:     entity slot -> compact index -> value
//!             {0: 1, 7: 0}  [ A7 | A0 | -- ]        memory ~ holders
//!
//! Singleton:  one value shared by every holder
//!             holders: {0, 3, 9}  value: A         attach flips a bit
//! ```
//!
//! All variants grow on demand; capacity passed at construction is a hint.

mod dense;
mod singleton;
mod sparse;

use std::any::{type_name, Any};

pub use dense::DenseStore;
pub use singleton::SingletonStore;
pub use sparse::SparseStore;

use super::component::Component;

/// Storage strategy for a component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Value stored directly at the entity slot index.
    Dense,
    /// Value stored in a compact array reached through a slot mapping.
    Sparse,
    /// One value shared by every entity holding the component.
    Singleton,
}

/// Typed contract shared by every storage strategy.
///
/// Stores never consult entity masks. Callers check presence first:
/// `add` on an occupied slot and `set` on an empty slot are precondition
/// violations that debug builds report.
pub trait Store<T> {
    /// Installs a value for `slot`. The slot must be empty.
    fn add(&mut self, slot: usize, value: T);

    /// Returns the value attached to `slot`, or `None` if there is none.
    fn get(&self, slot: usize) -> Option<&T>;

    /// Returns the value attached to `slot` mutably.
    ///
    /// Writes are visible to every later reader of the slot until the value
    /// is removed.
    fn get_mut(&mut self, slot: usize) -> Option<&mut T>;

    /// Overwrites the value attached to `slot`. The slot must hold a value.
    fn set(&mut self, slot: usize, value: T);

    /// Detaches the value from `slot`, releasing anything tied to it.
    ///
    /// Returns `true` if a value was attached.
    fn rem(&mut self, slot: usize) -> bool;

    /// Resolves `slot` to a location usable with [`Store::at`].
    fn locate(&self, slot: usize) -> Option<usize>;

    /// Returns the value at a location obtained from [`Store::locate`].
    fn at(&self, location: usize) -> Option<&T>;

    /// Returns the value at a location obtained from [`Store::locate`]
    /// mutably.
    fn at_mut(&mut self, location: usize) -> Option<&mut T>;

    /// Returns the number of slots with an attached value.
    fn len(&self) -> usize;

    /// Returns `true` if no slot has an attached value.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage for a single component type, tagged by strategy.
pub enum ComponentStorage<T> {
    /// Dense-indexed storage.
    Dense(DenseStore<T>),
    /// Sparse-indirected storage.
    Sparse(SparseStore<T>),
    /// Shared singleton storage.
    Singleton(SingletonStore<T>),
}

impl<T> ComponentStorage<T> {
    /// Returns the storage strategy.
    #[must_use]
    pub const fn kind(&self) -> StorageKind {
        match self {
            Self::Dense(_) => StorageKind::Dense,
            Self::Sparse(_) => StorageKind::Sparse,
            Self::Singleton(_) => StorageKind::Singleton,
        }
    }

    /// Returns the shared value if this is singleton storage.
    #[must_use]
    pub fn singleton(&self) -> Option<&T> {
        match self {
            Self::Singleton(store) => Some(store.value()),
            _ => None,
        }
    }

    /// Returns the shared value mutably if this is singleton storage.
    pub fn singleton_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Singleton(store) => Some(store.value_mut()),
            _ => None,
        }
    }
}

/// Dispatches one call to whichever variant is active.
macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            ComponentStorage::Dense($store) => $call,
            ComponentStorage::Sparse($store) => $call,
            ComponentStorage::Singleton($store) => $call,
        }
    };
}

impl<T> Store<T> for ComponentStorage<T> {
    #[inline]
    fn add(&mut self, slot: usize, value: T) {
        dispatch!(self, store => store.add(slot, value));
    }

    #[inline]
    fn get(&self, slot: usize) -> Option<&T> {
        dispatch!(self, store => store.get(slot))
    }

    #[inline]
    fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        dispatch!(self, store => store.get_mut(slot))
    }

    #[inline]
    fn set(&mut self, slot: usize, value: T) {
        dispatch!(self, store => store.set(slot, value));
    }

    #[inline]
    fn rem(&mut self, slot: usize) -> bool {
        dispatch!(self, store => store.rem(slot))
    }

    #[inline]
    fn locate(&self, slot: usize) -> Option<usize> {
        dispatch!(self, store => store.locate(slot))
    }

    #[inline]
    fn at(&self, location: usize) -> Option<&T> {
        dispatch!(self, store => store.at(location))
    }

    #[inline]
    fn at_mut(&mut self, location: usize) -> Option<&mut T> {
        dispatch!(self, store => store.at_mut(location))
    }

    #[inline]
    fn len(&self) -> usize {
        dispatch!(self, store => store.len())
    }
}

/// Type-erased view of a [`ComponentStorage`], held by the world.
///
/// Structural operations that do not need the value type (detaching on
/// entity removal, slot resolution for binders) go through this trait;
/// typed access downcasts once per call.
pub trait AnyStore: Any {
    /// Storage strategy of the underlying store.
    fn kind(&self) -> StorageKind;

    /// Type name of the stored component.
    fn component_name(&self) -> &'static str;

    /// Detaches whatever `slot` holds. Returns `true` if a value was attached.
    fn remove_slot(&mut self, slot: usize) -> bool;

    /// Resolves `slot` to a store location.
    fn locate_slot(&self, slot: usize) -> Option<usize>;

    /// Number of attached slots.
    fn attached(&self) -> usize;

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStore for ComponentStorage<T> {
    fn kind(&self) -> StorageKind {
        ComponentStorage::kind(self)
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn remove_slot(&mut self, slot: usize) -> bool {
        self.rem(slot)
    }

    fn locate_slot(&self, slot: usize) -> Option<usize> {
        self.locate(slot)
    }

    fn attached(&self) -> usize {
        self.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
