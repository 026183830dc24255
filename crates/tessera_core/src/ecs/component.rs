//! # Component System
//!
//! Components are plain values with no behavior. Any `'static` type can be a
//! component once it implements the [`Component`] marker trait and is
//! registered on a [`WorldBuilder`](super::WorldBuilder).

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use super::mask::Mask;
use super::storage::StorageKind;
use crate::error::{EcsError, EcsResult};

/// Marker trait for ECS components.
///
/// Unlike fixed-layout engines, components carry no size or `Copy`
/// requirement: the world stores owned values of any `'static` type.
///
/// # Example
///
/// ```rust
/// use tessera_core::Component;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Name(String);
///
/// impl Component for Name {}
/// ```
pub trait Component: 'static {}

/// Stable small integer identifying a registered component type.
///
/// Identifiers are assigned densely in registration order. They index the
/// world's store list and every component [`Mask`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ComponentId(usize);

impl ComponentId {
    /// Returns the identifier as an index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Registration record for one component type.
#[derive(Debug, Clone, Copy)]
pub struct ComponentInfo {
    name: &'static str,
    kind: StorageKind,
}

impl ComponentInfo {
    /// Type name of the component.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Storage strategy the component was registered with.
    #[must_use]
    pub const fn kind(&self) -> StorageKind {
        self.kind
    }
}

/// The component identifier table of a world.
///
/// Immutable once the world is built.
#[derive(Debug, Default)]
pub struct Components {
    ids: HashMap<TypeId, ComponentId>,
    infos: Vec<ComponentInfo>,
}

impl Components {
    /// Registers `T`, assigning the next identifier.
    pub(crate) fn register<T: Component>(&mut self, kind: StorageKind) -> EcsResult<ComponentId> {
        let type_id = TypeId::of::<T>();
        if self.ids.contains_key(&type_id) {
            return Err(EcsError::DuplicateComponent {
                name: type_name::<T>(),
            });
        }

        let id = ComponentId(self.infos.len());
        self.ids.insert(type_id, id);
        self.infos.push(ComponentInfo {
            name: type_name::<T>(),
            kind,
        });
        Ok(id)
    }

    /// Resolves the identifier of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `T` was never
    /// registered.
    #[inline]
    pub fn id_of<T: Component>(&self) -> EcsResult<ComponentId> {
        self.ids
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(EcsError::UnregisteredComponent {
                name: type_name::<T>(),
            })
    }

    /// Returns the registration record for `id`.
    #[must_use]
    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.0)
    }

    /// Returns the number of registered components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns `true` if no component is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Creates an empty mask sized for this table.
    #[must_use]
    pub fn new_mask(&self) -> Mask {
        Mask::new(self.infos.len())
    }

    /// Iterates over registered components in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &ComponentInfo)> {
        self.infos
            .iter()
            .enumerate()
            .map(|(index, info)| (ComponentId(index), info))
    }
}
