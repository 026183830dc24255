//! # Views
//!
//! Caller-driven sweeps over the entities holding a set of components.

use super::access::{mask_of, ComponentSet, EntityRef};
use super::mask::Mask;
use super::world::World;
use crate::error::EcsResult;

/// A reusable filter over live entities.
///
/// A view stores only the mask of the components it asks for. Every sweep
/// walks the live entities in insertion order and yields those whose mask
/// contains the view's mask, so membership always reflects the world at the
/// time of the call.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Component, View, World};
///
/// struct Position(f32);
/// struct Velocity(f32);
/// impl Component for Position {}
/// impl Component for Velocity {}
///
/// let mut world = World::builder()
///     .with_dense::<Position>()
///     .with_dense::<Velocity>()
///     .build(8)?;
/// world.add_entity((Position(0.0), Velocity(1.5)))?;
/// world.add_entity(Position(4.0))?;
///
/// let moving = View::new::<(Position, Velocity)>(&world)?;
/// moving.each(&world, |entity| {
///     let speed = entity.get::<Velocity>()?.map_or(0.0, |v| v.0);
///     if let Some(mut position) = entity.get_mut::<Position>()? {
///         position.0 += speed;
///     }
///     Ok(())
/// })?;
/// assert_eq!(moving.count(&world), 1);
/// # Ok::<(), tessera_core::EcsError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    required: Mask,
}

impl View {
    /// Creates a view over entities holding every component in `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `S` names a component
    /// the world was not built with.
    ///
    /// [`EcsError::UnregisteredComponent`]: crate::EcsError::UnregisteredComponent
    pub fn new<S: ComponentSet>(world: &World) -> EcsResult<Self> {
        Ok(Self {
            required: mask_of::<S>(world.components())?,
        })
    }

    /// Returns the mask an entity must contain to match.
    #[inline]
    #[must_use]
    pub fn mask(&self) -> &Mask {
        &self.required
    }

    /// Calls `visitor` on every matching entity, in insertion order.
    ///
    /// # Errors
    ///
    /// Stops at the first error returned by `visitor` and returns it.
    pub fn each<F>(&self, world: &World, visitor: F) -> EcsResult<()>
    where
        F: FnMut(EntityRef<'_>) -> EcsResult<()>,
    {
        self.iter(world).try_for_each(visitor)
    }

    /// Iterates over matching entities, in insertion order.
    pub fn iter<'w>(&'w self, world: &'w World) -> impl Iterator<Item = EntityRef<'w>> + 'w {
        world
            .entities
            .iter()
            .filter(move |&index| world.entities.record(index).mask.contains(&self.required))
            .map(move |index| world.entity_at(index))
    }

    /// Counts matching entities.
    #[must_use]
    pub fn count(&self, world: &World) -> usize {
        self.iter(world).count()
    }
}
