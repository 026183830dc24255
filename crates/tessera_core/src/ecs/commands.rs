//! # Deferred Commands
//!
//! Structural changes requested while the world is borrowed shared.
//!
//! Systems and view visitors only see `&World`. They record entity creation,
//! removal and component changes on a [`CommandBuffer`], and the world
//! applies the buffer once the sweep is over.

use std::cell::RefCell;
use std::fmt;

use super::access::{Bundle, ComponentSet};
use super::entity::Entity;
use super::world::World;
use crate::error::EcsResult;

type Command = Box<dyn FnOnce(&mut World) -> EcsResult<()>>;

/// Queue of structural changes, applied in recording order by
/// [`World::apply`].
///
/// Recording only needs `&self`, so one buffer can be shared by every
/// invocation of a system during a sweep.
///
/// # Example
///
/// ```rust
/// use tessera_core::{CommandBuffer, Component, World};
///
/// struct Health(u32);
/// impl Component for Health {}
///
/// let mut world = World::builder().with_dense::<Health>().build(8)?;
/// let doomed = world.add_entity(Health(0))?;
///
/// let commands = CommandBuffer::new();
/// commands.remove_entity(doomed);
/// commands.spawn(Health(100));
/// world.apply(commands)?;
///
/// assert!(!world.is_alive(doomed));
/// assert_eq!(world.len(), 1);
/// # Ok::<(), tessera_core::EcsError>(())
/// ```
#[derive(Default)]
pub struct CommandBuffer {
    commands: RefCell<Vec<Command>>,
}

impl CommandBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an entity holding `bundle`.
    pub fn spawn<B: Bundle>(&self, bundle: B) {
        self.push(move |world| world.add_entity(bundle).map(|_| ()));
    }

    /// Removes an entity.
    ///
    /// Does nothing if the entity is already gone when the command runs, so
    /// two systems may both ask for the same removal.
    pub fn remove_entity(&self, entity: Entity) {
        self.push(move |world| {
            if world.is_alive(entity) {
                world.remove_entity(entity)
            } else {
                Ok(())
            }
        });
    }

    /// Attaches or overwrites the values in `bundle` on `entity`.
    ///
    /// The command fails with [`EcsError::StaleEntity`] if the entity is gone.
    ///
    /// [`EcsError::StaleEntity`]: crate::EcsError::StaleEntity
    pub fn insert<B: Bundle>(&self, entity: Entity, bundle: B) {
        self.push(move |world| world.entity_mut(entity)?.set(bundle).map(|_| ()));
    }

    /// Detaches the components in `S` from `entity`.
    ///
    /// The command fails with [`EcsError::StaleEntity`] if the entity is gone.
    ///
    /// [`EcsError::StaleEntity`]: crate::EcsError::StaleEntity
    pub fn remove<S: ComponentSet>(&self, entity: Entity) {
        self.push(move |world| world.entity_mut(entity)?.rem::<S>().map(|_| ()));
    }

    /// Records an arbitrary change.
    pub fn push<F>(&self, command: F)
    where
        F: FnOnce(&mut World) -> EcsResult<()> + 'static,
    {
        self.commands.borrow_mut().push(Box::new(command));
    }

    /// Returns the number of recorded commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    /// Returns `true` if nothing was recorded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }

    pub(crate) fn into_commands(self) -> Vec<Command> {
        self.commands.into_inner()
    }
}

impl fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Binder, Component, SystemContext};
    use crate::error::EcsError;

    #[derive(Debug, PartialEq)]
    struct Health(i32);
    #[derive(Debug, PartialEq)]
    struct Poisoned;

    impl Component for Health {}
    impl Component for Poisoned {}

    fn world() -> World {
        World::builder()
            .with_dense::<Health>()
            .with_sparse::<Poisoned>()
            .build(8)
            .unwrap()
    }

    #[test]
    fn test_commands_apply_in_order() {
        let mut world = world();
        let entity = world.add_entity(Health(10)).unwrap();

        let commands = CommandBuffer::new();
        commands.insert(entity, (Health(5), Poisoned));
        commands.remove::<Poisoned>(entity);
        commands.spawn(Poisoned);
        assert_eq!(commands.len(), 3);

        world.apply(commands).unwrap();

        let access = world.entity(entity).unwrap();
        assert_eq!(*access.get::<Health>().unwrap().unwrap(), Health(5));
        assert!(!access.has::<Poisoned>().unwrap());
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn test_double_removal_is_harmless() {
        let mut world = world();
        let entity = world.new_entity();

        let commands = CommandBuffer::new();
        commands.remove_entity(entity);
        commands.remove_entity(entity);
        world.apply(commands).unwrap();
        assert!(world.is_empty());
    }

    #[test]
    fn test_apply_stops_at_first_error() {
        let mut world = world();
        let entity = world.new_entity();
        world.remove_entity(entity).unwrap();

        let commands = CommandBuffer::new();
        commands.insert(entity, Health(1));
        commands.spawn(Health(2));

        let err = world.apply(commands).unwrap_err();
        assert_eq!(err, EcsError::StaleEntity(entity));
        assert!(world.is_empty());
    }

    #[test]
    fn test_update_applies_after_each_system() {
        let mut world = world();
        let victim = world.add_entity(Health(0)).unwrap();
        world.add_entity(Health(3)).unwrap();

        // Poison every entity with no health left.
        world
            .add_system(|b: &mut Binder<'_>| {
                let health = b.required::<Health>()?;
                Ok(move |ctx: &SystemContext<'_>| -> EcsResult<()> {
                    if ctx.read(health)?.0 <= 0 {
                        ctx.commands().insert(ctx.entity().id(), Poisoned);
                    }
                    Ok(())
                })
            })
            .unwrap();

        // Poisoned entities are removed in the same tick.
        world
            .add_system(|b: &mut Binder<'_>| {
                let _ = b.required::<Poisoned>()?;
                Ok(|ctx: &SystemContext<'_>| -> EcsResult<()> {
                    ctx.commands().remove_entity(ctx.entity().id());
                    Ok(())
                })
            })
            .unwrap();

        world.update().unwrap();
        assert!(!world.is_alive(victim));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_push_arbitrary_command() {
        let mut world = world();
        let commands = CommandBuffer::new();
        commands.push(|world| {
            world.new_entity();
            Ok(())
        });
        assert!(!commands.is_empty());
        world.apply(commands).unwrap();
        assert_eq!(world.len(), 1);
    }
}
