//! # ECS World
//!
//! The central container for entities, component stores and systems.
//!
//! ## Borrowing model
//!
//! Structural changes (creating and removing entities, attaching and
//! detaching components, registering systems) take `&mut World`. Reading
//! and mutating component values in place only needs `&World`: each store
//! sits in its own `RefCell`, so values from different stores can be
//! borrowed mutably at the same time.
//!
//! Systems and view visitors receive `&World`, which makes structural
//! changes during a sweep impossible. They queue them on a
//! [`CommandBuffer`] instead.

use std::any::type_name;
use std::cell::{Ref, RefCell, RefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use super::access::{Bundle, ComponentSet, EntityMut, EntityRef};
use super::builder::WorldBuilder;
use super::commands::CommandBuffer;
use super::component::{Component, ComponentId, Components};
use super::entity::{Entity, EntityList};
use super::storage::{AnyStore, ComponentStorage, StorageKind, Store};
use super::system::{Binder, System, SystemBinder, SystemId};
use super::view::View;
use crate::error::{EcsError, EcsResult};

/// Process-unique identity of a [`World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct WorldId(u64);

impl WorldId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The ECS World - container for all entities, stores and systems.
///
/// The component schema is fixed when the world is built by a
/// [`WorldBuilder`]. Stores and the entity arena grow on demand.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Component, World};
///
/// #[derive(Debug, PartialEq)]
/// struct Position(f32);
/// impl Component for Position {}
///
/// let mut world = World::builder().with_dense::<Position>().build(64)?;
///
/// let entity = world.add_entity(Position(1.0))?;
/// let position = world.entity(entity)?.get::<Position>()?;
/// assert_eq!(position.as_deref(), Some(&Position(1.0)));
/// # Ok::<(), tessera_core::EcsError>(())
/// ```
pub struct World {
    /// Identity stamped into every system identifier.
    id: WorldId,
    /// Component identifier table.
    components: Components,
    /// One store per component, index-aligned with identifiers.
    stores: Vec<RefCell<Box<dyn AnyStore>>>,
    /// Slot arena and ordered live list.
    pub(crate) entities: EntityList,
    /// Registered systems in execution order.
    systems: Vec<SystemBinder>,
    /// Next system identifier.
    next_system: usize,
    /// Systems taken out of `systems` by a running `update`.
    running: usize,
}

impl World {
    /// Starts building a world.
    #[must_use]
    pub fn builder() -> WorldBuilder {
        WorldBuilder::new()
    }

    pub(crate) fn from_parts(
        components: Components,
        stores: Vec<RefCell<Box<dyn AnyStore>>>,
        entity_capacity: usize,
        system_capacity: usize,
    ) -> Self {
        let entities = EntityList::new(components.len(), entity_capacity);
        Self {
            id: WorldId::next(),
            components,
            stores,
            entities,
            systems: Vec::with_capacity(system_capacity),
            next_system: 0,
            running: 0,
        }
    }

    pub(crate) fn id(&self) -> WorldId {
        self.id
    }

    // =========================================================================
    // Schema
    // =========================================================================

    /// Returns the component identifier table.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Resolves the identifier of component `T`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `T` is not registered.
    #[inline]
    pub fn component_id<T: Component>(&self) -> EcsResult<ComponentId> {
        self.components.id_of::<T>()
    }

    /// Returns the number of registered components.
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Returns the storage strategy component `T` was registered with.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `T` is not registered.
    pub fn storage_kind<T: Component>(&self) -> EcsResult<StorageKind> {
        let id = self.components.id_of::<T>()?;
        let store = self.borrow_store::<T>(id)?;
        Ok(store.kind())
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Returns the number of live entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if there are no live entities.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.len() == 0
    }

    /// Checks if an entity handle refers to a live entity.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.live(entity).is_some()
    }

    /// Iterates over live entity handles in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities
            .iter()
            .map(|index| self.entities.handle(index))
    }

    /// Creates an entity with no components.
    ///
    /// The entity is appended to the live list, so it is visited after
    /// every entity created before it.
    pub fn new_entity(&mut self) -> Entity {
        let entity = self.entities.spawn();
        tracing::trace!(?entity, "entity created");
        entity
    }

    /// Creates an entity and attaches the components in `bundle`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle contains an unregistered component.
    /// The half-built entity is removed again before returning.
    pub fn add_entity<B: Bundle>(&mut self, bundle: B) -> EcsResult<Entity> {
        let entity = self.new_entity();
        let applied = bundle.apply(&mut EntityMut::new(self, entity));
        if let Err(error) = applied {
            self.remove_entity(entity)?;
            return Err(error);
        }
        Ok(entity)
    }

    /// Removes an entity and every component attached to it.
    ///
    /// The slot returns to the pool and the handle (and every copy of it)
    /// becomes stale.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the handle is null or already
    /// removed.
    pub fn remove_entity(&mut self, entity: Entity) -> EcsResult<()> {
        let record = self
            .entities
            .live(entity)
            .ok_or(EcsError::StaleEntity(entity))?;

        for id in record.mask.iter_ones() {
            let detached = self.stores[id].get_mut().remove_slot(entity.index());
            debug_assert!(detached, "mask bit {id} set without a stored value");
        }

        self.entities.despawn(entity.index());
        tracing::trace!(?entity, "entity removed");
        Ok(())
    }

    /// Removes an entity and resets the handle to [`Entity::NULL`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the handle is null or already
    /// removed. The handle is left untouched in that case.
    pub fn remove_entity_in_place(&mut self, entity: &mut Entity) -> EcsResult<()> {
        self.remove_entity(*entity)?;
        *entity = Entity::NULL;
        Ok(())
    }

    /// Returns a read accessor for a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the handle is null or removed.
    pub fn entity(&self, entity: Entity) -> EcsResult<EntityRef<'_>> {
        let record = self
            .entities
            .live(entity)
            .ok_or(EcsError::StaleEntity(entity))?;
        Ok(EntityRef::new(self, entity, &record.mask))
    }

    /// Returns a structural accessor for a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StaleEntity`] if the handle is null or removed.
    pub fn entity_mut(&mut self, entity: Entity) -> EcsResult<EntityMut<'_>> {
        if !self.is_alive(entity) {
            return Err(EcsError::StaleEntity(entity));
        }
        Ok(EntityMut::new(self, entity))
    }

    pub(crate) fn entity_at(&self, index: usize) -> EntityRef<'_> {
        let record = self.entities.record(index);
        EntityRef::new(self, self.entities.handle(index), &record.mask)
    }

    // =========================================================================
    // Views and singletons
    // =========================================================================

    /// Builds a [`View`] over entities holding every component in `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `S` names an
    /// unregistered component.
    pub fn view<S: ComponentSet>(&self) -> EcsResult<View> {
        View::new::<S>(self)
    }

    /// Borrows the shared value of singleton component `T`.
    ///
    /// Returns `None` if `T` is registered with another storage strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if `T` is unregistered or its store is mutably
    /// borrowed.
    pub fn singleton<T: Component>(&self) -> EcsResult<Option<Ref<'_, T>>> {
        let id = self.components.id_of::<T>()?;
        let store = self.borrow_store::<T>(id)?;
        Ok(Ref::filter_map(store, |store| {
            typed::<T>(&**store).and_then(ComponentStorage::singleton)
        })
        .ok())
    }

    /// Mutably borrows the shared value of singleton component `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if `T` is unregistered or its store is borrowed.
    pub fn singleton_mut<T: Component>(&self) -> EcsResult<Option<RefMut<'_, T>>> {
        let id = self.components.id_of::<T>()?;
        let store = self.borrow_store_mut::<T>(id)?;
        Ok(RefMut::filter_map(store, |store| {
            typed_mut::<T>(&mut **store).and_then(ComponentStorage::singleton_mut)
        })
        .ok())
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Registers a system.
    ///
    /// `build` receives a [`Binder`] on which the system declares the
    /// components it needs, and returns the system holding the binding
    /// handles. Systems run in registration order.
    ///
    /// # Errors
    ///
    /// Returns whatever `build` returns, typically
    /// [`EcsError::UnregisteredComponent`] for a declared component the
    /// world does not know. Nothing is registered in that case.
    pub fn add_system<S, F>(&mut self, build: F) -> EcsResult<SystemId>
    where
        S: System,
        F: FnOnce(&mut Binder<'_>) -> EcsResult<S>,
    {
        self.register_system(|binder| {
            let system: Box<dyn System> = Box::new(build(binder)?);
            Ok(system)
        })
    }

    /// Registers several systems in order.
    ///
    /// Each constructor returns its system boxed, so constructors of
    /// different systems can share one collection.
    ///
    /// # Errors
    ///
    /// Stops at the first failing constructor. Systems registered before it
    /// stay registered.
    pub fn add_systems<I>(&mut self, builds: I) -> EcsResult<Vec<SystemId>>
    where
        I: IntoIterator,
        I::Item: FnOnce(&mut Binder<'_>) -> EcsResult<Box<dyn System>>,
    {
        builds
            .into_iter()
            .map(|build| self.register_system(build))
            .collect()
    }

    fn register_system<F>(&mut self, build: F) -> EcsResult<SystemId>
    where
        F: FnOnce(&mut Binder<'_>) -> EcsResult<Box<dyn System>>,
    {
        // Consumed even if `build` fails.
        let id = SystemId::new(self.id, self.next_system);
        self.next_system += 1;
        let mut binder = Binder::new(&self.components, id);
        let system = build(&mut binder)?;
        let binder = SystemBinder::new(binder, system);

        tracing::debug!(
            system = binder.name(),
            required = binder.required_count(),
            optional = binder.optional_count(),
            "system registered"
        );

        self.systems.push(binder);
        Ok(id)
    }

    /// Returns the number of registered systems, including while
    /// [`World::update`] is running them.
    #[inline]
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len() + self.running
    }

    /// Runs one tick.
    ///
    /// For each system in registration order, sweeps the live entities in
    /// list order and runs the system on every entity whose mask holds all
    /// of the system's required components. Commands queued by a system are
    /// applied right after its sweep, so later systems in the same tick see
    /// their effects.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a system or by applying its
    /// commands. The rest of the tick is skipped and the failing system's
    /// queued commands are dropped.
    pub fn update(&mut self) -> EcsResult<()> {
        let mut systems = std::mem::take(&mut self.systems);
        self.running = systems.len();
        let result = self.run_systems(&mut systems);
        self.running = 0;

        // Systems registered by commands during this tick go after the
        // existing ones.
        systems.append(&mut self.systems);
        self.systems = systems;
        result
    }

    fn run_systems(&mut self, systems: &mut [SystemBinder]) -> EcsResult<()> {
        for binder in systems.iter_mut() {
            let commands = CommandBuffer::new();
            let mut cursor = self.entities.first();
            while let Some(index) = cursor {
                cursor = self.entities.next_of(index);
                if let Err(error) = binder.run_on(self, index, &commands) {
                    tracing::error!(system = binder.name(), %error, "system failed");
                    return Err(error);
                }
            }
            self.apply(commands)?;
        }
        Ok(())
    }

    /// Applies deferred commands in the order they were queued.
    ///
    /// # Errors
    ///
    /// Stops at the first failing command and returns its error.
    pub fn apply(&mut self, commands: CommandBuffer) -> EcsResult<()> {
        if !commands.is_empty() {
            tracing::trace!(count = commands.len(), "applying commands");
        }
        for command in commands.into_commands() {
            command(self)?;
        }
        Ok(())
    }

    // =========================================================================
    // Store access
    // =========================================================================

    fn borrow_store<T: Component>(&self, id: ComponentId) -> EcsResult<Ref<'_, Box<dyn AnyStore>>> {
        self.stores[id.index()]
            .try_borrow()
            .map_err(|_| EcsError::ComponentBorrowed {
                name: type_name::<T>(),
            })
    }

    fn borrow_store_mut<T: Component>(
        &self,
        id: ComponentId,
    ) -> EcsResult<RefMut<'_, Box<dyn AnyStore>>> {
        self.stores[id.index()]
            .try_borrow_mut()
            .map_err(|_| EcsError::ComponentBorrowed {
                name: type_name::<T>(),
            })
    }

    /// Borrows the value stored for `slot`.
    pub(crate) fn read_slot<T: Component>(
        &self,
        id: ComponentId,
        slot: usize,
    ) -> EcsResult<Option<Ref<'_, T>>> {
        let store = self.borrow_store::<T>(id)?;
        Ok(Ref::filter_map(store, |store| typed::<T>(&**store)?.get(slot)).ok())
    }

    /// Mutably borrows the value stored for `slot`.
    pub(crate) fn write_slot<T: Component>(
        &self,
        id: ComponentId,
        slot: usize,
    ) -> EcsResult<Option<RefMut<'_, T>>> {
        let store = self.borrow_store_mut::<T>(id)?;
        Ok(RefMut::filter_map(store, |store| typed_mut::<T>(&mut **store)?.get_mut(slot)).ok())
    }

    /// Borrows the value at a location resolved by [`World::locate`].
    pub(crate) fn read_at<T: Component>(
        &self,
        id: ComponentId,
        location: usize,
    ) -> EcsResult<Option<Ref<'_, T>>> {
        let store = self.borrow_store::<T>(id)?;
        Ok(Ref::filter_map(store, |store| typed::<T>(&**store)?.at(location)).ok())
    }

    /// Mutably borrows the value at a location resolved by [`World::locate`].
    pub(crate) fn write_at<T: Component>(
        &self,
        id: ComponentId,
        location: usize,
    ) -> EcsResult<Option<RefMut<'_, T>>> {
        let store = self.borrow_store_mut::<T>(id)?;
        Ok(RefMut::filter_map(store, |store| typed_mut::<T>(&mut **store)?.at_mut(location)).ok())
    }

    /// Resolves `slot` to a location in the store of `id`.
    pub(crate) fn locate(&self, id: ComponentId, slot: usize) -> EcsResult<Option<usize>> {
        let store = self.stores[id.index()]
            .try_borrow()
            .map_err(|_| EcsError::ComponentBorrowed {
                name: self.component_name(id),
            })?;
        Ok(store.locate_slot(slot))
    }

    /// Attaches or overwrites `value` on a live entity.
    pub(crate) fn insert_value<T: Component>(&mut self, entity: Entity, value: T) -> EcsResult<()> {
        let id = self.components.id_of::<T>()?;
        let record = self
            .entities
            .live_mut(entity)
            .ok_or(EcsError::StaleEntity(entity))?;
        let storage = typed_mut::<T>(&mut **self.stores[id.index()].get_mut()).ok_or(
            EcsError::UnregisteredComponent {
                name: type_name::<T>(),
            },
        )?;

        if record.mask.get(id.index()) {
            storage.set(entity.index(), value);
        } else {
            storage.add(entity.index(), value);
            record.mask.set(id.index());
        }
        Ok(())
    }

    /// Detaches component `id` from a live entity if present.
    pub(crate) fn remove_value(&mut self, entity: Entity, id: ComponentId) -> EcsResult<()> {
        let record = self
            .entities
            .live_mut(entity)
            .ok_or(EcsError::StaleEntity(entity))?;

        if record.mask.get(id.index()) {
            self.stores[id.index()].get_mut().remove_slot(entity.index());
            record.mask.clear(id.index());
        }
        Ok(())
    }

    fn component_name(&self, id: ComponentId) -> &'static str {
        self.components.info(id).map_or("<unknown>", |info| info.name())
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("id", &self.id)
            .field("components", &self.components.len())
            .field("entities", &self.entities.len())
            .field("systems", &self.system_count())
            .finish()
    }
}

#[inline]
fn typed<T: Component>(store: &dyn AnyStore) -> Option<&ComponentStorage<T>> {
    store.as_any().downcast_ref::<ComponentStorage<T>>()
}

#[inline]
fn typed_mut<T: Component>(store: &mut dyn AnyStore) -> Option<&mut ComponentStorage<T>> {
    store.as_any_mut().downcast_mut::<ComponentStorage<T>>()
}
