//! # Systems
//!
//! A system is a routine run once per matching entity per tick.
//!
//! Systems declare their components up front on a [`Binder`], which hands
//! back typed binding handles:
//!
//! ```rust
//! use tessera_core::{Binder, Component, EcsResult, Optional, Required, System, SystemContext, World};
//!
//! struct Position(f32);
//! struct Drag(f32);
//! impl Component for Position {}
//! impl Component for Drag {}
//!
//! struct Slowdown {
//!     position: Required<Position>,
//!     drag: Optional<Drag>,
//! }
//!
//! impl System for Slowdown {
//!     fn run(&mut self, ctx: &SystemContext<'_>) -> EcsResult<()> {
//!         let factor = ctx.read(self.drag)?.map_or(1.0, |drag| drag.0);
//!         ctx.get(self.position)?.0 *= factor;
//!         Ok(())
//!     }
//! }
//!
//! let mut world = World::builder()
//!     .with_dense::<Position>()
//!     .with_sparse::<Drag>()
//!     .build(16)?;
//! world.add_system(|b: &mut Binder<'_>| {
//!     Ok(Slowdown { position: b.required()?, drag: b.optional()? })
//! })?;
//!
//! let entity = world.add_entity((Position(10.0), Drag(0.5)))?;
//! world.update()?;
//! assert_eq!(world.entity(entity)?.get::<Position>()?.map(|p| p.0), Some(5.0));
//! # Ok::<(), tessera_core::EcsError>(())
//! ```
//!
//! A system runs on an entity only if the entity holds every `required`
//! component. `optional` components resolve to `None` when absent.

use std::any::type_name;
use std::cell::{Ref, RefMut};
use std::fmt;
use std::marker::PhantomData;

use super::access::{missing, EntityRef};
use super::commands::CommandBuffer;
use super::component::{Component, ComponentId, Components};
use super::mask::Mask;
use super::world::{World, WorldId};
use crate::error::{EcsError, EcsResult};

/// Identifier of a registered system.
///
/// Unique per world and per registration attempt: a failed registration
/// still consumes its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId {
    world: WorldId,
    index: usize,
}

impl SystemId {
    pub(crate) const fn new(world: WorldId, index: usize) -> Self {
        Self { world, index }
    }

    /// Returns the registration index within its world.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

/// A per-entity routine driven by [`World::update`].
pub trait System: 'static {
    /// Runs on one matching entity.
    ///
    /// # Errors
    ///
    /// Any error aborts the current tick.
    fn run(&mut self, ctx: &SystemContext<'_>) -> EcsResult<()>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl<F> System for F
where
    F: FnMut(&SystemContext<'_>) -> EcsResult<()> + 'static,
{
    fn run(&mut self, ctx: &SystemContext<'_>) -> EcsResult<()> {
        self(ctx)
    }
}

/// Handle to a component every visited entity is guaranteed to hold.
pub struct Required<T> {
    slot: usize,
    component: ComponentId,
    system: SystemId,
    _marker: PhantomData<fn() -> T>,
}

/// Handle to a component a visited entity may or may not hold.
pub struct Optional<T> {
    slot: usize,
    component: ComponentId,
    system: SystemId,
    _marker: PhantomData<fn() -> T>,
}

macro_rules! impl_handle {
    ($handle:ident) => {
        impl<T> Clone for $handle<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $handle<T> {}

        impl<T> fmt::Debug for $handle<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($handle))
                    .field("component", &type_name::<T>())
                    .field("slot", &self.slot)
                    .field("system", &self.system)
                    .finish()
            }
        }

        impl<T> $handle<T> {
            const fn new(slot: usize, component: ComponentId, system: SystemId) -> Self {
                Self {
                    slot,
                    component,
                    system,
                    _marker: PhantomData,
                }
            }

            /// Returns the identifier of the bound component.
            #[inline]
            #[must_use]
            pub const fn component(&self) -> ComponentId {
                self.component
            }
        }
    };
}

impl_handle!(Required);
impl_handle!(Optional);

#[derive(Debug, Clone, Copy)]
struct BoundSlot {
    component: ComponentId,
    required: bool,
}

/// Declaration list of a system, filled in at registration.
pub struct Binder<'w> {
    components: &'w Components,
    system: SystemId,
    required: Mask,
    slots: Vec<BoundSlot>,
}

impl<'w> Binder<'w> {
    pub(crate) fn new(components: &'w Components, system: SystemId) -> Self {
        Self {
            components,
            system,
            required: components.new_mask(),
            slots: Vec::new(),
        }
    }

    /// Declares a component the system needs on every entity it visits.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `T` is not registered.
    pub fn required<T: Component>(&mut self) -> EcsResult<Required<T>> {
        let component = self.bind::<T>(true)?;
        self.required.set(component.index());
        Ok(Required::new(self.slots.len() - 1, component, self.system))
    }

    /// Declares a component the system reads when present.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `T` is not registered.
    pub fn optional<T: Component>(&mut self) -> EcsResult<Optional<T>> {
        let component = self.bind::<T>(false)?;
        Ok(Optional::new(self.slots.len() - 1, component, self.system))
    }

    /// Returns the identifier the system will be registered under.
    #[inline]
    #[must_use]
    pub fn system_id(&self) -> SystemId {
        self.system
    }

    fn bind<T: Component>(&mut self, required: bool) -> EcsResult<ComponentId> {
        let component = self.components.id_of::<T>()?;
        self.slots.push(BoundSlot {
            component,
            required,
        });
        Ok(component)
    }
}

/// A registered system with its resolved declarations.
pub(crate) struct SystemBinder {
    id: SystemId,
    system: Box<dyn System>,
    required: Mask,
    slots: Vec<BoundSlot>,
    /// Store location of each bound slot for the entity being visited.
    locations: Vec<Option<usize>>,
}

impl SystemBinder {
    pub fn new(binder: Binder<'_>, system: Box<dyn System>) -> Self {
        let locations = vec![None; binder.slots.len()];
        Self {
            id: binder.system,
            system,
            required: binder.required,
            slots: binder.slots,
            locations,
        }
    }

    pub fn name(&self) -> &'static str {
        self.system.name()
    }

    pub fn required_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.required).count()
    }

    pub fn optional_count(&self) -> usize {
        self.slots.len() - self.required_count()
    }

    /// Runs the system on slot `index` if it holds every required component.
    ///
    /// Returns whether the system ran.
    pub fn run_on(&mut self, world: &World, index: usize, commands: &CommandBuffer) -> EcsResult<bool> {
        let mask = &world.entities.record(index).mask;
        if !mask.contains(&self.required) {
            return Ok(false);
        }

        for (slot, location) in self.slots.iter().zip(self.locations.iter_mut()) {
            *location = if mask.get(slot.component.index()) {
                world.locate(slot.component, index)?
            } else {
                None
            };
            debug_assert!(
                !slot.required || location.is_some(),
                "required component {:?} unresolved",
                slot.component
            );
        }

        let ctx = SystemContext {
            world,
            entity: world.entity_at(index),
            system: self.id,
            slots: &self.slots,
            locations: &self.locations,
            commands,
        };
        self.system.run(&ctx)?;
        Ok(true)
    }
}

/// What a system sees while running on one entity.
pub struct SystemContext<'a> {
    world: &'a World,
    entity: EntityRef<'a>,
    system: SystemId,
    slots: &'a [BoundSlot],
    locations: &'a [Option<usize>],
    commands: &'a CommandBuffer,
}

impl<'a> SystemContext<'a> {
    /// Mutably borrows a bound component.
    ///
    /// Yields `RefMut<T>` for a [`Required`] binding and `Option<RefMut<T>>`
    /// for an [`Optional`] one.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ForeignBinding`] for a handle declared by another
    /// system and [`EcsError::ComponentBorrowed`] if the value is already
    /// borrowed.
    pub fn get<B: Binding>(&self, binding: B) -> EcsResult<B::Write<'a>> {
        binding.write(self)
    }

    /// Borrows a bound component. See [`SystemContext::get`].
    ///
    /// # Errors
    ///
    /// Same as [`SystemContext::get`].
    pub fn read<B: Binding>(&self, binding: B) -> EcsResult<B::Read<'a>> {
        binding.read(self)
    }

    /// Returns the entity being visited.
    #[inline]
    #[must_use]
    pub fn entity(&self) -> EntityRef<'a> {
        self.entity
    }

    /// Returns the world, for reads beyond the declared bindings.
    #[inline]
    #[must_use]
    pub fn world(&self) -> &'a World {
        self.world
    }

    /// Returns the buffer for structural changes.
    ///
    /// Commands are applied after this system has visited every entity.
    #[inline]
    #[must_use]
    pub fn commands(&self) -> &'a CommandBuffer {
        self.commands
    }

    /// Resolves a handle's slot to a store location for the visited entity.
    ///
    /// The handle must come from this system and name the component bound
    /// at its slot.
    fn location<T>(&self, system: SystemId, slot: usize, component: ComponentId) -> EcsResult<Option<usize>> {
        let bound = self.slots.get(slot).map(|bound| bound.component);
        if system != self.system || bound != Some(component) {
            return Err(EcsError::ForeignBinding {
                name: type_name::<T>(),
            });
        }
        Ok(self.locations.get(slot).copied().flatten())
    }
}

impl fmt::Debug for SystemContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemContext")
            .field("system", &self.system)
            .field("entity", &self.entity.id())
            .finish_non_exhaustive()
    }
}

/// A binding handle resolvable through a [`SystemContext`].
pub trait Binding: Copy {
    /// Shared borrow produced by [`SystemContext::read`].
    type Read<'a>;
    /// Mutable borrow produced by [`SystemContext::get`].
    type Write<'a>;

    /// Borrows the bound value.
    ///
    /// # Errors
    ///
    /// See [`SystemContext::read`].
    fn read<'a>(self, ctx: &SystemContext<'a>) -> EcsResult<Self::Read<'a>>;

    /// Mutably borrows the bound value.
    ///
    /// # Errors
    ///
    /// See [`SystemContext::get`].
    fn write<'a>(self, ctx: &SystemContext<'a>) -> EcsResult<Self::Write<'a>>;
}

impl<T: Component> Binding for Required<T> {
    type Read<'a> = Ref<'a, T>;
    type Write<'a> = RefMut<'a, T>;

    fn read<'a>(self, ctx: &SystemContext<'a>) -> EcsResult<Self::Read<'a>> {
        let entity = ctx.entity.id();
        let location = ctx
            .location::<T>(self.system, self.slot, self.component)?
            .ok_or_else(|| missing::<T>(entity))?;
        ctx.world
            .read_at::<T>(self.component, location)?
            .ok_or_else(|| missing::<T>(entity))
    }

    fn write<'a>(self, ctx: &SystemContext<'a>) -> EcsResult<Self::Write<'a>> {
        let entity = ctx.entity.id();
        let location = ctx
            .location::<T>(self.system, self.slot, self.component)?
            .ok_or_else(|| missing::<T>(entity))?;
        ctx.world
            .write_at::<T>(self.component, location)?
            .ok_or_else(|| missing::<T>(entity))
    }
}

impl<T: Component> Binding for Optional<T> {
    type Read<'a> = Option<Ref<'a, T>>;
    type Write<'a> = Option<RefMut<'a, T>>;

    fn read<'a>(self, ctx: &SystemContext<'a>) -> EcsResult<Self::Read<'a>> {
        match ctx.location::<T>(self.system, self.slot, self.component)? {
            Some(location) => ctx.world.read_at::<T>(self.component, location),
            None => Ok(None),
        }
    }

    fn write<'a>(self, ctx: &SystemContext<'a>) -> EcsResult<Self::Write<'a>> {
        match ctx.location::<T>(self.system, self.slot, self.component)? {
            Some(location) => ctx.world.write_at::<T>(self.component, location),
            None => Ok(None),
        }
    }
}
