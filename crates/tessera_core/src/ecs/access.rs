//! # Entity Access
//!
//! Borrowed accessors over a single entity and the type-level lists used to
//! read, attach and detach several components at once.
//!
//! - [`EntityRef`] reads and mutates values in place through `&World`.
//! - [`EntityMut`] changes what the entity holds through `&mut World`.
//! - [`ComponentSet`] names a list of component types: `T` or `(A, B, ..)`.
//! - [`Bundle`] carries a list of component values: `t` or `(a, b, ..)`.

use std::any::type_name;
use std::cell::{Ref, RefMut};

use super::component::{Component, Components};
use super::entity::Entity;
use super::mask::Mask;
use super::world::World;
use crate::error::{EcsError, EcsResult};

/// Read accessor for a live entity.
///
/// Values are borrowed from their stores on demand. Borrows of different
/// component types never conflict; borrowing the same type mutably twice
/// fails with [`EcsError::ComponentBorrowed`].
#[derive(Clone, Copy)]
pub struct EntityRef<'w> {
    world: &'w World,
    entity: Entity,
    mask: &'w Mask,
}

impl<'w> EntityRef<'w> {
    pub(crate) fn new(world: &'w World, entity: Entity, mask: &'w Mask) -> Self {
        Self {
            world,
            entity,
            mask,
        }
    }

    /// Returns the entity handle.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// Returns the set of components the entity holds.
    #[inline]
    #[must_use]
    pub fn mask(&self) -> &'w Mask {
        self.mask
    }

    /// Checks whether the entity holds component `T`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `T` is not registered.
    pub fn has<T: Component>(&self) -> EcsResult<bool> {
        let id = self.world.component_id::<T>()?;
        Ok(self.mask.get(id.index()))
    }

    /// Borrows component `T`, or `None` if the entity does not hold it.
    ///
    /// # Errors
    ///
    /// Returns an error if `T` is unregistered or its store is mutably
    /// borrowed.
    pub fn get<T: Component>(&self) -> EcsResult<Option<Ref<'w, T>>> {
        let id = self.world.component_id::<T>()?;
        if !self.mask.get(id.index()) {
            return Ok(None);
        }

        let value = self.world.read_slot::<T>(id, self.entity.index())?;
        debug_assert!(value.is_some(), "mask and store disagree for {}", type_name::<T>());
        Ok(value)
    }

    /// Mutably borrows component `T`, or `None` if the entity does not hold
    /// it.
    ///
    /// Writes go straight to the store and are seen by every later reader.
    ///
    /// # Errors
    ///
    /// Returns an error if `T` is unregistered or its store is borrowed.
    pub fn get_mut<T: Component>(&self) -> EcsResult<Option<RefMut<'w, T>>> {
        let id = self.world.component_id::<T>()?;
        if !self.mask.get(id.index()) {
            return Ok(None);
        }

        let value = self.world.write_slot::<T>(id, self.entity.index())?;
        debug_assert!(value.is_some(), "mask and store disagree for {}", type_name::<T>());
        Ok(value)
    }

    /// Fetches several components at once.
    ///
    /// Each requested component comes back as `Some` if held and `None`
    /// otherwise. [`Fetched::all_present`] reports whether every one was
    /// held.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tessera_core::{Component, World};
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
    /// let entity = world.add_entity(Position(2.0))?;
    ///
    /// let fetched = world.entity(entity)?.fetch::<(Position, Velocity)>()?;
    /// assert!(!fetched.all_present());
    /// let (position, velocity) = fetched.into_inner();
    /// assert_eq!(position.map(|p| p.0), Some(2.0));
    /// assert!(velocity.is_none());
    /// # Ok::<(), tessera_core::EcsError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if any type is unregistered or already borrowed.
    pub fn fetch<S: ComponentSet>(&self) -> EcsResult<Fetched<S::Refs<'w>>> {
        let (all_present, refs) = S::fetch(self)?;
        Ok(Fetched { all_present, refs })
    }
}

impl std::fmt::Debug for EntityRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRef")
            .field("entity", &self.entity)
            .field("mask", self.mask)
            .finish()
    }
}

/// Structural accessor for a live entity.
///
/// Holds the world exclusively, so attaching and detaching never needs a
/// runtime borrow check.
#[derive(Debug)]
pub struct EntityMut<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl<'w> EntityMut<'w> {
    /// The caller guarantees `entity` is live.
    pub(crate) fn new(world: &'w mut World, entity: Entity) -> Self {
        Self { world, entity }
    }

    /// Returns the entity handle.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// Returns a read accessor for the same entity.
    #[must_use]
    pub fn as_entity_ref(&self) -> EntityRef<'_> {
        self.world.entity_at(self.entity.index())
    }

    /// Checks whether the entity holds component `T`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `T` is not registered.
    pub fn has<T: Component>(&self) -> EcsResult<bool> {
        self.as_entity_ref().has::<T>()
    }

    /// Borrows component `T`. See [`EntityRef::get`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `T` is not registered.
    pub fn get<T: Component>(&self) -> EcsResult<Option<Ref<'_, T>>> {
        self.as_entity_ref().get::<T>()
    }

    /// Mutably borrows component `T`. See [`EntityRef::get_mut`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `T` is not registered.
    pub fn get_mut<T: Component>(&mut self) -> EcsResult<Option<RefMut<'_, T>>> {
        self.as_entity_ref().get_mut::<T>()
    }

    /// Attaches `value`, or overwrites it in place if already held.
    ///
    /// For a singleton component the shared value is left untouched and only
    /// the holding is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `T` is not registered.
    pub fn insert<T: Component>(&mut self, value: T) -> EcsResult<&mut Self> {
        self.world.insert_value(self.entity, value)?;
        Ok(self)
    }

    /// Attaches or overwrites every value in `bundle`, in order.
    ///
    /// # Errors
    ///
    /// Returns the first error. Values before it stay attached.
    pub fn set<B: Bundle>(&mut self, bundle: B) -> EcsResult<&mut Self> {
        bundle.apply(self)?;
        Ok(self)
    }

    /// Detaches every component in `S` the entity holds.
    ///
    /// Components the entity does not hold are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] if `S` names an
    /// unregistered component.
    pub fn rem<S: ComponentSet>(&mut self) -> EcsResult<&mut Self> {
        S::detach(self)?;
        Ok(self)
    }

    /// Removes the entity from the world.
    ///
    /// # Errors
    ///
    /// Never fails for an accessor obtained from [`World::entity_mut`].
    pub fn despawn(self) -> EcsResult<()> {
        self.world.remove_entity(self.entity)
    }

    fn detach<T: Component>(&mut self) -> EcsResult<()> {
        let id = self.world.component_id::<T>()?;
        self.world.remove_value(self.entity, id)
    }
}

/// Result of [`EntityRef::fetch`].
#[derive(Debug)]
pub struct Fetched<R> {
    all_present: bool,
    refs: R,
}

impl<R> Fetched<R> {
    /// Returns `true` if every requested component was held.
    #[inline]
    #[must_use]
    pub fn all_present(&self) -> bool {
        self.all_present
    }

    /// Returns the fetched borrows.
    #[inline]
    #[must_use]
    pub fn refs(&self) -> &R {
        &self.refs
    }

    /// Returns the fetched borrows mutably.
    #[inline]
    pub fn refs_mut(&mut self) -> &mut R {
        &mut self.refs
    }

    /// Consumes the result, yielding the borrows.
    #[inline]
    pub fn into_inner(self) -> R {
        self.refs
    }

    /// Consumes the result, yielding the presence flag and the borrows.
    #[inline]
    pub fn into_parts(self) -> (bool, R) {
        (self.all_present, self.refs)
    }
}

/// A list of component types: a single `T` or a tuple of up to eight.
pub trait ComponentSet: 'static {
    /// Borrows produced by [`EntityRef::fetch`] for this list.
    type Refs<'w>;

    /// Sets the bit of every listed component in `mask`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] for an unknown type.
    fn collect(components: &Components, mask: &mut Mask) -> EcsResult<()>;

    /// Borrows every listed component, reporting whether all were held.
    ///
    /// # Errors
    ///
    /// Returns an error if a type is unregistered or already borrowed.
    fn fetch<'w>(entity: &EntityRef<'w>) -> EcsResult<(bool, Self::Refs<'w>)>;

    /// Detaches every listed component the entity holds.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] for an unknown type.
    fn detach(entity: &mut EntityMut<'_>) -> EcsResult<()>;
}

impl<T: Component> ComponentSet for T {
    type Refs<'w> = Option<RefMut<'w, T>>;

    fn collect(components: &Components, mask: &mut Mask) -> EcsResult<()> {
        mask.set(components.id_of::<T>()?.index());
        Ok(())
    }

    fn fetch<'w>(entity: &EntityRef<'w>) -> EcsResult<(bool, Self::Refs<'w>)> {
        let value = entity.get_mut::<T>()?;
        Ok((value.is_some(), value))
    }

    fn detach(entity: &mut EntityMut<'_>) -> EcsResult<()> {
        entity.detach::<T>()
    }
}

impl ComponentSet for () {
    type Refs<'w> = ();

    fn collect(_components: &Components, _mask: &mut Mask) -> EcsResult<()> {
        Ok(())
    }

    fn fetch<'w>(_entity: &EntityRef<'w>) -> EcsResult<(bool, Self::Refs<'w>)> {
        Ok((true, ()))
    }

    fn detach(_entity: &mut EntityMut<'_>) -> EcsResult<()> {
        Ok(())
    }
}

/// A list of component values: a single value or a tuple of up to eight.
pub trait Bundle: 'static {
    /// Attaches or overwrites every value on `entity`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponent`] for an unknown type.
    fn apply(self, entity: &mut EntityMut<'_>) -> EcsResult<()>;
}

impl<T: Component> Bundle for T {
    fn apply(self, entity: &mut EntityMut<'_>) -> EcsResult<()> {
        entity.insert(self).map(|_| ())
    }
}

impl Bundle for () {
    fn apply(self, _entity: &mut EntityMut<'_>) -> EcsResult<()> {
        Ok(())
    }
}

macro_rules! impl_tuples {
    ($($name:ident),+) => {
        impl<$($name: ComponentSet),+> ComponentSet for ($($name,)+) {
            type Refs<'w> = ($(<$name as ComponentSet>::Refs<'w>,)+);

            fn collect(components: &Components, mask: &mut Mask) -> EcsResult<()> {
                $($name::collect(components, mask)?;)+
                Ok(())
            }

            #[allow(non_snake_case)]
            fn fetch<'w>(entity: &EntityRef<'w>) -> EcsResult<(bool, Self::Refs<'w>)> {
                let mut all_present = true;
                $(
                    let (present, $name) = $name::fetch(entity)?;
                    all_present &= present;
                )+
                Ok((all_present, ($($name,)+)))
            }

            fn detach(entity: &mut EntityMut<'_>) -> EcsResult<()> {
                $($name::detach(entity)?;)+
                Ok(())
            }
        }

        impl<$($name: Bundle),+> Bundle for ($($name,)+) {
            #[allow(non_snake_case)]
            fn apply(self, entity: &mut EntityMut<'_>) -> EcsResult<()> {
                let ($($name,)+) = self;
                $($name.apply(entity)?;)+
                Ok(())
            }
        }
    };
}

impl_tuples!(A);
impl_tuples!(A, B);
impl_tuples!(A, B, C);
impl_tuples!(A, B, C, D);
impl_tuples!(A, B, C, D, E);
impl_tuples!(A, B, C, D, E, F);
impl_tuples!(A, B, C, D, E, F, G);
impl_tuples!(A, B, C, D, E, F, G, H);

/// Builds the mask for component list `S`.
pub(crate) fn mask_of<S: ComponentSet>(components: &Components) -> EcsResult<Mask> {
    let mut mask = components.new_mask();
    S::collect(components, &mut mask)?;
    Ok(mask)
}

/// Resolves `name` for a missing-component report.
pub(crate) fn missing<T: Component>(entity: Entity) -> EcsError {
    EcsError::MissingComponent {
        entity,
        name: type_name::<T>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct C1(i32);
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct C2(i32);
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct C3(i32);
    struct Unknown;

    impl Component for C1 {}
    impl Component for C2 {}
    impl Component for C3 {}
    impl Component for Unknown {}

    fn world() -> World {
        World::builder()
            .with_dense::<C1>()
            .with_dense::<C2>()
            .with_sparse::<C3>()
            .build(4)
            .unwrap()
    }

    #[test]
    fn test_fetch_reports_presence() {
        let mut world = world();
        let e1 = world.add_entity((C1(1), C2(2))).unwrap();
        let e2 = world.add_entity(C1(3)).unwrap();

        let (all, (c1, c2)) = world.entity(e1).unwrap().fetch::<(C1, C2)>().unwrap().into_parts();
        assert!(all);
        assert_eq!(c1.as_deref(), Some(&C1(1)));
        assert_eq!(c2.as_deref(), Some(&C2(2)));
        drop((c1, c2));

        let fetched = world.entity(e2).unwrap().fetch::<(C1, C2)>().unwrap();
        assert!(!fetched.all_present());
        assert_eq!(fetched.refs().0.as_deref(), Some(&C1(3)));
        assert!(fetched.refs().1.is_none());
    }

    #[test]
    fn test_set_overwrites_and_rem_clears_bits() {
        let mut world = world();
        let entity = world.add_entity((C1(1), C3(5))).unwrap();

        let mut access = world.entity_mut(entity).unwrap();
        access.set((C1(10), C2(20))).unwrap();
        assert_eq!(*access.get::<C1>().unwrap().unwrap(), C1(10));
        assert!(access.has::<C2>().unwrap());

        access.rem::<(C2, C3)>().unwrap();
        assert!(!access.has::<C2>().unwrap());
        assert!(!access.has::<C3>().unwrap());
        assert_eq!(access.as_entity_ref().mask().count(), 1);

        // Absent components are skipped.
        access.rem::<C2>().unwrap();
    }

    #[test]
    fn test_get_mut_writes_through() {
        let mut world = world();
        let entity = world.add_entity(C3(1)).unwrap();
        let view = world.entity(entity).unwrap();

        view.get_mut::<C3>().unwrap().unwrap().0 += 41;
        assert_eq!(*view.get::<C3>().unwrap().unwrap(), C3(42));
    }

    #[test]
    fn test_disjoint_mutable_borrows() {
        let mut world = world();
        let entity = world.add_entity((C1(1), C2(2))).unwrap();
        let view = world.entity(entity).unwrap();

        let mut c1 = view.get_mut::<C1>().unwrap().unwrap();
        let mut c2 = view.get_mut::<C2>().unwrap().unwrap();
        std::mem::swap(&mut c1.0, &mut c2.0);
        drop((c1, c2));

        assert_eq!(view.get::<C1>().unwrap().unwrap().0, 2);
        assert!(matches!(
            view.fetch::<(C1, C1)>().unwrap_err(),
            EcsError::ComponentBorrowed { .. }
        ));
    }

    #[test]
    fn test_unregistered_type_rejected() {
        let mut world = world();
        let entity = world.new_entity();
        let view = world.entity(entity).unwrap();
        assert!(view.has::<Unknown>().is_err());
        assert!(view.get::<Unknown>().is_err());

        let err = world.entity_mut(entity).unwrap().insert(Unknown).unwrap_err();
        assert!(matches!(err, EcsError::UnregisteredComponent { .. }));
    }

    #[test]
    fn test_mask_of_sets_listed_bits() {
        let world = world();
        let mask = mask_of::<(C1, C3)>(world.components()).unwrap();
        assert_eq!(mask.iter_ones().collect::<Vec<_>>(), vec![0, 2]);
        assert!(mask_of::<()>(world.components()).unwrap().is_empty());
    }
}
