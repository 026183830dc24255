//! # World Builder
//!
//! Fixes the component schema of a world before it is created.
//!
//! Registration order decides component identifiers. The first
//! registration error is kept and reported by [`WorldBuilder::build`], so
//! registrations can be chained without checking each step.

use std::any::type_name;
use std::cell::RefCell;
use std::fmt;

use super::component::{Component, Components};
use super::storage::{AnyStore, ComponentStorage, DenseStore, SingletonStore, SparseStore, StorageKind};
use super::world::World;
use crate::config::WorldConfig;
use crate::error::{EcsError, EcsResult};

/// Creates the store of one component once capacities are known.
type StoreFactory = Box<dyn FnOnce(&WorldConfig) -> Box<dyn AnyStore>>;

/// Builder for a [`World`].
///
/// # Example
///
/// ```rust
/// use tessera_core::{Component, StorageKind, World, WorldConfig};
///
/// struct Position(f32);
/// struct Target(u32);
/// struct Gravity(f32);
/// impl Component for Position {}
/// impl Component for Target {}
/// impl Component for Gravity {}
///
/// let world = World::builder()
///     .with_dense::<Position>()
///     .with_component::<Target>(StorageKind::Sparse)
///     .with_singleton(Gravity(-9.8))
///     .with_config(WorldConfig::default().with_entity_capacity(1024))
///     .build_with_config()?;
///
/// assert_eq!(world.component_count(), 3);
/// assert_eq!(world.storage_kind::<Gravity>()?, StorageKind::Singleton);
/// # Ok::<(), tessera_core::EcsError>(())
/// ```
pub struct WorldBuilder {
    components: Components,
    factories: Vec<StoreFactory>,
    config: WorldConfig,
    error: Option<EcsError>,
}

impl WorldBuilder {
    /// Creates a builder with no components and the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            components: Components::default(),
            factories: Vec::new(),
            config: WorldConfig::default(),
            error: None,
        }
    }

    /// Registers `T` with dense-indexed storage.
    #[must_use]
    pub fn with_dense<T: Component>(self) -> Self {
        self.register::<T>(
            StorageKind::Dense,
            Box::new(|config: &WorldConfig| -> Box<dyn AnyStore> {
                Box::new(ComponentStorage::Dense(DenseStore::<T>::new(
                    config.entity_capacity,
                )))
            }),
        )
    }

    /// Registers `T` with sparse-indirected storage.
    #[must_use]
    pub fn with_sparse<T: Component>(self) -> Self {
        self.register::<T>(
            StorageKind::Sparse,
            Box::new(|config: &WorldConfig| -> Box<dyn AnyStore> {
                Box::new(ComponentStorage::Sparse(SparseStore::<T>::with_capacity(
                    config.sparse_capacity,
                )))
            }),
        )
    }

    /// Registers `T` as a singleton whose shared value is `value`.
    ///
    /// Values supplied later when entities attach `T` are discarded.
    #[must_use]
    pub fn with_singleton<T: Component>(self, value: T) -> Self {
        self.register::<T>(
            StorageKind::Singleton,
            Box::new(move |config: &WorldConfig| -> Box<dyn AnyStore> {
                Box::new(ComponentStorage::Singleton(SingletonStore::new(
                    value,
                    config.entity_capacity,
                )))
            }),
        )
    }

    /// Registers `T` with the given storage strategy.
    ///
    /// Singleton storage needs a value: use [`WorldBuilder::with_singleton`].
    /// Asking for it here makes [`WorldBuilder::build`] fail with
    /// [`EcsError::SingletonWithoutValue`].
    #[must_use]
    pub fn with_component<T: Component>(self, kind: StorageKind) -> Self {
        match kind {
            StorageKind::Dense => self.with_dense::<T>(),
            StorageKind::Sparse => self.with_sparse::<T>(),
            StorageKind::Singleton => self.fail(EcsError::SingletonWithoutValue {
                name: type_name::<T>(),
            }),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: WorldConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration the world will be built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Builds the world with room for `capacity` entities.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn build(self, capacity: usize) -> EcsResult<World> {
        let config = self.config.with_entity_capacity(capacity);
        self.finish(config)
    }

    /// Builds the world with the configured capacities.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn build_with_config(self) -> EcsResult<World> {
        let config = self.config;
        self.finish(config)
    }

    fn finish(self, config: WorldConfig) -> EcsResult<World> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let stores = self
            .factories
            .into_iter()
            .map(|factory| RefCell::new(factory(&config)))
            .collect();

        tracing::debug!(
            components = self.components.len(),
            capacity = config.entity_capacity,
            "world built"
        );

        Ok(World::from_parts(
            self.components,
            stores,
            config.entity_capacity,
            config.system_capacity,
        ))
    }

    fn register<T: Component>(mut self, kind: StorageKind, factory: StoreFactory) -> Self {
        if self.error.is_some() {
            return self;
        }

        match self.components.register::<T>(kind) {
            Ok(id) => {
                tracing::debug!(
                    component = type_name::<T>(),
                    id = id.index(),
                    ?kind,
                    "component registered"
                );
                self.factories.push(factory);
                self
            }
            Err(error) => self.fail(error),
        }
    }

    fn fail(mut self, error: EcsError) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WorldBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldBuilder")
            .field("components", &self.components)
            .field("config", &self.config)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;
    #[derive(Debug, PartialEq)]
    struct Clock(u32);

    impl Component for A {}
    impl Component for B {}
    impl Component for Clock {}

    #[test]
    fn test_ids_follow_registration_order() {
        let world = WorldBuilder::new()
            .with_sparse::<B>()
            .with_dense::<A>()
            .build(4)
            .unwrap();

        assert_eq!(world.component_id::<B>().unwrap().index(), 0);
        assert_eq!(world.component_id::<A>().unwrap().index(), 1);
        assert_eq!(world.storage_kind::<A>().unwrap(), StorageKind::Dense);
    }

    #[test]
    fn test_duplicate_reported_at_build() {
        let err = WorldBuilder::new()
            .with_dense::<A>()
            .with_sparse::<A>()
            .with_component::<B>(StorageKind::Singleton)
            .build(4)
            .unwrap_err();

        // First error wins.
        assert!(matches!(err, EcsError::DuplicateComponent { .. }));
    }

    #[test]
    fn test_singleton_requires_value() {
        let err = WorldBuilder::new()
            .with_component::<Clock>(StorageKind::Singleton)
            .build(4)
            .unwrap_err();
        assert!(matches!(err, EcsError::SingletonWithoutValue { .. }));
    }

    #[test]
    fn test_singleton_value_installed() {
        let world = WorldBuilder::new().with_singleton(Clock(12)).build(4).unwrap();
        assert_eq!(*world.singleton::<Clock>().unwrap().unwrap(), Clock(12));
    }

    #[test]
    fn test_empty_schema_allowed() {
        let mut world = WorldBuilder::new().build(0).unwrap();
        let entity = world.new_entity();
        assert_eq!(world.component_count(), 0);
        assert_eq!(world.entity(entity).unwrap().mask().width(), 64);
    }

    #[test]
    fn test_config_capacities_used() {
        let config = WorldConfig::from_toml_str("entity_capacity = 32").unwrap();
        let builder = WorldBuilder::new().with_dense::<A>().with_config(config);
        assert_eq!(builder.config().entity_capacity, 32);

        let mut world = builder.build_with_config().unwrap();
        for _ in 0..40 {
            world.add_entity(A).unwrap();
        }
        assert_eq!(world.len(), 40);
    }
}
