//! # TESSERA Core Engine
//!
//! Entity Component System (ECS) with pluggable per-component storage:
//! - Dense storage indexed by entity slot for common components
//! - Sparse storage with memory proportional to holders for rare ones
//! - Singleton storage sharing one value across every holder
//!
//! ## Architecture Rules
//!
//! 1. **Schema fixed at build** - Components are registered on a builder
//! 2. **Masks decide membership** - Systems and views test bitmask supersets
//! 3. **No structural change mid-sweep** - Sweeps borrow the world shared
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{Component, World};
//!
//! struct Position(f32);
//! struct Velocity(f32);
//! impl Component for Position {}
//! impl Component for Velocity {}
//!
//! let mut world = World::builder()
//!     .with_dense::<Position>()
//!     .with_sparse::<Velocity>()
//!     .build(1024)?;
//!
//! let entity = world.add_entity((Position(0.0), Velocity(2.0)))?;
//! assert!(world.entity(entity)?.fetch::<(Position, Velocity)>()?.all_present());
//! # Ok::<(), tessera_core::EcsError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;

pub use config::WorldConfig;
pub use ecs::{
    AnyStore, Binder, Binding, Bundle, CommandBuffer, Component, ComponentId, ComponentSet,
    ComponentStorage, DenseStore, Entity, EntityMut, EntityRef, Fetched, Mask, Optional,
    Required, SingletonStore, SparseStore, StorageKind, Store, System, SystemContext, SystemId,
    View, World, WorldBuilder,
};
pub use error::{EcsError, EcsResult};
pub use memory::IndexPool;
