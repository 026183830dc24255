//! # Entity Component System
//!
//! A bitmask ECS with a per-component choice of storage.
//!
//! ## Design
//!
//! - Every entity carries a bitmask of the components it holds
//! - Each component type picks dense, sparse or singleton storage at build time
//! - Entity handles are slot indices with generation counters
//! - Systems and views match entities by mask superset, in insertion order
//! - Structural changes during a sweep go through a command buffer

mod access;
mod builder;
mod commands;
mod component;
mod entity;
mod mask;
mod storage;
mod system;
mod view;
mod world;

pub use access::{Bundle, ComponentSet, EntityMut, EntityRef, Fetched};
pub use builder::WorldBuilder;
pub use commands::CommandBuffer;
pub use component::{Component, ComponentId, ComponentInfo, Components};
pub use entity::Entity;
pub use mask::{Mask, Ones};
pub use storage::{
    AnyStore, ComponentStorage, DenseStore, SingletonStore, SparseStore, StorageKind, Store,
};
pub use system::{Binder, Binding, Optional, Required, System, SystemContext, SystemId};
pub use view::View;
pub use world::World;
