//! # ECS Error Types
//!
//! Programmer and schema errors surfaced by the world, builder and binders.
//!
//! Expected absence (an entity simply not holding a component) is never an
//! error: it is reported as `None` or through [`Fetched::all_present`].
//!
//! [`Fetched::all_present`]: crate::ecs::Fetched::all_present

use thiserror::Error;

use crate::ecs::Entity;

/// Errors that can occur while building or driving a world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A component type was used that the world was not built with.
    #[error("component not registered: {name}")]
    UnregisteredComponent {
        /// Type name of the component.
        name: &'static str,
    },

    /// The same component type was registered twice on a builder.
    #[error("component already registered: {name}")]
    DuplicateComponent {
        /// Type name of the component.
        name: &'static str,
    },

    /// Singleton storage was requested without an authoritative value.
    #[error("singleton component {name} must be registered with a value")]
    SingletonWithoutValue {
        /// Type name of the component.
        name: &'static str,
    },

    /// The entity handle is null or was removed from the world.
    #[error("stale entity handle: {0:?}")]
    StaleEntity(Entity),

    /// The component store is already borrowed in a conflicting way.
    #[error("component store already borrowed: {name}")]
    ComponentBorrowed {
        /// Type name of the component.
        name: &'static str,
    },

    /// A binding handle was used with a system it was not declared on.
    #[error("binding for {name} does not belong to this system")]
    ForeignBinding {
        /// Type name of the component.
        name: &'static str,
    },

    /// A required component disappeared from an entity the system matched.
    #[error("{entity:?} no longer holds required component {name}")]
    MissingComponent {
        /// The entity being visited.
        entity: Entity,
        /// Type name of the component.
        name: &'static str,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_component() {
        let err = EcsError::UnregisteredComponent { name: "Position" };
        assert_eq!(err.to_string(), "component not registered: Position");

        let err = EcsError::StaleEntity(Entity::new(3, 1));
        assert_eq!(err.to_string(), "stale entity handle: Entity(3v1)");
    }
}
