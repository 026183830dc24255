//! # World Configuration
//!
//! Capacity hints for a world, loaded once at startup.
//!
//! ```toml
//! entity_capacity = 4096
//! system_capacity = 16
//! sparse_capacity = 256
//! ```
//!
//! Every key is optional; missing keys keep their [`Default`] value.

use serde::Deserialize;

use crate::error::{EcsError, EcsResult};

/// Capacity hints applied by [`WorldBuilder`](crate::ecs::WorldBuilder).
///
/// None of these are hard limits. Stores and pools grow past them on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Initial number of entity slots pre-allocated in dense stores.
    pub entity_capacity: usize,
    /// Initial room reserved for registered systems.
    pub system_capacity: usize,
    /// Initial number of compact slots in sparse stores.
    pub sparse_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 256,
            system_capacity: 8,
            sparse_capacity: 64,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the source is not valid TOML or
    /// contains unknown keys.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))
    }

    /// Returns a copy with a different entity capacity.
    #[must_use]
    pub const fn with_entity_capacity(mut self, entity_capacity: usize) -> Self {
        self.entity_capacity = entity_capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_source() {
        let config = WorldConfig::from_toml_str("").unwrap();
        assert_eq!(config, WorldConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = WorldConfig::from_toml_str("entity_capacity = 1024").unwrap();
        assert_eq!(config.entity_capacity, 1024);
        assert_eq!(config.system_capacity, WorldConfig::default().system_capacity);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = WorldConfig::from_toml_str("entities = 5").unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }

    #[test]
    fn test_wrong_type_rejected() {
        assert!(WorldConfig::from_toml_str("entity_capacity = \"lots\"").is_err());
    }
}
