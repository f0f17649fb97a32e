//! # ECS Configuration
//!
//! Compile-time ceilings plus the runtime [`EcsConfig`] that picks limits
//! below them. Configs are plain TOML, loaded once at startup:
//!
//! ```toml
//! max_entities = 4096
//! max_components = 32
//! max_processes = 16
//! name_table_buckets = 71
//! ```

use serde::Deserialize;

use crate::ecs::Signature;
use crate::error::{EcsError, EcsResult};

/// Hard ceiling on simultaneously live entities.
pub const MAX_ENTITIES: usize = 12_288;

/// Hard ceiling on registered component types (one signature bit each).
pub const MAX_COMPONENTS: usize = Signature::BITS;

/// Hard ceiling on registered processes.
pub const MAX_PROCESSES: usize = 64;

/// Bucket count for the component/process name tables.
pub const DEFAULT_NAME_TABLE_BUCKETS: usize = MAX_COMPONENTS + 7;

/// Runtime limits for a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcsConfig {
    /// Entity capacity (`1..=MAX_ENTITIES`).
    pub max_entities: usize,
    /// Component type capacity (`1..=MAX_COMPONENTS`).
    pub max_components: usize,
    /// Process capacity (`1..=MAX_PROCESSES`).
    pub max_processes: usize,
    /// Buckets in each name table.
    pub name_table_buckets: usize,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_entities: MAX_ENTITIES,
            max_components: MAX_COMPONENTS,
            max_processes: MAX_PROCESSES,
            name_table_buckets: DEFAULT_NAME_TABLE_BUCKETS,
        }
    }
}

impl EcsConfig {
    /// Config with a custom entity capacity and default everything else.
    #[must_use]
    pub fn with_max_entities(max_entities: usize) -> Self {
        Self { max_entities, ..Self::default() }
    }

    /// Parses and validates a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] on malformed TOML, unknown keys, or limits
    /// outside the compile-time ceilings.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|err| EcsError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every limit against its ceiling.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> EcsResult<()> {
        check_range("max_entities", self.max_entities, MAX_ENTITIES)?;
        check_range("max_components", self.max_components, MAX_COMPONENTS)?;
        check_range("max_processes", self.max_processes, MAX_PROCESSES)?;
        if self.name_table_buckets == 0 {
            return Err(EcsError::InvalidConfig(
                "name_table_buckets must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

fn check_range(field: &str, value: usize, ceiling: usize) -> EcsResult<()> {
    if value == 0 || value > ceiling {
        return Err(EcsError::InvalidConfig(format!(
            "{field} must be in 1..={ceiling}, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EcsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_components, 64);
        assert_eq!(config.name_table_buckets, 71);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EcsConfig::from_toml_str("max_entities = 256\nmax_processes = 8\n").unwrap();
        assert_eq!(config.max_entities, 256);
        assert_eq!(config.max_processes, 8);
        assert_eq!(config.max_components, MAX_COMPONENTS);
    }

    #[test]
    fn test_ceilings_enforced() {
        let err = EcsConfig::from_toml_str("max_components = 65").unwrap_err();
        assert_eq!(
            err,
            EcsError::InvalidConfig("max_components must be in 1..=64, got 65".to_owned())
        );

        assert!(EcsConfig::with_max_entities(0).validate().is_err());
        assert!(EcsConfig::with_max_entities(MAX_ENTITIES + 1).validate().is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(matches!(
            EcsConfig::from_toml_str("max_entites = 10"),
            Err(EcsError::InvalidConfig(_))
        ));
    }
}
