//! Entity contract and the model of registered entity sets.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{de::DeserializeOwned, Serialize};

use crate::storage::{is_identifier, Record, RepositoryError, Result};

/// A record type with an identity that can live in an entity set.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Id: Display + Send + Sync;

    /// Name of the set (table) holding this entity.
    const SET_NAME: &'static str;

    /// Type name used in error messages.
    const ENTITY_TYPE: &'static str;

    fn id(&self) -> Self::Id;

    /// Related sub-entities that a query may eagerly include.
    ///
    /// Relations are stored inside the entity document; the ones a query does
    /// not include are loaded as their default value.
    fn relations() -> &'static [&'static str] {
        &[]
    }

    /// Storage key derived from the identity.
    fn key(&self) -> String {
        self.id().to_string()
    }
}

/// Serializes an entity into a stored row.
pub fn to_record<T: Entity>(entity: &T) -> Result<Record> {
    Ok(Record::new(entity.key(), serde_json::to_value(entity)?))
}

/// Deserializes a stored row back into an entity.
pub fn from_record<T: Entity>(record: Record) -> Result<T> {
    serde_json::from_value(record.body).map_err(|e| {
        RepositoryError::Serialization(format!(
            "{} {}: {e}",
            T::ENTITY_TYPE,
            record.key
        ))
    })
}

/// Configuration of one registered entity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityConfig {
    pub set_name: &'static str,
    pub entity_type: &'static str,
}

/// The entity sets known to a context, keyed by set name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    sets: BTreeMap<&'static str, EntityConfig>,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    pub fn contains(&self, set_name: &str) -> bool {
        self.sets.contains_key(set_name)
    }

    pub fn entity(&self, set_name: &str) -> Option<&EntityConfig> {
        self.sets.get(set_name)
    }

    pub fn sets(&self) -> impl Iterator<Item = &EntityConfig> {
        self.sets.values()
    }
}

/// Collects entity registrations, validated on [`ModelBuilder::build`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    configs: Vec<EntityConfig>,
}

impl ModelBuilder {
    /// Registers an entity type.
    pub fn entity<T: Entity>(mut self) -> Self {
        self.configs.push(EntityConfig {
            set_name: T::SET_NAME,
            entity_type: T::ENTITY_TYPE,
        });
        self
    }

    /// Builds the model.
    ///
    /// Set names are spliced into backend queries, so they must be plain
    /// identifiers and unique.
    pub fn build(self) -> Result<Model> {
        let mut sets = BTreeMap::new();
        for config in self.configs {
            if !is_identifier(config.set_name) {
                return Err(RepositoryError::InvalidData(format!(
                    "set name {:?} of {} is not a plain identifier",
                    config.set_name, config.entity_type
                )));
            }
            if sets.insert(config.set_name, config).is_some() {
                return Err(RepositoryError::InvalidData(format!(
                    "set name {:?} is registered twice",
                    config.set_name
                )));
            }
        }
        Ok(Model { sets })
    }
}
