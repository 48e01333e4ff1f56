//! Column mapping registry.
//!
//! Built once at start-up from declarative entity mappings and immutable
//! afterwards. All lookups take `&self`, so the registry can be shared across
//! threads behind an `Arc` without locking.

use std::collections::{HashMap, HashSet};

use super::column::ColumnMapping;
use super::entity::EntityMapping;
use super::join::JoinDef;
use crate::error::Error;

/// Process-wide mapping from logical attributes to physical columns.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    entities: HashMap<String, EntityMapping>,
}

impl ColumnRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register an entity mapping.
    ///
    /// Join paths are resolved here so that downstream components never
    /// recompute them. A cyclic join declaration fails with
    /// `JoinCycleDetected`; other inconsistencies fail with `InvalidMapping`.
    pub fn register(mut self, mut mapping: EntityMapping) -> Result<Self, Error> {
        if self.entities.contains_key(&mapping.name) {
            return Err(Error::InvalidMapping(format!(
                "entity '{}' registered twice",
                mapping.name
            )));
        }

        let root = mapping.root_alias().to_string();
        let mut aliases: HashSet<&str> = HashSet::new();
        for join in &mapping.joins {
            if join.alias == root || !aliases.insert(join.alias.as_str()) {
                return Err(Error::InvalidMapping(format!(
                    "duplicate alias '{}' in {}",
                    join.alias, mapping.name
                )));
            }
        }
        for join in &mapping.joins {
            if join.left_alias != root && !aliases.contains(join.left_alias.as_str()) {
                return Err(Error::InvalidMapping(format!(
                    "join '{}' in {} depends on unknown alias '{}'",
                    join.alias, mapping.name, join.left_alias
                )));
            }
        }

        let mut paths: HashMap<String, Vec<JoinDef>> = HashMap::new();
        for join in &mapping.joins {
            let path = resolve_path(&mapping, &join.alias)?;
            paths.insert(join.alias.clone(), path);
        }

        let mut names: HashSet<String> = HashSet::new();
        for column in &mut mapping.columns {
            if !names.insert(column.name.clone()) {
                return Err(Error::InvalidMapping(format!(
                    "attribute '{}' declared twice in {}",
                    column.name, mapping.name
                )));
            }
            if let Some(alias) = &column.alias {
                let path = paths.get(alias).ok_or_else(|| {
                    Error::InvalidMapping(format!(
                        "attribute '{}' in {} uses unknown alias '{}'",
                        column.name, mapping.name, alias
                    ))
                })?;
                column.join_path = path.clone();
            }
        }

        for required in [&mapping.id_column, &mapping.discard_column] {
            if !mapping
                .root_columns()
                .any(|c| c.column == *required && c.name == *required)
            {
                return Err(Error::InvalidMapping(format!(
                    "{} must expose root attribute '{}'",
                    mapping.name, required
                )));
            }
        }

        self.entities.insert(mapping.name.clone(), mapping);
        Ok(self)
    }

    /// Look up an entity mapping.
    pub fn entity(&self, entity_type: &str) -> Result<&EntityMapping, Error> {
        self.entities
            .get(entity_type)
            .ok_or_else(|| Error::UnknownEntityType(entity_type.to_string()))
    }

    /// Resolve a logical attribute to its column mapping.
    pub fn resolve(&self, entity_type: &str, logical_name: &str) -> Result<&ColumnMapping, Error> {
        self.entity(entity_type)?
            .get_column(logical_name)
            .ok_or_else(|| Error::UnknownFilterKey {
                entity: entity_type.to_string(),
                key: logical_name.to_string(),
            })
    }

    /// Names of registered entity types, sorted.
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Walk `left_alias` links from `alias` back to the root.
fn resolve_path(mapping: &EntityMapping, alias: &str) -> Result<Vec<JoinDef>, Error> {
    let root = mapping.root_alias();
    let mut path: Vec<JoinDef> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    let mut current = alias;

    while current != root {
        if seen.iter().any(|s| s == current) {
            seen.push(current.to_string());
            return Err(Error::JoinCycleDetected {
                entity: mapping.name.clone(),
                aliases: seen,
            });
        }
        seen.push(current.to_string());
        let join = mapping.get_join(current).ok_or_else(|| {
            Error::InvalidMapping(format!(
                "alias '{}' in {} is not declared",
                current, mapping.name
            ))
        })?;
        path.push(join.clone());
        current = &join.left_alias;
    }

    path.reverse();
    Ok(path)
}
