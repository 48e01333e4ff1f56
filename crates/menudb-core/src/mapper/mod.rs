//! Entity mappers.
//!
//! A mapper converts storage rows into domain entities and domain entities
//! into write payloads. Every root attribute registered for an entity type
//! must be known to its mapper; [`check_coverage`] enforces that coupling.

mod meal;
mod product;
mod recipe;
mod row;

use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::ColumnRegistry;
use crate::error::Error;

pub use meal::MealMapper;
pub use product::ProductMapper;
pub use recipe::RecipeMapper;
pub use row::{Row, WritePayload};

/// Two-way conversion between one entity type and its storage rows.
pub trait EntityMapper: Send + Sync + 'static {
    /// Domain entity.
    type Entity: Clone + fmt::Debug + Send + Sync + 'static;

    /// Registered entity type name.
    const ENTITY: &'static str;

    /// Root columns read and written, in storage order.
    const COLUMNS: &'static [&'static str];

    /// Identifier of `entity`.
    fn id(entity: &Self::Entity) -> &str;

    /// Hydrate an entity. Fails with `Mapping` on an incompatible row.
    fn to_entity(row: &Row) -> Result<Self::Entity, Error>;

    /// Project an entity into a write payload.
    fn to_storage_row(entity: &Self::Entity) -> WritePayload;
}

/// Verify that `M` covers exactly the root columns registered for its entity.
pub fn check_coverage<M: EntityMapper>(registry: &ColumnRegistry) -> Result<(), Error> {
    let mapping = registry.entity(M::ENTITY)?;
    let registered: BTreeSet<&str> = mapping.root_columns().map(|c| c.name.as_str()).collect();
    let known: BTreeSet<&str> = M::COLUMNS.iter().copied().collect();

    if registered == known {
        return Ok(());
    }
    let unmapped: Vec<&str> = registered.difference(&known).copied().collect();
    let unregistered: Vec<&str> = known.difference(&registered).copied().collect();
    Err(Error::Mapping(format!(
        "mapper for {} is out of sync with the registry (unmapped: {:?}, unregistered: {:?})",
        M::ENTITY,
        unmapped,
        unregistered
    )))
}
