//! menudb Core - Column catalog, query planning, storage access and repositories.
//!
//! This crate provides the generic, attribute-filterable repository layer of
//! the menu planning backend.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod mapper;
pub mod query;
pub mod repository;
pub mod storage;

pub use catalog::{
    menu_registry, ColumnMapping, ColumnRegistry, EntityMapping, JoinDef, JoinKind, SemanticType,
    TagRelation,
};
pub use config::{PageLimits, RepositoryConfig};
pub use domain::{Meal, Privacy, Product, Recipe, Tag};
pub use error::Error;
pub use mapper::{check_coverage, EntityMapper, MealMapper, ProductMapper, RecipeMapper, Row, WritePayload};
pub use query::{ExecutableQuery, OperatorRegistry, QueryBuilder, QueryEngine, RenderedQuery};
pub use repository::{MenuRepositories, Repository};
pub use storage::Database;

/// Re-export caller-facing types.
pub use menudb_proto as proto;
