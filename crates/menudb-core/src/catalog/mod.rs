//! Column mapping catalog.
//!
//! The catalog maps each entity type's filterable attributes to physical
//! columns, including columns on joined tables, and records the join path
//! needed to reach them.

mod column;
mod entity;
mod join;
pub mod menu;
mod registry;
mod types;

pub use column::ColumnMapping;
pub use entity::{EntityMapping, TagRelation, TAGS_TABLE};
pub use join::{JoinDef, JoinKind};
pub use menu::menu_registry;
pub use registry::ColumnRegistry;
pub use types::SemanticType;
