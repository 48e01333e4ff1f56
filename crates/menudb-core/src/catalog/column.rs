//! Column mapping entries.

use super::join::JoinDef;
use super::types::SemanticType;

/// Maps one logical attribute to a physical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Logical attribute name exposed to callers.
    pub name: String,
    /// Table alias owning the column. `None` means the root table.
    pub alias: Option<String>,
    /// Physical column name.
    pub column: String,
    /// Semantic type.
    pub semantic_type: SemanticType,
    /// Whether the column may hold null.
    pub nullable: bool,
    /// Joins needed to reach `alias`, root first. Filled in by the registry.
    pub join_path: Vec<JoinDef>,
}

impl ColumnMapping {
    /// A column on the root table whose physical name equals the logical name.
    pub fn root(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            alias: None,
            semantic_type,
            nullable: false,
            join_path: Vec::new(),
        }
    }

    /// A column reached through the join that introduces `alias`.
    pub fn joined(
        name: impl Into<String>,
        alias: impl Into<String>,
        column: impl Into<String>,
        semantic_type: SemanticType,
    ) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
            column: column.into(),
            semantic_type,
            nullable: true,
            join_path: Vec::new(),
        }
    }

    /// Mark the column nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Use a physical column name different from the logical name.
    pub fn stored_as(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// True when the column lives on the root table.
    pub fn is_root(&self) -> bool {
        self.alias.is_none()
    }
}
