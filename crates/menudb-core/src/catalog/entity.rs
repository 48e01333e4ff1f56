//! Entity mappings.

use super::column::ColumnMapping;
use super::join::JoinDef;

/// Table holding tag rows shared by all tag relations.
pub const TAGS_TABLE: &str = "tags";

/// Many-to-many link between an entity table and the tags table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRelation {
    /// Association table.
    pub association_table: String,
    /// Column on the association table referencing the entity.
    pub entity_column: String,
    /// Column on the association table referencing the tag.
    pub tag_column: String,
    /// Tag namespace this entity type uses.
    pub tag_type: String,
}

impl TagRelation {
    /// Create a tag relation with the conventional `tag_id` link column.
    pub fn new(
        association_table: impl Into<String>,
        entity_column: impl Into<String>,
        tag_type: impl Into<String>,
    ) -> Self {
        Self {
            association_table: association_table.into(),
            entity_column: entity_column.into(),
            tag_column: "tag_id".to_string(),
            tag_type: tag_type.into(),
        }
    }
}

/// Declarative storage layout of one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMapping {
    /// Entity type name.
    pub name: String,
    /// Base table; also used as the root alias.
    pub table: String,
    /// Identifier column on the base table.
    pub id_column: String,
    /// Soft-delete flag column on the base table.
    pub discard_column: String,
    /// Joins available to column mappings.
    pub joins: Vec<JoinDef>,
    /// Filterable attributes.
    pub columns: Vec<ColumnMapping>,
    /// Tag association, if the entity carries tags.
    pub tags: Option<TagRelation>,
}

impl EntityMapping {
    /// Create a mapping with `id` and `discarded` root columns.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            id_column: "id".to_string(),
            discard_column: "discarded".to_string(),
            joins: Vec::new(),
            columns: Vec::new(),
            tags: None,
        }
    }

    /// Add a join.
    pub fn with_join(mut self, join: JoinDef) -> Self {
        self.joins.push(join);
        self
    }

    /// Add a column.
    pub fn with_column(mut self, column: ColumnMapping) -> Self {
        self.columns.push(column);
        self
    }

    /// Add multiple columns.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnMapping>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Attach a tag relation.
    pub fn with_tags(mut self, tags: TagRelation) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Root alias used in rendered queries.
    pub fn root_alias(&self) -> &str {
        &self.table
    }

    /// Get a column by logical name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnMapping> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get a join by alias.
    pub fn get_join(&self, alias: &str) -> Option<&JoinDef> {
        self.joins.iter().find(|j| j.alias == alias)
    }

    /// Columns stored on the base table, in declaration order.
    pub fn root_columns(&self) -> impl Iterator<Item = &ColumnMapping> {
        self.columns.iter().filter(|c| c.is_root())
    }

    /// True when `column` is the soft-delete flag.
    pub fn is_discard_column(&self, column: &ColumnMapping) -> bool {
        column.is_root() && column.column == self.discard_column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SemanticType;

    #[test]
    fn test_entity_mapping_builders() {
        let mapping = EntityMapping::new("Meal", "meals")
            .with_join(JoinDef::left("menu", "menus", "meals", "menu_id", "id"))
            .with_columns([
                ColumnMapping::root("id", SemanticType::Id),
                ColumnMapping::root("discarded", SemanticType::Bool),
                ColumnMapping::joined("menu_name", "menu", "name", SemanticType::Text),
            ])
            .with_tags(TagRelation::new("meals_tags_association", "meal_id", "meal"));

        assert_eq!(mapping.root_alias(), "meals");
        assert!(mapping.get_column("menu_name").is_some());
        assert!(mapping.get_column("missing").is_none());
        assert!(mapping.get_join("menu").is_some());
        assert_eq!(mapping.root_columns().count(), 2);
        assert!(mapping.is_discard_column(mapping.get_column("discarded").unwrap()));
        assert!(!mapping.is_discard_column(mapping.get_column("id").unwrap()));
        assert_eq!(mapping.tags.unwrap().tag_column, "tag_id");
    }
}
