//! Executable query representation.

use menudb_proto::{OrderDirection, TagMatchMode, Value};
use serde::Serialize;

use super::predicate::{ColumnRef, Predicate};
use super::sql;
use super::tag::{TagExclusion, TagPlan};
use crate::catalog::{JoinDef, TagRelation};

/// Name of the projected column carrying an entity's live tags as JSON.
pub const TAGS_COLUMN: &str = "__tags";

/// One selected column and the name it is returned under.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Qualified column.
    pub column: ColumnRef,
    /// Result column name.
    pub name: String,
}

/// Fully resolved plan for one query. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableQuery {
    /// Entity type name.
    pub entity: String,
    /// Base table; also the root alias.
    pub base_table: String,
    /// Identifier column on the base table.
    pub id_column: String,
    /// Root columns returned for hydration.
    pub select: Vec<Projection>,
    /// Business joins, dependency ordered.
    pub joins: Vec<JoinDef>,
    /// Filter predicates, ANDed.
    pub predicates: Vec<Predicate>,
    /// Soft-delete predicate, kept apart from filter predicates.
    pub soft_delete: Option<Predicate>,
    /// Inclusive tag match.
    pub tag_match: Option<TagPlan>,
    /// Tag exclusion.
    pub tag_exclusion: Option<TagExclusion>,
    /// Tag relation whose live tags are projected into [`TAGS_COLUMN`].
    pub tag_projection: Option<TagRelation>,
    /// Ordering, applied left to right.
    pub order_by: Vec<(ColumnRef, OrderDirection)>,
    /// Page size.
    pub limit: Option<u32>,
    /// Rows to skip.
    pub offset: u32,
    /// Whether soft-deleted entities are returned.
    pub include_discarded: bool,
}

impl ExecutableQuery {
    /// Root identifier column.
    pub fn root_id(&self) -> ColumnRef {
        ColumnRef::new(self.base_table.clone(), self.id_column.clone())
    }

    /// Render the select statement.
    pub fn to_sql(&self) -> RenderedQuery {
        sql::render_select(self)
    }

    /// Render a statement counting matching entities, ignoring ordering and paging.
    pub fn to_count_sql(&self) -> RenderedQuery {
        sql::render_count(self)
    }

    /// Total number of joins, tag joins included.
    pub fn join_count(&self) -> usize {
        self.joins.len() + self.tag_match.as_ref().map_or(0, |t| t.joins.len())
    }

    /// Requested tag match mode, if any.
    pub fn tag_mode(&self) -> Option<TagMatchMode> {
        self.tag_match.as_ref().map(|t| t.mode)
    }
}

/// SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedQuery {
    /// Statement with `?N` placeholders.
    pub sql: String,
    /// Values bound to the placeholders, in order.
    pub params: Vec<Value>,
}
