//! SQL rendering.
//!
//! Identifiers are always quoted and every filter value is bound as a
//! numbered parameter. Page bounds are validated integers and are written
//! inline.

use menudb_proto::{OrderDirection, Value};

use super::plan::{ExecutableQuery, RenderedQuery, TAGS_COLUMN};
use super::predicate::{ColumnRef, Predicate};
use super::tag::{TagExclusion, TagHaving, EXCLUDED_LINK_ALIAS, EXCLUDED_TAG_ALIAS};
use crate::catalog::{JoinDef, TagRelation, TAGS_TABLE};

/// Quote an identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

const PROJECTED_LINK_ALIAS: &str = "projected_link";
const PROJECTED_TAG_ALIAS: &str = "projected_tag";

struct SqlWriter {
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    fn new() -> Self {
        Self {
            sql: String::with_capacity(256),
            params: Vec::new(),
        }
    }

    fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn ident(&mut self, name: &str) {
        self.sql.push_str(&quote_ident(name));
    }

    fn qualified(&mut self, alias: &str, column: &str) {
        self.ident(alias);
        self.sql.push('.');
        self.ident(column);
    }

    fn column(&mut self, column: &ColumnRef) {
        self.qualified(&column.alias, &column.column);
    }

    fn bind(&mut self, value: Value) {
        self.params.push(value);
        self.sql.push('?');
        self.sql.push_str(&self.params.len().to_string());
    }

    fn bind_list(&mut self, values: &[Value]) {
        self.sql.push('(');
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.bind(value.clone());
        }
        self.sql.push(')');
    }

    fn table(&mut self, table: &str, alias: &str) {
        self.ident(table);
        self.push(" AS ");
        self.ident(alias);
    }

    fn join(&mut self, join: &JoinDef) {
        self.push(" ");
        self.push(join.kind.keyword());
        self.push(" ");
        self.table(&join.table, &join.alias);
        self.push(" ON ");
        self.qualified(&join.alias, &join.right_column);
        self.push(" = ");
        self.qualified(&join.left_alias, &join.left_column);
    }

    fn conjunction<'p>(&mut self, predicates: impl IntoIterator<Item = &'p Predicate>) {
        for (i, predicate) in predicates.into_iter().enumerate() {
            if i > 0 {
                self.push(" AND ");
            }
            self.predicate(predicate);
        }
    }

    fn predicate(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::Compare { column, op, value } => {
                self.column(column);
                self.push(" ");
                self.push(op.symbol());
                self.push(" ");
                self.bind(value.clone());
            }
            Predicate::IsNull(column) => {
                self.column(column);
                self.push(" IS NULL");
            }
            Predicate::IsNotNull(column) => {
                self.column(column);
                self.push(" IS NOT NULL");
            }
            Predicate::DistinctFrom { column, value } => {
                self.column(column);
                self.push(" IS NOT ");
                self.bind(value.clone());
            }
            Predicate::In { values, .. } if values.is_empty() => self.push("1 = 0"),
            Predicate::NotIn { values, .. } if values.is_empty() => self.push("1 = 1"),
            Predicate::In { column, values } => {
                self.column(column);
                self.push(" IN ");
                self.bind_list(values);
            }
            Predicate::NotIn { column, values } => {
                self.column(column);
                self.push(" NOT IN ");
                self.bind_list(values);
            }
            Predicate::Like {
                column,
                pattern,
                case_insensitive: false,
            } => {
                self.column(column);
                self.push(" LIKE ");
                self.bind(Value::String(pattern.clone()));
            }
            Predicate::Like {
                column,
                pattern,
                case_insensitive: true,
            } => {
                self.push("LOWER(");
                self.column(column);
                self.push(") LIKE LOWER(");
                self.bind(Value::String(pattern.clone()));
                self.push(")");
            }
            Predicate::All(items) if items.is_empty() => self.push("1 = 1"),
            Predicate::Any(items) if items.is_empty() => self.push("1 = 0"),
            Predicate::All(items) => self.group(items, " AND "),
            Predicate::Any(items) => self.group(items, " OR "),
            Predicate::Never => self.push("1 = 0"),
        }
    }

    fn group(&mut self, items: &[Predicate], separator: &str) {
        self.push("(");
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.predicate(item);
        }
        self.push(")");
    }

    /// Counts satisfied criteria per group.
    fn having(&mut self, having: &TagHaving) {
        self.push(" HAVING (");
        for (i, criterion) in having.criteria.iter().enumerate() {
            if i > 0 {
                self.push(" + ");
            }
            self.push("MAX(CASE WHEN ");
            self.predicate(criterion);
            self.push(" THEN 1 ELSE 0 END)");
        }
        self.push(") = ");
        self.push(&having.required.to_string());
    }

    fn exclusion(&mut self, exclusion: &TagExclusion) {
        let relation = &exclusion.relation;
        self.push("NOT EXISTS (SELECT 1 FROM ");
        self.table(&relation.association_table, EXCLUDED_LINK_ALIAS);
        self.push(" JOIN ");
        self.table(TAGS_TABLE, EXCLUDED_TAG_ALIAS);
        self.push(" ON ");
        self.qualified(EXCLUDED_TAG_ALIAS, "id");
        self.push(" = ");
        self.qualified(EXCLUDED_LINK_ALIAS, &relation.tag_column);
        self.push(" WHERE ");
        self.qualified(EXCLUDED_LINK_ALIAS, &relation.entity_column);
        self.push(" = ");
        self.column(&exclusion.root_id);
        for predicate in &exclusion.predicates {
            self.push(" AND ");
            self.predicate(predicate);
        }
        self.push(")");
    }

    /// Correlated subquery aggregating the live tags of the current root row.
    fn tag_projection(&mut self, relation: &TagRelation, root_id: &ColumnRef) {
        let (link, tag) = (PROJECTED_LINK_ALIAS, PROJECTED_TAG_ALIAS);
        self.push("(SELECT json_group_array(json_object(");
        for (i, field) in ["key", "value", "author_id", "type"].iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push("'");
            self.push(field);
            self.push("', ");
            self.qualified(tag, field);
        }
        self.push(")) FROM ");
        self.table(&relation.association_table, link);
        self.push(" JOIN ");
        self.table(TAGS_TABLE, tag);
        self.push(" ON ");
        self.qualified(tag, "id");
        self.push(" = ");
        self.qualified(link, &relation.tag_column);
        self.push(" WHERE ");
        self.qualified(link, &relation.entity_column);
        self.push(" = ");
        self.column(root_id);
        self.push(" AND ");
        self.qualified(link, "discarded");
        self.push(" = ");
        self.bind(Value::Bool(false));
        self.push(" AND ");
        self.qualified(tag, "discarded");
        self.push(" = ");
        self.bind(Value::Bool(false));
        self.push(" AND ");
        self.qualified(tag, "type");
        self.push(" = ");
        self.bind(Value::String(relation.tag_type.clone()));
        self.push(")");
    }

    /// `FROM` through `HAVING`.
    fn body(&mut self, query: &ExecutableQuery) {
        self.push(" FROM ");
        self.table(&query.base_table, &query.base_table);
        for join in &query.joins {
            self.join(join);
        }
        if let Some(tags) = &query.tag_match {
            for join in &tags.joins {
                self.join(join);
            }
        }

        let conditions: Vec<&Predicate> = query
            .predicates
            .iter()
            .chain(query.soft_delete.iter())
            .chain(query.tag_match.iter().flat_map(|t| t.predicates.iter()))
            .collect();
        if !conditions.is_empty() || query.tag_exclusion.is_some() {
            self.push(" WHERE ");
            self.conjunction(conditions.iter().copied());
            if let Some(exclusion) = &query.tag_exclusion {
                if !conditions.is_empty() {
                    self.push(" AND ");
                }
                self.exclusion(exclusion);
            }
        }

        if let Some(tags) = &query.tag_match {
            self.push(" GROUP BY ");
            self.column(&tags.group_by);
            if let Some(having) = &tags.having {
                self.having(having);
            }
        }
    }

    fn finish(self) -> RenderedQuery {
        RenderedQuery {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Render the paged select statement of `query`.
pub(crate) fn render_select(query: &ExecutableQuery) -> RenderedQuery {
    let mut w = SqlWriter::new();
    w.push("SELECT ");
    for (i, projection) in query.select.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.column(&projection.column);
        w.push(" AS ");
        w.ident(&projection.name);
    }
    if let Some(relation) = &query.tag_projection {
        if !query.select.is_empty() {
            w.push(", ");
        }
        w.tag_projection(relation, &query.root_id());
        w.push(" AS ");
        w.ident(TAGS_COLUMN);
    }

    w.body(query);

    if !query.order_by.is_empty() {
        w.push(" ORDER BY ");
        for (i, (column, direction)) in query.order_by.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.column(column);
            w.push(match direction {
                OrderDirection::Asc => " ASC",
                OrderDirection::Desc => " DESC",
            });
        }
    }

    match (query.limit, query.offset) {
        (Some(limit), 0) => w.push(&format!(" LIMIT {limit}")),
        (Some(limit), offset) => w.push(&format!(" LIMIT {limit} OFFSET {offset}")),
        (None, 0) => {}
        (None, offset) => w.push(&format!(" LIMIT -1 OFFSET {offset}")),
    }

    w.finish()
}

/// Render a statement counting the entities `query` matches.
pub(crate) fn render_count(query: &ExecutableQuery) -> RenderedQuery {
    let mut w = SqlWriter::new();
    w.push("SELECT COUNT(*) AS ");
    w.ident("count");
    w.push(" FROM (SELECT ");
    w.column(&query.root_id());
    w.body(query);
    w.push(") AS ");
    w.ident("matched");
    w.finish()
}
