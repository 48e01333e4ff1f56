//! Query builder.
//!
//! Turns one filter specification into an [`ExecutableQuery`] in a fixed
//! sequence of stages. The builder only reads the registries; every call
//! produces a fresh plan, so builders can run concurrently without locking.

use std::fmt;

use menudb_proto::{FilterSpec, OrderDirection, QueryOptions, Value};
use tracing::{debug, trace};

use super::join::JoinManager;
use super::operator::{key_candidates, FilterTarget, Operator, OperatorRegistry};
use super::plan::{ExecutableQuery, Projection};
use super::predicate::{ColumnRef, Predicate};
use super::tag::TagMatcher;
use crate::catalog::{ColumnMapping, ColumnRegistry, EntityMapping};
use crate::config::PageLimits;
use crate::error::Error;

/// Stages a build passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    ParsingFilters,
    ResolvingColumns,
    ResolvingJoins,
    BuildingPredicates,
    ApplyingTagLogic,
    ApplyingSoftDeletePolicy,
    ApplyingOrderingAndPaging,
    Built,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Registries and paging bounds shared by every build.
#[derive(Debug)]
pub struct QueryEngine {
    /// Column mapping registry.
    pub columns: ColumnRegistry,
    /// Operator registry.
    pub operators: OperatorRegistry,
    /// Paging bounds.
    pub limits: PageLimits,
}

impl QueryEngine {
    /// Create an engine with the standard operators.
    pub fn new(columns: ColumnRegistry, limits: PageLimits) -> Self {
        Self {
            columns,
            operators: OperatorRegistry::standard(),
            limits,
        }
    }

    /// Builder borrowing this engine's registries.
    pub fn builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.columns, &self.operators, self.limits)
    }
}

/// A filter key resolved to an attribute and operator.
struct ResolvedFilter<'a> {
    key: &'a str,
    column: &'a ColumnMapping,
    operator: Operator,
    value: &'a Value,
}

/// Builds executable queries from filter specifications.
pub struct QueryBuilder<'a> {
    columns: &'a ColumnRegistry,
    operators: &'a OperatorRegistry,
    limits: PageLimits,
}

impl<'a> QueryBuilder<'a> {
    /// Create a builder.
    pub fn new(
        columns: &'a ColumnRegistry,
        operators: &'a OperatorRegistry,
        limits: PageLimits,
    ) -> Self {
        Self {
            columns,
            operators,
            limits,
        }
    }

    /// Build the plan for `spec` against `entity_type`.
    pub fn build(
        &self,
        entity_type: &str,
        spec: &FilterSpec,
        options: &QueryOptions,
    ) -> Result<ExecutableQuery, Error> {
        let mut stage = BuildStage::ParsingFilters;
        let result = self.run(entity_type, spec, options, &mut stage);
        match &result {
            Ok(query) => debug!(
                entity = entity_type,
                joins = query.join_count(),
                predicates = query.predicates.len(),
                tag_mode = ?query.tag_mode(),
                excludes_tags = query.tag_exclusion.is_some(),
                soft_delete = query.soft_delete.is_some(),
                limit = ?query.limit,
                offset = query.offset,
                "Built query"
            ),
            Err(e) => debug!(entity = entity_type, stage = %stage, error = %e, "Query build failed"),
        }
        result
    }

    fn run(
        &self,
        entity_type: &str,
        spec: &FilterSpec,
        options: &QueryOptions,
        stage: &mut BuildStage,
    ) -> Result<ExecutableQuery, Error> {
        let mapping = self.columns.entity(entity_type)?;
        let root = mapping.root_alias();

        trace!(entity = entity_type, filters = spec.filters.len(), "ParsingFilters");
        let parsed: Vec<(&str, Vec<(&str, Operator)>, &Value)> = spec
            .filters
            .iter()
            .map(|(key, value)| (key.as_str(), key_candidates(key), value))
            .collect();

        advance(stage, BuildStage::ResolvingColumns);
        let mut filters = Vec::with_capacity(parsed.len());
        for (key, candidates, value) in parsed {
            let (column, operator) = resolve_key(mapping, key, &candidates)?;
            filters.push(ResolvedFilter {
                key,
                column,
                operator,
                value,
            });
        }
        let mut sort_columns = Vec::with_capacity(spec.sort.len());
        for order in &spec.sort {
            let column = mapping
                .get_column(&order.field)
                .ok_or_else(|| Error::UnknownFilterKey {
                    entity: mapping.name.clone(),
                    key: order.field.clone(),
                })?;
            sort_columns.push((column, order.direction));
        }

        advance(stage, BuildStage::ResolvingJoins);
        let joins = JoinManager::new(&mapping.name, root).plan(
            filters
                .iter()
                .map(|f| f.column)
                .chain(sort_columns.iter().map(|(c, _)| *c))
                .map(|c| c.join_path.as_slice()),
        )?;

        advance(stage, BuildStage::BuildingPredicates);
        let mut predicates = Vec::with_capacity(filters.len());
        let mut targets_discard = false;
        for filter in &filters {
            let strategy = self
                .operators
                .get(filter.operator, filter.column.semantic_type)
                .map_err(|e| with_key(e, filter.key))?;
            let target = FilterTarget {
                key: filter.key,
                column: column_ref(mapping, filter.column),
                mapping: filter.column,
            };
            predicates.push(strategy.build(&target, filter.value)?);
            targets_discard |= mapping.is_discard_column(filter.column);
        }

        advance(stage, BuildStage::ApplyingTagLogic);
        let matcher = TagMatcher::new(mapping);
        let tag_match = match &spec.tags {
            Some(tags) => matcher.plan(tags)?,
            None => None,
        };
        let tag_exclusion = matcher.exclude(&spec.excluded_tags)?;

        advance(stage, BuildStage::ApplyingSoftDeletePolicy);
        let soft_delete = if options.include_discarded || targets_discard {
            None
        } else {
            Some(Predicate::eq(
                ColumnRef::new(root, mapping.discard_column.clone()),
                false,
            ))
        };

        advance(stage, BuildStage::ApplyingOrderingAndPaging);
        let root_id = ColumnRef::new(root, mapping.id_column.clone());
        let mut order_by: Vec<(ColumnRef, OrderDirection)> = sort_columns
            .iter()
            .map(|(column, direction)| (column_ref(mapping, column), *direction))
            .collect();
        if !order_by.is_empty() && !order_by.iter().any(|(c, _)| *c == root_id) {
            order_by.push((root_id, OrderDirection::Asc));
        }
        let limit = self.page_size(options.pagination.limit)?;

        let query = ExecutableQuery {
            entity: mapping.name.clone(),
            base_table: mapping.table.clone(),
            id_column: mapping.id_column.clone(),
            select: mapping
                .root_columns()
                .map(|c| Projection {
                    column: column_ref(mapping, c),
                    name: c.name.clone(),
                })
                .collect(),
            joins,
            predicates,
            soft_delete,
            tag_match,
            tag_exclusion,
            tag_projection: mapping.tags.clone(),
            order_by,
            limit: Some(limit),
            offset: options.pagination.offset,
            include_discarded: options.include_discarded,
        };
        advance(stage, BuildStage::Built);
        Ok(query)
    }

    fn page_size(&self, requested: Option<u32>) -> Result<u32, Error> {
        let max = self.limits.max_page_size;
        match requested {
            None => Ok(self.limits.default_page_size.min(max)),
            Some(limit) if limit == 0 || limit > max => Err(Error::InvalidPageSize { limit, max }),
            Some(limit) => Ok(limit),
        }
    }
}

fn advance(stage: &mut BuildStage, next: BuildStage) {
    trace!(from = %stage, to = %next, "Query builder stage");
    *stage = next;
}

fn column_ref(mapping: &EntityMapping, column: &ColumnMapping) -> ColumnRef {
    ColumnRef::new(
        column.alias.as_deref().unwrap_or(mapping.root_alias()),
        column.column.clone(),
    )
}

fn with_key(err: Error, key: &str) -> Error {
    match err {
        Error::UnsupportedOperator {
            operator,
            semantic_type,
            ..
        } => Error::UnsupportedOperator {
            key: key.to_string(),
            operator,
            semantic_type,
        },
        other => other,
    }
}

/// Pick the first candidate reading of `key` that names a registered attribute.
///
/// When none does but an underscore-delimited prefix is registered, the
/// remainder is reported as an unsupported operator.
fn resolve_key<'m>(
    mapping: &'m EntityMapping,
    key: &str,
    candidates: &[(&str, Operator)],
) -> Result<(&'m ColumnMapping, Operator), Error> {
    for (attribute, operator) in candidates {
        if let Some(column) = mapping.get_column(attribute) {
            return Ok((column, *operator));
        }
    }
    for (idx, _) in key.rmatch_indices('_') {
        if let Some(column) = mapping.get_column(&key[..idx]) {
            return Err(Error::UnsupportedOperator {
                key: key.to_string(),
                operator: key[idx + 1..].to_string(),
                semantic_type: column.semantic_type.to_string(),
            });
        }
    }
    Err(Error::UnknownFilterKey {
        entity: mapping.name.clone(),
        key: key.to_string(),
    })
}
