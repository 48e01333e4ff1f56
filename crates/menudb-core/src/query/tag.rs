//! Tag matching.
//!
//! Builds "entity has ALL (or ANY) of these tag triplets" by joining the
//! association table once, filtering to rows that satisfy at least one
//! criterion and grouping by the root identifier. For ALL semantics a having
//! clause requires every criterion to be satisfied by some row of the group.

use menudb_proto::{TagCriterion, TagFilter, TagMatchMode, Value};

use super::predicate::{ColumnRef, Predicate};
use crate::catalog::{EntityMapping, JoinDef, TagRelation, TAGS_TABLE};
use crate::error::Error;

/// Alias of the association table in the main query.
pub const LINK_ALIAS: &str = "tag_link";
/// Alias of the tags table in the main query.
pub const TAG_ALIAS: &str = "tag";
/// Alias of the association table inside the exclusion subquery.
pub const EXCLUDED_LINK_ALIAS: &str = "excluded_link";
/// Alias of the tags table inside the exclusion subquery.
pub const EXCLUDED_TAG_ALIAS: &str = "excluded_tag";

/// Having clause requiring `required` distinct criteria per group.
#[derive(Debug, Clone, PartialEq)]
pub struct TagHaving {
    /// One predicate per requested criterion.
    pub criteria: Vec<Predicate>,
    /// Number of criteria that must be satisfied.
    pub required: usize,
}

/// Joins, predicates and grouping for an inclusive tag match.
#[derive(Debug, Clone, PartialEq)]
pub struct TagPlan {
    /// Association and tags joins, in order.
    pub joins: Vec<JoinDef>,
    /// Predicates ANDed into the where clause.
    pub predicates: Vec<Predicate>,
    /// Root identifier; the only grouping column.
    pub group_by: ColumnRef,
    /// Present for ALL semantics with more than one criterion.
    pub having: Option<TagHaving>,
    /// Requested mode.
    pub mode: TagMatchMode,
}

/// `NOT EXISTS` subquery excluding entities carrying any listed tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagExclusion {
    /// Tag relation of the entity.
    pub relation: TagRelation,
    /// Root identifier the subquery correlates with.
    pub root_id: ColumnRef,
    /// Predicates on the subquery aliases, ANDed.
    pub predicates: Vec<Predicate>,
}

/// Builds tag predicates for one entity type.
pub struct TagMatcher<'a> {
    mapping: &'a EntityMapping,
}

impl<'a> TagMatcher<'a> {
    /// Create a matcher for `mapping`.
    pub fn new(mapping: &'a EntityMapping) -> Self {
        Self { mapping }
    }

    fn relation(&self, key: &str) -> Result<&'a TagRelation, Error> {
        self.mapping.tags.as_ref().ok_or_else(|| Error::UnknownFilterKey {
            entity: self.mapping.name.clone(),
            key: key.to_string(),
        })
    }

    fn root_id(&self) -> ColumnRef {
        ColumnRef::new(self.mapping.root_alias(), self.mapping.id_column.clone())
    }

    /// Plan an inclusive match. Zero criteria add nothing.
    pub fn plan(&self, filter: &TagFilter) -> Result<Option<TagPlan>, Error> {
        if filter.is_empty() {
            return Ok(None);
        }
        let relation = self.relation(menudb_proto::TAGS_KEY)?;
        let root = self.mapping.root_alias();

        let joins = vec![
            JoinDef::inner(
                LINK_ALIAS,
                relation.association_table.clone(),
                root,
                self.mapping.id_column.clone(),
                relation.entity_column.clone(),
            ),
            JoinDef::inner(
                TAG_ALIAS,
                TAGS_TABLE,
                LINK_ALIAS,
                relation.tag_column.clone(),
                "id",
            ),
        ];

        let criteria: Vec<Predicate> = filter
            .criteria
            .iter()
            .map(|c| criterion_predicate(TAG_ALIAS, c))
            .collect();

        let mut predicates = vec![Predicate::eq(
            ColumnRef::new(TAG_ALIAS, "type"),
            relation.tag_type.clone(),
        )];
        if !filter.include_discarded_links {
            predicates.extend(live_link_predicates(LINK_ALIAS, TAG_ALIAS));
        }
        predicates.push(Predicate::any(criteria.clone()));

        let having = match filter.mode {
            TagMatchMode::All if criteria.len() > 1 => Some(TagHaving {
                required: criteria.len(),
                criteria,
            }),
            _ => None,
        };

        Ok(Some(TagPlan {
            joins,
            predicates,
            group_by: self.root_id(),
            having,
            mode: filter.mode,
        }))
    }

    /// Plan the exclusion of entities carrying any of `criteria`.
    pub fn exclude(&self, criteria: &[TagCriterion]) -> Result<Option<TagExclusion>, Error> {
        if criteria.is_empty() {
            return Ok(None);
        }
        let relation = self.relation(menudb_proto::TAGS_NOT_EXISTS_KEY)?;

        let mut predicates = vec![Predicate::eq(
            ColumnRef::new(EXCLUDED_TAG_ALIAS, "type"),
            relation.tag_type.clone(),
        )];
        predicates.extend(live_link_predicates(EXCLUDED_LINK_ALIAS, EXCLUDED_TAG_ALIAS));
        predicates.push(Predicate::any(
            criteria
                .iter()
                .map(|c| criterion_predicate(EXCLUDED_TAG_ALIAS, c))
                .collect(),
        ));

        Ok(Some(TagExclusion {
            relation: relation.clone(),
            root_id: self.root_id(),
            predicates,
        }))
    }
}

fn live_link_predicates(link_alias: &str, tag_alias: &str) -> [Predicate; 2] {
    [
        Predicate::eq(ColumnRef::new(link_alias, "discarded"), false),
        Predicate::eq(ColumnRef::new(tag_alias, "discarded"), false),
    ]
}

/// Key equality plus optional value and author equality.
fn criterion_predicate(tag_alias: &str, criterion: &TagCriterion) -> Predicate {
    let mut parts = vec![Predicate::eq(
        ColumnRef::new(tag_alias, "key"),
        criterion.key.clone(),
    )];
    if let Some(value) = &criterion.value {
        parts.push(Predicate::eq(
            ColumnRef::new(tag_alias, "value"),
            Value::String(value.clone()),
        ));
    }
    if let Some(author) = &criterion.author_id {
        parts.push(Predicate::eq(
            ColumnRef::new(tag_alias, "author_id"),
            Value::String(author.clone()),
        ));
    }
    Predicate::all(parts)
}
