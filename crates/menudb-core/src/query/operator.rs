//! Filter operator registry.
//!
//! Operators form a closed set. Each has one strategy that validates the
//! filter value against the column's semantic type and produces a predicate.

use std::collections::HashMap;

use menudb_proto::Value;

use super::predicate::{ColumnRef, Comparison, Predicate};
use crate::catalog::{ColumnMapping, SemanticType};
use crate::error::Error;

/// Recognised filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equality; the operator used when a key carries no suffix.
    Eq,
    /// Inequality.
    Ne,
    /// Inclusive lower bound.
    Gte,
    /// Inclusive upper bound.
    Lte,
    /// Set membership.
    In,
    /// Set exclusion.
    NotIn,
    /// Null-safe "is not null" / "is not true|false".
    IsNot,
    /// Case-sensitive pattern match.
    Like,
    /// Case-insensitive pattern match.
    ILike,
}

/// Suffix tokens, longest first so `_not_in` wins over `_in`.
const SUFFIXES: [(&str, Operator); 8] = [
    ("not_in", Operator::NotIn),
    ("is_not", Operator::IsNot),
    ("ilike", Operator::ILike),
    ("like", Operator::Like),
    ("gte", Operator::Gte),
    ("lte", Operator::Lte),
    ("ne", Operator::Ne),
    ("in", Operator::In),
];

impl Operator {
    /// Key suffix token. Equality has none.
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::IsNot => "is_not",
            Operator::Like => "like",
            Operator::ILike => "ilike",
        }
    }

    /// Parse a suffix token.
    pub fn from_token(token: &str) -> Option<Self> {
        SUFFIXES
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, op)| *op)
    }
}

/// Candidate `(attribute, operator)` readings of a filter key, most specific first.
///
/// The bare key (equality) comes first, then every recognised suffix that
/// strips to a non-empty attribute.
pub fn key_candidates(key: &str) -> Vec<(&str, Operator)> {
    let mut candidates = vec![(key, Operator::Eq)];
    for (token, op) in SUFFIXES {
        if let Some(attr) = key
            .strip_suffix(token)
            .and_then(|rest| rest.strip_suffix('_'))
        {
            if !attr.is_empty() {
                candidates.push((attr, op));
            }
        }
    }
    candidates
}

/// The column a filter applies to.
#[derive(Debug, Clone)]
pub struct FilterTarget<'a> {
    /// Filter key as supplied by the caller.
    pub key: &'a str,
    /// Qualified column.
    pub column: ColumnRef,
    /// Column mapping.
    pub mapping: &'a ColumnMapping,
}

impl FilterTarget<'_> {
    fn coerce(&self, value: &Value) -> Result<Value, Error> {
        self.mapping.semantic_type.coerce(value).ok_or_else(|| {
            Error::invalid_value(
                self.key,
                format!(
                    "expected {} value, got {}",
                    self.mapping.semantic_type,
                    value.kind()
                ),
            )
        })
    }
}

/// Predicate-construction strategy for one operator.
pub trait OperatorStrategy: Send + Sync {
    /// Operator implemented by this strategy.
    fn operator(&self) -> Operator;

    /// Whether the operator applies to columns of `semantic_type`.
    fn supports(&self, semantic_type: SemanticType) -> bool;

    /// Build the predicate, validating the value against the column type.
    fn build(&self, target: &FilterTarget<'_>, value: &Value) -> Result<Predicate, Error>;
}

struct EqualityStrategy;

impl OperatorStrategy for EqualityStrategy {
    fn operator(&self) -> Operator {
        Operator::Eq
    }

    fn supports(&self, _: SemanticType) -> bool {
        true
    }

    fn build(&self, target: &FilterTarget<'_>, value: &Value) -> Result<Predicate, Error> {
        if value.is_null() {
            return Ok(Predicate::IsNull(target.column.clone()));
        }
        Ok(Predicate::Compare {
            column: target.column.clone(),
            op: Comparison::Eq,
            value: target.coerce(value)?,
        })
    }
}

struct InequalityStrategy;

impl OperatorStrategy for InequalityStrategy {
    fn operator(&self) -> Operator {
        Operator::Ne
    }

    fn supports(&self, _: SemanticType) -> bool {
        true
    }

    fn build(&self, target: &FilterTarget<'_>, value: &Value) -> Result<Predicate, Error> {
        // Null on either side never satisfies inequality.
        if value.is_null() {
            return Ok(Predicate::Never);
        }
        Ok(Predicate::All(vec![
            Predicate::IsNotNull(target.column.clone()),
            Predicate::Compare {
                column: target.column.clone(),
                op: Comparison::Ne,
                value: target.coerce(value)?,
            },
        ]))
    }
}

struct RangeStrategy {
    op: Operator,
}

impl OperatorStrategy for RangeStrategy {
    fn operator(&self) -> Operator {
        self.op
    }

    fn supports(&self, semantic_type: SemanticType) -> bool {
        semantic_type.is_orderable()
    }

    fn build(&self, target: &FilterTarget<'_>, value: &Value) -> Result<Predicate, Error> {
        if value.is_null() {
            return Err(Error::invalid_value(target.key, "range bound cannot be null"));
        }
        let op = match self.op {
            Operator::Gte => Comparison::Gte,
            _ => Comparison::Lte,
        };
        Ok(Predicate::Compare {
            column: target.column.clone(),
            op,
            value: target.coerce(value)?,
        })
    }
}

struct MembershipStrategy {
    negated: bool,
}

impl OperatorStrategy for MembershipStrategy {
    fn operator(&self) -> Operator {
        if self.negated {
            Operator::NotIn
        } else {
            Operator::In
        }
    }

    fn supports(&self, _: SemanticType) -> bool {
        true
    }

    fn build(&self, target: &FilterTarget<'_>, value: &Value) -> Result<Predicate, Error> {
        let items: &[Value] = match value {
            Value::List(items) => items,
            scalar => std::slice::from_ref(scalar),
        };
        // Null is neither in nor not in any set.
        let values = items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| target.coerce(v))
            .collect::<Result<Vec<_>, _>>()?;

        let column = target.column.clone();
        Ok(match (self.negated, values.is_empty()) {
            (false, true) => Predicate::Never,
            (false, false) => Predicate::In { column, values },
            (true, true) => Predicate::IsNotNull(column),
            (true, false) => Predicate::All(vec![
                Predicate::IsNotNull(column.clone()),
                Predicate::NotIn { column, values },
            ]),
        })
    }
}

struct IsNotStrategy;

impl OperatorStrategy for IsNotStrategy {
    fn operator(&self) -> Operator {
        Operator::IsNot
    }

    fn supports(&self, _: SemanticType) -> bool {
        true
    }

    fn build(&self, target: &FilterTarget<'_>, value: &Value) -> Result<Predicate, Error> {
        match value {
            Value::Null => Ok(Predicate::IsNotNull(target.column.clone())),
            Value::Bool(b) if target.mapping.semantic_type == SemanticType::Bool => {
                Ok(Predicate::DistinctFrom {
                    column: target.column.clone(),
                    value: Value::Bool(*b),
                })
            }
            Value::Bool(_) => Err(Error::invalid_value(
                target.key,
                format!(
                    "boolean is_not needs a bool column, '{}' is {}",
                    target.mapping.name, target.mapping.semantic_type
                ),
            )),
            other => Err(Error::invalid_value(
                target.key,
                format!("is_not expects null or a boolean, got {}", other.kind()),
            )),
        }
    }
}

struct PatternStrategy {
    case_insensitive: bool,
}

impl OperatorStrategy for PatternStrategy {
    fn operator(&self) -> Operator {
        if self.case_insensitive {
            Operator::ILike
        } else {
            Operator::Like
        }
    }

    fn supports(&self, semantic_type: SemanticType) -> bool {
        semantic_type.is_text()
    }

    fn build(&self, target: &FilterTarget<'_>, value: &Value) -> Result<Predicate, Error> {
        let text = value.as_str().ok_or_else(|| {
            Error::invalid_value(
                target.key,
                format!("pattern must be a string, got {}", value.kind()),
            )
        })?;
        let pattern = if text.contains('%') || text.contains('_') {
            text.to_string()
        } else {
            format!("%{text}%")
        };
        Ok(Predicate::Like {
            column: target.column.clone(),
            pattern,
            case_insensitive: self.case_insensitive,
        })
    }
}

/// Maps operators to their strategies.
pub struct OperatorRegistry {
    strategies: HashMap<Operator, Box<dyn OperatorStrategy>>,
}

impl std::fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ops: Vec<&str> = self.strategies.keys().map(Operator::token).collect();
        ops.sort_unstable();
        f.debug_struct("OperatorRegistry").field("operators", &ops).finish()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl OperatorRegistry {
    /// Registry with every built-in operator.
    pub fn standard() -> Self {
        let strategies: Vec<Box<dyn OperatorStrategy>> = vec![
            Box::new(EqualityStrategy),
            Box::new(InequalityStrategy),
            Box::new(RangeStrategy { op: Operator::Gte }),
            Box::new(RangeStrategy { op: Operator::Lte }),
            Box::new(MembershipStrategy { negated: false }),
            Box::new(MembershipStrategy { negated: true }),
            Box::new(IsNotStrategy),
            Box::new(PatternStrategy {
                case_insensitive: false,
            }),
            Box::new(PatternStrategy {
                case_insensitive: true,
            }),
        ];
        Self {
            strategies: strategies.into_iter().map(|s| (s.operator(), s)).collect(),
        }
    }

    /// Strategy for `operator` on a column of `semantic_type`.
    pub fn get(
        &self,
        operator: Operator,
        semantic_type: SemanticType,
    ) -> Result<&dyn OperatorStrategy, Error> {
        let unsupported = || Error::UnsupportedOperator {
            key: String::new(),
            operator: operator.token().to_string(),
            semantic_type: semantic_type.to_string(),
        };
        let strategy = self.strategies.get(&operator).ok_or_else(unsupported)?;
        if !strategy.supports(semantic_type) {
            return Err(unsupported());
        }
        Ok(strategy.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target<'a>(key: &'a str, mapping: &'a ColumnMapping) -> FilterTarget<'a> {
        FilterTarget {
            key,
            column: ColumnRef::new("t", mapping.column.clone()),
            mapping,
        }
    }

    fn build(op: Operator, mapping: &ColumnMapping, value: Value) -> Result<Predicate, Error> {
        let registry = OperatorRegistry::standard();
        let strategy = registry.get(op, mapping.semantic_type)?;
        strategy.build(&target("k", mapping), &value)
    }

    #[test]
    fn test_key_candidates() {
        assert_eq!(
            key_candidates("price_gte"),
            vec![("price_gte", Operator::Eq), ("price", Operator::Gte)]
        );
        assert_eq!(
            key_candidates("author_id_not_in"),
            vec![
                ("author_id_not_in", Operator::Eq),
                ("author_id", Operator::NotIn),
                ("author_id_not", Operator::In),
            ]
        );
        assert_eq!(
            key_candidates("name_ilike"),
            vec![("name_ilike", Operator::Eq), ("name", Operator::ILike)]
        );
        assert_eq!(key_candidates("_in"), vec![("_in", Operator::Eq)]);
    }

    #[test]
    fn test_token_round_trip() {
        for (token, op) in SUFFIXES {
            assert_eq!(Operator::from_token(token), Some(op));
            assert_eq!(op.token(), token);
        }
        assert_eq!(Operator::from_token("between"), None);
    }

    #[test]
    fn test_equality_null_is_null() {
        let col = ColumnMapping::root("meal_id", SemanticType::Id).nullable();
        assert_eq!(
            build(Operator::Eq, &col, Value::Null).unwrap(),
            Predicate::IsNull(ColumnRef::new("t", "meal_id"))
        );
    }

    #[test]
    fn test_range_rejects_non_orderable_and_bad_values() {
        let flag = ColumnMapping::root("is_food", SemanticType::Bool);
        assert!(matches!(
            build(Operator::Gte, &flag, Value::Bool(true)),
            Err(Error::UnsupportedOperator { .. })
        ));

        let price = ColumnMapping::root("price", SemanticType::Float);
        assert!(matches!(
            build(Operator::Gte, &price, Value::String("ten".into())),
            Err(Error::InvalidFilterValue { .. })
        ));
        assert!(matches!(
            build(Operator::Lte, &price, Value::Null),
            Err(Error::InvalidFilterValue { .. })
        ));
        assert_eq!(
            build(Operator::Gte, &price, Value::Int64(5)).unwrap(),
            Predicate::Compare {
                column: ColumnRef::new("t", "price"),
                op: Comparison::Gte,
                value: Value::Float64(5.0),
            }
        );
    }

    #[test]
    fn test_ne_requires_not_null() {
        let col = ColumnMapping::root("total_time", SemanticType::Integer).nullable();
        let pred = build(Operator::Ne, &col, Value::Int64(10)).unwrap();
        match pred {
            Predicate::All(parts) => {
                assert_eq!(parts[0], Predicate::IsNotNull(ColumnRef::new("t", "total_time")));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(build(Operator::Ne, &col, Value::Null).unwrap(), Predicate::Never);
    }

    #[test]
    fn test_not_in_excludes_nulls() {
        let col = ColumnMapping::root("total_time", SemanticType::Integer).nullable();
        let pred = build(
            Operator::NotIn,
            &col,
            Value::List(vec![Value::Int64(1), Value::Null, Value::Int64(2)]),
        )
        .unwrap();
        let column = ColumnRef::new("t", "total_time");
        assert_eq!(
            pred,
            Predicate::All(vec![
                Predicate::IsNotNull(column.clone()),
                Predicate::NotIn {
                    column,
                    values: vec![Value::Int64(1), Value::Int64(2)],
                },
            ])
        );
    }

    #[test]
    fn test_membership_edge_cases() {
        let col = ColumnMapping::root("privacy", SemanticType::Text);
        assert_eq!(
            build(Operator::In, &col, Value::List(vec![])).unwrap(),
            Predicate::Never
        );
        assert_eq!(
            build(Operator::NotIn, &col, Value::List(vec![Value::Null])).unwrap(),
            Predicate::IsNotNull(ColumnRef::new("t", "privacy"))
        );
        assert_eq!(
            build(Operator::In, &col, Value::String("public".into())).unwrap(),
            Predicate::In {
                column: ColumnRef::new("t", "privacy"),
                values: vec![Value::String("public".into())],
            }
        );
        assert!(build(Operator::In, &col, Value::List(vec![Value::Int64(1)])).is_err());
    }

    #[test]
    fn test_is_not_value_rules() {
        let like = ColumnMapping::root("like", SemanticType::Bool).nullable();
        assert_eq!(
            build(Operator::IsNot, &like, Value::Bool(true)).unwrap(),
            Predicate::DistinctFrom {
                column: ColumnRef::new("t", "like"),
                value: Value::Bool(true),
            }
        );
        assert!(matches!(
            build(Operator::IsNot, &like, Value::Int64(1)),
            Err(Error::InvalidFilterValue { .. })
        ));

        let name = ColumnMapping::root("name", SemanticType::Text);
        assert_eq!(
            build(Operator::IsNot, &name, Value::Null).unwrap(),
            Predicate::IsNotNull(ColumnRef::new("t", "name"))
        );
        assert!(matches!(
            build(Operator::IsNot, &name, Value::Bool(false)),
            Err(Error::InvalidFilterValue { .. })
        ));
    }

    #[test]
    fn test_pattern_only_on_text() {
        let name = ColumnMapping::root("name", SemanticType::Text);
        assert_eq!(
            build(Operator::ILike, &name, Value::String("soup".into())).unwrap(),
            Predicate::Like {
                column: ColumnRef::new("t", "name"),
                pattern: "%soup%".into(),
                case_insensitive: true,
            }
        );
        assert_eq!(
            build(Operator::Like, &name, Value::String("soup%".into())).unwrap(),
            Predicate::Like {
                column: ColumnRef::new("t", "name"),
                pattern: "soup%".into(),
                case_insensitive: false,
            }
        );

        let calories = ColumnMapping::root("calories", SemanticType::Float);
        assert!(matches!(
            build(Operator::Like, &calories, Value::String("1".into())),
            Err(Error::UnsupportedOperator { .. })
        ));
    }
}
