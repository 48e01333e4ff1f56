//! Predicate fragments.
//!
//! Predicates are built by operator strategies and the tag matcher and only
//! become SQL in [`super::sql`].

use menudb_proto::Value;

/// A column qualified by its table alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Table alias.
    pub alias: String,
    /// Physical column.
    pub column: String,
}

impl ColumnRef {
    /// Create a column reference.
    pub fn new(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }
}

/// Binary comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gte,
    Lte,
}

impl Comparison {
    /// SQL operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Gte => ">=",
            Comparison::Lte => "<=",
        }
    }
}

/// A boolean condition over columns and bound values.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column <op> value`.
    Compare {
        column: ColumnRef,
        op: Comparison,
        value: Value,
    },
    /// `column IS NULL`.
    IsNull(ColumnRef),
    /// `column IS NOT NULL`.
    IsNotNull(ColumnRef),
    /// Null-safe inequality: true when `column` is null or differs from `value`.
    DistinctFrom { column: ColumnRef, value: Value },
    /// `column IN (values)`. Never rendered with an empty list.
    In { column: ColumnRef, values: Vec<Value> },
    /// `column NOT IN (values)`. Never rendered with an empty list.
    NotIn { column: ColumnRef, values: Vec<Value> },
    /// Pattern match.
    Like {
        column: ColumnRef,
        pattern: String,
        case_insensitive: bool,
    },
    /// Conjunction. Empty means true.
    All(Vec<Predicate>),
    /// Disjunction. Empty means false.
    Any(Vec<Predicate>),
    /// Matches nothing.
    Never,
}

impl Predicate {
    /// `column = value`.
    pub fn eq(column: ColumnRef, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            column,
            op: Comparison::Eq,
            value: value.into(),
        }
    }

    /// Conjunction that flattens a single-element list.
    pub fn all(mut predicates: Vec<Predicate>) -> Self {
        if predicates.len() == 1 {
            predicates.remove(0)
        } else {
            Predicate::All(predicates)
        }
    }

    /// Disjunction that flattens a single-element list.
    pub fn any(mut predicates: Vec<Predicate>) -> Self {
        if predicates.len() == 1 {
            predicates.remove(0)
        } else {
            Predicate::Any(predicates)
        }
    }

    /// Collect every column the predicate reads.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::IsNull(column)
            | Predicate::IsNotNull(column)
            | Predicate::DistinctFrom { column, .. }
            | Predicate::In { column, .. }
            | Predicate::NotIn { column, .. }
            | Predicate::Like { column, .. } => out.push(column),
            Predicate::All(items) | Predicate::Any(items) => {
                for item in items {
                    item.collect_columns(out);
                }
            }
            Predicate::Never => {}
        }
    }
}
