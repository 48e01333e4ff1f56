//! Semantic column types.

use std::fmt;

use menudb_proto::Value;

/// Semantic type of a filterable column.
///
/// Operators consult this to decide whether they apply to a column and how
/// filter values are coerced before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    /// Opaque identifier stored as text.
    Id,
    /// Free text.
    Text,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point.
    Float,
    /// Boolean stored as 0/1.
    Bool,
    /// UTC timestamp stored as RFC 3339 text.
    Timestamp,
}

impl SemanticType {
    /// Whether range operators apply.
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            SemanticType::Text
                | SemanticType::Integer
                | SemanticType::Float
                | SemanticType::Timestamp
        )
    }

    /// Whether pattern operators apply.
    pub fn is_text(&self) -> bool {
        matches!(self, SemanticType::Text)
    }

    /// Type name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            SemanticType::Id => "id",
            SemanticType::Text => "text",
            SemanticType::Integer => "integer",
            SemanticType::Float => "float",
            SemanticType::Bool => "bool",
            SemanticType::Timestamp => "timestamp",
        }
    }

    /// Coerce a non-null scalar into the representation stored for this type.
    ///
    /// Returns `None` when the value does not fit. Lists and nulls never fit.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (SemanticType::Id | SemanticType::Text, Value::String(s)) => {
                Some(Value::String(s.clone()))
            }
            (SemanticType::Integer, Value::Int64(i)) => Some(Value::Int64(*i)),
            (SemanticType::Float, Value::Float64(_) | Value::Int64(_)) => {
                value.as_f64().map(Value::Float64)
            }
            (SemanticType::Bool, Value::Bool(b)) => Some(Value::Bool(*b)),
            (SemanticType::Timestamp, _) => value.coerce_timestamp().map(Value::Timestamp),
            _ => None,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
