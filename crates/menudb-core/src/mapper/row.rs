//! Storage rows and write payloads.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use menudb_proto::Value;

use crate::domain::Tag;
use crate::error::Error;
use crate::query::TAGS_COLUMN;

/// One result row: column names and values in select order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Create a row.
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Row equivalent to what storage returns after writing `payload`.
    pub fn from_payload(payload: &WritePayload) -> Result<Self, Error> {
        let mut columns = payload.columns.clone();
        let tags = serde_json::to_string(&payload.tags)
            .map_err(|e| Error::Mapping(format!("cannot encode tags: {e}")))?;
        columns.push((TAGS_COLUMN.to_string(), Value::String(tags)));
        Ok(Self { columns })
    }

    /// All columns.
    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }

    /// Value of `name`, if the row has that column.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    fn required(&self, name: &str) -> Result<&Value, Error> {
        self.get(name)
            .ok_or_else(|| Error::Mapping(format!("missing column '{name}'")))
    }

    fn non_null<T>(&self, name: &str, value: Option<T>) -> Result<T, Error> {
        value.ok_or_else(|| Error::Mapping(format!("column '{name}' is null")))
    }

    fn mismatch(name: &str, expected: &str, value: &Value) -> Error {
        Error::Mapping(format!(
            "column '{name}' expected {expected}, got {}",
            value.kind()
        ))
    }

    /// Nullable text column.
    pub fn opt_string(&self, name: &str) -> Result<Option<String>, Error> {
        match self.required(name)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            other => Err(Self::mismatch(name, "text", other)),
        }
    }

    /// Non-null text column.
    pub fn string(&self, name: &str) -> Result<String, Error> {
        let value = self.opt_string(name)?;
        self.non_null(name, value)
    }

    /// Nullable integer column.
    pub fn opt_i64(&self, name: &str) -> Result<Option<i64>, Error> {
        match self.required(name)? {
            Value::Null => Ok(None),
            Value::Int64(i) => Ok(Some(*i)),
            other => Err(Self::mismatch(name, "integer", other)),
        }
    }

    /// Nullable float column. Integers are widened.
    pub fn opt_f64(&self, name: &str) -> Result<Option<f64>, Error> {
        match self.required(name)? {
            Value::Null => Ok(None),
            Value::Float64(f) => Ok(Some(*f)),
            Value::Int64(i) => Ok(Some(*i as f64)),
            other => Err(Self::mismatch(name, "float", other)),
        }
    }

    /// Nullable boolean column, stored either as a bool or as 0/1.
    pub fn opt_bool(&self, name: &str) -> Result<Option<bool>, Error> {
        match self.required(name)? {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(*b)),
            Value::Int64(0) => Ok(Some(false)),
            Value::Int64(1) => Ok(Some(true)),
            other => Err(Self::mismatch(name, "bool", other)),
        }
    }

    /// Non-null boolean column.
    pub fn bool(&self, name: &str) -> Result<bool, Error> {
        let value = self.opt_bool(name)?;
        self.non_null(name, value)
    }

    /// Non-null timestamp column, stored natively or as RFC 3339 text.
    pub fn timestamp(&self, name: &str) -> Result<DateTime<Utc>, Error> {
        match self.required(name)? {
            Value::Timestamp(t) => Ok(*t),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::Mapping(format!("column '{name}': {e}"))),
            Value::Null => Err(Error::Mapping(format!("column '{name}' is null"))),
            other => Err(Self::mismatch(name, "timestamp", other)),
        }
    }

    /// Tags projected into the row. A row without tag projection has none.
    pub fn tags(&self) -> Result<BTreeSet<Tag>, Error> {
        match self.get(TAGS_COLUMN) {
            None | Some(Value::Null) => Ok(BTreeSet::new()),
            Some(Value::String(json)) => serde_json::from_str(json)
                .map_err(|e| Error::Mapping(format!("malformed tags: {e}"))),
            Some(other) => Err(Self::mismatch(TAGS_COLUMN, "json text", other)),
        }
    }
}

/// Storage projection of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct WritePayload {
    /// Entity identifier.
    pub id: String,
    /// Root-table columns and values, identifier included.
    pub columns: Vec<(String, Value)>,
    /// Tags to link.
    pub tags: Vec<Tag>,
}

impl WritePayload {
    /// Value written to `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(columns: &[(&str, Value)]) -> Row {
        Row::new(
            columns
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_accessors_coerce_storage_representations() {
        let r = row(&[
            ("flag", Value::Int64(1)),
            ("price", Value::Int64(3)),
            ("created_at", Value::String("2024-05-01T10:00:00.000000000Z".into())),
            ("name", Value::String("Soup".into())),
            ("barcode", Value::Null),
        ]);
        assert!(r.bool("flag").unwrap());
        assert_eq!(r.opt_f64("price").unwrap(), Some(3.0));
        assert_eq!(r.timestamp("created_at").unwrap().to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert_eq!(r.string("name").unwrap(), "Soup");
        assert_eq!(r.opt_string("barcode").unwrap(), None);
    }

    #[test]
    fn test_incompatible_rows_fail_with_mapping_error() {
        let r = row(&[
            ("name", Value::Null),
            ("flag", Value::Int64(7)),
            ("total_time", Value::String("ten".into())),
        ]);
        assert!(matches!(r.string("name"), Err(Error::Mapping(_))));
        assert!(matches!(r.bool("flag"), Err(Error::Mapping(_))));
        assert!(matches!(r.opt_i64("total_time"), Err(Error::Mapping(_))));
        assert!(matches!(r.string("missing"), Err(Error::Mapping(_))));
    }

    #[test]
    fn test_tags_column() {
        let r = row(&[(
            TAGS_COLUMN,
            Value::String(
                r#"[{"key":"diet","value":"vegan","author_id":"u1","type":"recipe"}]"#.into(),
            ),
        )]);
        let tags = r.tags().unwrap();
        assert_eq!(tags.len(), 1);
        assert!(tags.contains(&Tag::new("diet", "vegan", "u1", "recipe")));

        assert!(row(&[]).tags().unwrap().is_empty());
        assert!(matches!(
            row(&[(TAGS_COLUMN, Value::String("{".into()))]).tags(),
            Err(Error::Mapping(_))
        ));
    }
}
