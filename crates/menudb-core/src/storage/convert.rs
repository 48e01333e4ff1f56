//! Conversions between engine values and SQLite values, and classification
//! of SQLite failures.

use chrono::SecondsFormat;
use menudb_proto::Value;
use rusqlite::types::Value as SqlValue;
use rusqlite::ErrorCode;

use crate::error::Error;

/// Bind representation of a value.
///
/// Booleans become 0/1 and timestamps fixed-width RFC 3339 text, so stored
/// timestamps compare correctly as text.
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int64(i) => SqlValue::Integer(*i),
        Value::Float64(f) => SqlValue::Real(*f),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Timestamp(t) => SqlValue::Text(t.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        Value::List(_) => SqlValue::Text(value.to_string()),
    }
}

/// Engine representation of a stored value.
pub fn from_sql_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Int64(i),
        SqlValue::Real(f) => Value::Float64(f),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(b) => Value::String(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// Classify a SQLite failure.
pub fn classify(err: rusqlite::Error) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::SystemIoFailure
            | ErrorCode::CannotOpen
            | ErrorCode::OperationInterrupted
            | ErrorCode::FileLockingProtocolFailed => Error::StorageUnavailable(err.to_string()),
            ErrorCode::ConstraintViolation => Error::IntegrityViolation(err.to_string()),
            _ => Error::Storage(err.to_string()),
        },
        _ => Error::Storage(err.to_string()),
    }
}
