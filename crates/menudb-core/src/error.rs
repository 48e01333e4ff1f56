//! Core error types.

use std::time::Duration;

use thiserror::Error;

/// Repository engine errors.
///
/// Filter, operator, value and paging errors are raised before any storage
/// round-trip. Storage failures are classified into transient
/// (`StorageUnavailable`, `DeadlineExceeded`) and permanent variants.
#[derive(Debug, Error)]
pub enum Error {
    /// Entity type is not registered.
    #[error("unknown entity type '{0}'")]
    UnknownEntityType(String),

    /// Filter key names no registered attribute.
    #[error("unknown filter key '{key}' for {entity}")]
    UnknownFilterKey { entity: String, key: String },

    /// Operator is unknown or not applicable to the column type.
    #[error("unsupported operator '{operator}' for filter '{key}' ({semantic_type})")]
    UnsupportedOperator {
        key: String,
        operator: String,
        semantic_type: String,
    },

    /// Filter value does not fit the operator or column type.
    #[error("invalid value for filter '{key}': {reason}")]
    InvalidFilterValue { key: String, reason: String },

    /// Requested page size is zero or above the configured maximum.
    #[error("invalid page size {limit} (must be between 1 and {max})")]
    InvalidPageSize { limit: u32, max: u32 },

    /// Static join configuration contains a cycle.
    #[error("join cycle detected for {entity}: {}", aliases.join(" -> "))]
    JoinCycleDetected { entity: String, aliases: Vec<String> },

    /// Static column mapping is inconsistent.
    #[error("invalid mapping: {0}")]
    InvalidMapping(String),

    /// Row or entity could not be converted.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// No matching, non-discarded row.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    /// Storage is temporarily unavailable; safe to retry with backoff.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Caller deadline expired before the storage round-trip completed.
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Write conflicts with a storage constraint.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    /// Permanent storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Malformed caller input rejected while decoding.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Build an `InvalidFilterValue` error.
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidFilterValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// True for errors worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_) | Error::DeadlineExceeded(_))
    }

    /// True for errors caused by the caller's filter specification or paging.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Error::UnknownEntityType(_)
                | Error::UnknownFilterKey { .. }
                | Error::UnsupportedOperator { .. }
                | Error::InvalidFilterValue { .. }
                | Error::InvalidPageSize { .. }
                | Error::Protocol(_)
        )
    }
}

impl From<menudb_proto::Error> for Error {
    fn from(err: menudb_proto::Error) -> Self {
        match err {
            menudb_proto::Error::InvalidFilterValue { key, reason } => {
                Error::InvalidFilterValue { key, reason }
            }
            other => Error::Protocol(other.to_string()),
        }
    }
}
