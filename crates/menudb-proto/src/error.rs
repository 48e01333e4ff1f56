//! Decoding error types.

use thiserror::Error;

/// Errors raised while decoding caller input into filter specifications.
#[derive(Debug, Error)]
pub enum Error {
    /// A value could not be represented as a filter value.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A filter key carried a value of the wrong shape.
    #[error("invalid value for filter '{key}': {reason}")]
    InvalidFilterValue {
        /// Filter key as supplied by the caller.
        key: String,
        /// Human readable reason.
        reason: String,
    },

    /// The filter specification itself is malformed.
    #[error("invalid filter specification: {0}")]
    InvalidSpec(String),
}

impl Error {
    /// Build an `InvalidFilterValue` error.
    pub fn invalid_filter_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidFilterValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
