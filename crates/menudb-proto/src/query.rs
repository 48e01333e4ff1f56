//! Ordering, pagination and per-call query options.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Order specification for sorting results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Logical attribute to order by.
    pub field: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

impl OrderSpec {
    /// Create an ascending order spec.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Create a descending order spec.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parse a sort token of the form `field` or `-field`.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        match token.strip_prefix('-') {
            Some("") => None,
            Some(field) => Some(Self::desc(field)),
            None if token.is_empty() => None,
            None => Some(Self::asc(token.strip_prefix('+').unwrap_or(token))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// Offset/limit pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of results to return. `None` means the configured default.
    pub limit: Option<u32>,
    /// Number of results to skip.
    pub offset: u32,
}

impl Pagination {
    /// Create pagination with limit and offset.
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }

    /// Create pagination with just a limit.
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: 0,
        }
    }
}

/// Per-call options accompanying a filter specification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Paging window.
    pub pagination: Pagination,
    /// Return soft-deleted entities as well.
    pub include_discarded: bool,
    /// Caller deadline for the storage round-trip. Falls back to the
    /// repository's configured query timeout.
    pub deadline: Option<Duration>,
}

impl QueryOptions {
    /// Options with default paging and discarded rows excluded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pagination.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Include soft-deleted entities.
    pub fn including_discarded(mut self) -> Self {
        self.include_discarded = true;
        self
    }

    /// Set a deadline for the storage round-trip.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
