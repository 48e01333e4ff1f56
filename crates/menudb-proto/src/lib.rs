//! menudb caller-facing types.
//!
//! This crate defines what application services hand to the repository layer:
//! loosely typed filter values, ordered filter specifications, tag criteria
//! and paging options.
//!
//! # Modules
//!
//! - [`value`] - Runtime value types for filter values and storage rows
//! - [`filter`] - Filter specifications and tag criteria
//! - [`query`] - Ordering, pagination and per-call options
//! - [`error`] - Decoding error types

pub mod error;
pub mod filter;
pub mod query;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use filter::{
    FilterSpec, TagCriterion, TagFilter, TagMatchMode, SORT_KEY, TAGS_ANY_KEY, TAGS_KEY,
    TAGS_NOT_EXISTS_KEY,
};
pub use query::{OrderDirection, OrderSpec, Pagination, QueryOptions};
pub use value::Value;
