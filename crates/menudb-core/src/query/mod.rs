//! Query planning and rendering.
//!
//! Filter specifications are parsed into operator predicates over mapped
//! columns, joined through the minimal join plan, combined with tag matching
//! and the soft-delete policy, and rendered as one parameterised statement.

mod builder;
mod join;
mod operator;
mod plan;
mod predicate;
mod sql;
mod tag;

pub use builder::{BuildStage, QueryBuilder, QueryEngine};
pub use join::JoinManager;
pub use operator::{key_candidates, FilterTarget, Operator, OperatorRegistry, OperatorStrategy};
pub use plan::{ExecutableQuery, Projection, RenderedQuery, TAGS_COLUMN};
pub use predicate::{ColumnRef, Comparison, Predicate};
pub use sql::quote_ident;
pub use tag::{TagExclusion, TagHaving, TagMatcher, TagPlan};
