//! Fluent query building and execution.

pub mod builder;
pub mod predicate;

pub use builder::{JoinKind, OrderDirection, Paginated, QueryBuilder};
pub use predicate::{Boolean, ConditionSet, Predicate};
