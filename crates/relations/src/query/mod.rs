//! Query Builder Module - Typed, fluent query builder
//!
//! String-based methods mirror plain SQL; the `*_field` variants take
//! [`Field`](crate::field::Field) references so column names and value
//! types are checked by the compiler.

pub mod builder;
pub mod dml;
pub mod execution;
pub mod joins;
pub mod ordering;
pub mod pagination;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use types::{
    AggregateFunction, ComparisonOperator, JoinType, OrderDirection, QueryOperator, SqlCast,
    WhereCondition, WherePredicate,
};
