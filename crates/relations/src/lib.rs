//! # elif-relations: Self-referential relations for elif.rs models
//!
//! Many-to-many relations between rows of the same model (friendships,
//! follows, links between documents), stored once per undirected pair and
//! eager loaded in a fixed number of queries.
//!
//! - [`Field`]: typed column references used by the query builder
//! - [`QueryBuilder`]: typed joins, sort keys and aggregate columns
//! - [`SiblingsRelation`] and [`Siblings`]: relation descriptor and the
//!   per-instance neighbor cache
//! - [`SiblingsLoader`]: batched eager loading
//! - [`SiblingsSchema`] and [`MigrationRunner`]: join table migrations

pub mod backends;
pub mod error;
pub mod field;
pub mod loading;
pub mod migrations;
pub mod model;
pub mod query;
pub mod relationships;
pub mod security;

#[cfg(test)]
mod testing;

pub use backends::{
    DatabaseBackend, DatabasePool, DatabasePoolConfig, DatabaseRow, DatabaseRowExt,
    DatabaseTransaction, DatabaseValue, PostgresBackend, PostgresPool,
};
pub use error::*;
pub use field::Field;
pub use loading::{resolve_neighbors, BatchConfig, LoadReport, SiblingsLoader};
pub use migrations::{
    Migration, MigrationConfig, MigrationRunner, Migrations, ReferentialAction, SchemaBuilder,
    SqlMigration, TableBuilder,
};
pub use model::{Model, ModelKey};
pub use query::{
    AggregateFunction, ComparisonOperator, JoinType, OrderDirection, QueryBuilder, SqlCast,
};
pub use relationships::{
    canonicalize, CanonicalPair, RelationBinding, RelationRegistry, Siblings, SiblingsRelation, SiblingsSchema,
    SiblingsState,
};
