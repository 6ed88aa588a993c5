//! Core Model Trait - Base definition for database entities
//!
//! Defines the Model trait with table metadata, primary key handling,
//! declared columns and row decoding. Relationship descriptors and typed
//! field references are parameterized over it.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::backends::{DatabaseRow, DatabaseValue};
use crate::error::ModelResult;

/// Primary keys usable as graph node identifiers.
///
/// Keys must be totally ordered so an undirected edge has exactly one
/// canonical orientation, and hashable so loaded edges can be grouped by
/// parent.
pub trait ModelKey:
    Clone + Send + Sync + Debug + Display + Ord + Hash + Into<DatabaseValue> + for<'de> Deserialize<'de> + 'static
{
    /// Column type used for foreign keys referencing this key
    fn sql_type() -> &'static str;
}

impl ModelKey for uuid::Uuid {
    fn sql_type() -> &'static str {
        "UUID"
    }
}

impl ModelKey for i64 {
    fn sql_type() -> &'static str {
        "BIGINT"
    }
}

impl ModelKey for i32 {
    fn sql_type() -> &'static str {
        "INTEGER"
    }
}

impl ModelKey for String {
    fn sql_type() -> &'static str {
        "TEXT"
    }
}

/// Core trait for database models
pub trait Model: Send + Sync + Debug + Serialize + for<'de> Deserialize<'de> {
    /// The type used for this model's primary key
    type PrimaryKey: ModelKey;

    /// Table name for this model
    fn table_name() -> &'static str;

    /// Primary key field name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Columns declared by this model, used to validate field references
    fn columns() -> &'static [&'static str];

    /// Get the primary key value for this model instance
    fn primary_key(&self) -> Option<Self::PrimaryKey>;

    /// Check if this model's table carries created_at / updated_at
    fn uses_timestamps() -> bool {
        false
    }

    /// Create a model instance from a database row
    fn from_database_row(row: &dyn DatabaseRow) -> ModelResult<Self>
    where
        Self: Sized;
}
