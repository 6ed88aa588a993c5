//! Migration System
//!
//! Schema changes are described by [`Migration`] values, collected into an
//! ordered [`Migrations`] set and applied by the [`MigrationRunner`].

pub mod definitions;
pub mod runner;
pub mod schema_builder;

pub use definitions::{
    Migration, MigrationConfig, MigrationRecord, MigrationRunResult, Migrations, SqlMigration,
};
pub use runner::MigrationRunner;
pub use schema_builder::{ReferentialAction, SchemaBuilder, TableBuilder};
