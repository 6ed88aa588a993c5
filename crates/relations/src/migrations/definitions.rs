//! Migration Definitions - Core types and structures for migrations
//!
//! A [`Migration`] produces the statements that apply and revert one schema
//! change. [`Migrations`] is the ordered set handed to the runner; there is
//! no process-wide registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MigrationError;

/// A reversible schema change
pub trait Migration: Send + Sync {
    /// Unique name, recorded in the tracking table once applied
    fn name(&self) -> &str;

    /// Statements that apply the change
    fn prepare(&self) -> Vec<String>;

    /// Statements that fully undo [`prepare`](Migration::prepare)
    fn revert(&self) -> Vec<String>;
}

/// Migration given as literal SQL statements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlMigration {
    pub name: String,
    pub up: Vec<String>,
    pub down: Vec<String>,
}

impl SqlMigration {
    pub fn new(name: &str, up: Vec<String>, down: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            up,
            down,
        }
    }
}

impl Migration for SqlMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&self) -> Vec<String> {
        self.up.clone()
    }

    fn revert(&self) -> Vec<String> {
        self.down.clone()
    }
}

/// Ordered collection of migrations, applied in insertion order
#[derive(Default)]
pub struct Migrations {
    entries: Vec<Box<dyn Migration>>,
}

impl Migrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a migration; names must be unique
    pub fn add<T: Migration + 'static>(mut self, migration: T) -> Result<Self, MigrationError> {
        if self.get(migration.name()).is_some() {
            return Err(MigrationError::DuplicateName(migration.name().to_string()));
        }
        self.entries.push(Box::new(migration));
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Migration> {
        self.entries
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.entries.iter().map(|m| m.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Migrations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrations")
            .field("names", &self.names())
            .finish()
    }
}

/// Migration status in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Migration name
    pub name: String,
    /// Batch number (for grouping migrations)
    pub batch: i32,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// Configuration for the migration system
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Table name for tracking migrations
    pub migrations_table: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_table: "elif_migrations".to_string(),
        }
    }
}

/// Result of running migrations
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationRunResult {
    /// Names of migrations that were applied, in order
    pub applied_migrations: Vec<String>,
    /// Number of migrations that were skipped (already applied)
    pub skipped_count: usize,
    /// Batch the applied migrations were recorded under
    pub batch: i32,
}

impl MigrationRunResult {
    pub fn applied_count(&self) -> usize {
        self.applied_migrations.len()
    }
}
