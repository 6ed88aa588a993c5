//! Migration Runner - Executes migrations against the database
//!
//! Each migration's statements and its bookkeeping row run in one
//! transaction, so a migration is either fully applied and recorded or
//! leaves no trace.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use super::definitions::{Migration, MigrationConfig, MigrationRecord, MigrationRunResult, Migrations};
use crate::backends::{DatabasePool, DatabaseRowExt, DatabaseTransaction};
use crate::error::{MigrationError, OrmError, OrmResult};
use crate::query::QueryBuilder;

/// Migration runner that executes migrations against a database
pub struct MigrationRunner {
    pool: Arc<dyn DatabasePool>,
    migrations: Migrations,
    config: MigrationConfig,
}

impl MigrationRunner {
    /// Create a new migration runner
    pub fn new(pool: Arc<dyn DatabasePool>, migrations: Migrations) -> Self {
        Self::with_config(pool, migrations, MigrationConfig::default())
    }

    /// Create a runner tracking migrations in a custom table
    pub fn with_config(pool: Arc<dyn DatabasePool>, migrations: Migrations, config: MigrationConfig) -> Self {
        Self {
            pool,
            migrations,
            config,
        }
    }

    pub fn migrations(&self) -> &Migrations {
        &self.migrations
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Run all pending migrations in order
    pub async fn run(&self) -> OrmResult<MigrationRunResult> {
        self.ensure_migrations_table().await?;

        let applied = self.records().await?;
        let applied_names: HashSet<&str> = applied.iter().map(|r| r.name.as_str()).collect();
        let batch = applied.iter().map(|r| r.batch).max().unwrap_or(0) + 1;

        let mut applied_migrations = Vec::new();
        let mut skipped_count = 0;
        for migration in self.migrations.iter() {
            if applied_names.contains(migration.name()) {
                skipped_count += 1;
                continue;
            }

            tracing::info!("Applying migration: {}", migration.name());
            self.apply(migration, batch).await?;
            applied_migrations.push(migration.name().to_string());
        }

        Ok(MigrationRunResult {
            applied_migrations,
            skipped_count,
            batch,
        })
    }

    /// Revert the most recently applied migration.
    ///
    /// Returns the reverted migration's name, or `None` when nothing is
    /// applied.
    pub async fn rollback_last(&self) -> OrmResult<Option<String>> {
        self.ensure_migrations_table().await?;

        let applied = self.records().await?;
        let position = |name: &str| self.migrations.names().iter().position(|n| *n == name);

        let last = match applied
            .iter()
            .max_by_key(|record| (record.batch, position(&record.name)))
        {
            Some(record) => record,
            None => return Ok(None),
        };

        let migration = self.migrations.get(&last.name).ok_or_else(|| {
            MigrationError::RollbackFailed(format!(
                "{} is applied but not part of the configured migrations",
                last.name
            ))
        })?;

        tracing::info!("Rolling back migration: {}", migration.name());

        let (delete_sql, delete_params) = QueryBuilder::<()>::new()
            .delete_from(&self.config.migrations_table)
            .where_eq("name", migration.name())
            .to_sql_with_params();

        let mut transaction = self.pool.begin_transaction().await?;
        let outcome = async {
            run_statements(transaction.as_mut(), migration.name(), &migration.revert()).await?;
            transaction.execute(&delete_sql, &delete_params).await?;
            Ok::<(), OrmError>(())
        }
        .await;

        finish(transaction, outcome, migration.name()).await?;
        Ok(Some(migration.name().to_string()))
    }

    /// Records of applied migrations, empty before the first run
    pub async fn applied(&self) -> OrmResult<Vec<MigrationRecord>> {
        self.ensure_migrations_table().await?;
        self.records().await
    }

    /// Names of configured migrations not yet applied
    pub async fn pending(&self) -> OrmResult<Vec<String>> {
        let applied = self.applied().await?;

        Ok(self
            .migrations
            .iter()
            .filter(|m| !applied.iter().any(|r| r.name == m.name()))
            .map(|m| m.name().to_string())
            .collect())
    }

    async fn records(&self) -> OrmResult<Vec<MigrationRecord>> {
        let rows = QueryBuilder::<()>::new()
            .select("name, batch, applied_at")
            .from(&self.config.migrations_table)
            .order_by("batch")
            .order_by("applied_at")
            .fetch_rows(self.pool.as_ref())
            .await?;

        rows.iter()
            .map(|row| -> OrmResult<MigrationRecord> {
                Ok(MigrationRecord {
                    name: row.get("name")?,
                    batch: row.get("batch")?,
                    applied_at: row.get("applied_at")?,
                })
            })
            .collect()
    }

    async fn apply(&self, migration: &dyn Migration, batch: i32) -> OrmResult<()> {
        let (record_sql, record_params) = QueryBuilder::<()>::new()
            .insert_into(&self.config.migrations_table)
            .set("name", migration.name())
            .set("batch", batch)
            .set("applied_at", Utc::now())
            .to_sql_with_params();

        let mut transaction = self.pool.begin_transaction().await?;
        let outcome = async {
            run_statements(transaction.as_mut(), migration.name(), &migration.prepare()).await?;
            transaction
                .execute(&record_sql, &record_params)
                .await
                .map_err(|e| OrmError::Migration(format!("Failed to record migration: {}", e)))?;
            Ok::<(), OrmError>(())
        }
        .await;

        finish(transaction, outcome, migration.name()).await
    }

    async fn ensure_migrations_table(&self) -> OrmResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                name VARCHAR(255) PRIMARY KEY,\n    \
                batch INTEGER NOT NULL,\n    \
                applied_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP\n\
            );",
            self.config.migrations_table
        );
        self.pool.execute(&sql, &[]).await.map_err(|e| {
            OrmError::Migration(format!("Failed to create migrations table: {}", e))
        })?;
        Ok(())
    }
}

async fn run_statements(
    transaction: &mut dyn DatabaseTransaction,
    name: &str,
    statements: &[String],
) -> OrmResult<()> {
    for statement in statements.iter().filter(|s| !s.trim().is_empty()) {
        transaction.execute(statement, &[]).await.map_err(|e| {
            OrmError::Migration(format!("Failed to execute migration {}: {}", name, e))
        })?;
    }
    Ok(())
}

/// Commit on success, roll back and surface the original error otherwise
async fn finish(
    transaction: Box<dyn DatabaseTransaction>,
    outcome: OrmResult<()>,
    name: &str,
) -> OrmResult<()> {
    match outcome {
        Ok(()) => transaction
            .commit()
            .await
            .map_err(|e| OrmError::Migration(format!("Failed to commit migration {}: {}", name, e))),
        Err(err) => {
            if let Err(rollback_err) = transaction.rollback().await {
                tracing::warn!("Rollback of migration {} failed: {}", name, rollback_err);
            }
            Err(err)
        }
    }
}
