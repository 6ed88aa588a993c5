//! PostgreSQL Backend Implementation
//!
//! This module provides the PostgreSQL-specific implementation of the database
//! backend traits using sqlx as the underlying database driver.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row as SqlxRow, postgres::PgPoolOptions, Column};
use serde_json::Value as JsonValue;
use crate::error::{ModelError, OrmError, OrmResult};
use super::core::*;

/// Connection pool error types
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Connection acquisition failed: {0}")]
    AcquisitionFailed(#[from] sqlx::Error),

    #[error("Pool is closed")]
    PoolClosed,

    #[error("Health check failed: {reason}")]
    HealthCheckFailed { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl From<PoolError> for ModelError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::AcquisitionFailed(sqlx_err) => {
                ModelError::Connection(format!("Database connection failed: {}", sqlx_err))
            }
            PoolError::PoolClosed => ModelError::Connection("Database pool is closed".to_string()),
            PoolError::HealthCheckFailed { reason } => {
                ModelError::Connection(format!("Database health check failed: {}", reason))
            }
            PoolError::ConfigurationError { message } => ModelError::Configuration(message),
        }
    }
}

/// Keep constraint violations distinguishable, add context to everything else
fn query_error(action: &str, err: sqlx::Error) -> OrmError {
    match ModelError::from(err) {
        ModelError::Database(msg) => ModelError::Query(format!("{} failed: {}", action, msg)),
        other => other,
    }
}

/// PostgreSQL database backend implementation
#[derive(Debug, Default)]
pub struct PostgresBackend;

impl PostgresBackend {
    /// Create a new PostgreSQL backend instance
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseBackend for PostgresBackend {
    async fn create_pool(&self, database_url: &str, config: DatabasePoolConfig) -> OrmResult<Arc<dyn DatabasePool>> {
        self.validate_database_url(database_url)?;

        tracing::debug!(
            "Creating database pool with config: max={}, min={}, timeout={}s, idle_timeout={:?}s, max_lifetime={:?}s",
            config.max_connections,
            config.min_connections,
            config.acquire_timeout_seconds,
            config.idle_timeout_seconds,
            config.max_lifetime_seconds
        );

        let mut options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.acquire_timeout_seconds))
            .test_before_acquire(config.test_before_acquire);

        if let Some(idle_timeout) = config.idle_timeout_seconds {
            options = options.idle_timeout(std::time::Duration::from_secs(idle_timeout));
        }

        if let Some(max_lifetime) = config.max_lifetime_seconds {
            options = options.max_lifetime(std::time::Duration::from_secs(max_lifetime));
        }

        let sqlx_pool = options.connect(database_url).await.map_err(|e| {
            tracing::error!("Failed to create database pool: {}", e);
            PoolError::AcquisitionFailed(e)
        })?;

        tracing::info!("Database pool created with {} max connections", config.max_connections);
        Ok(Arc::new(PostgresPool::new(Arc::new(sqlx_pool))))
    }

    fn validate_database_url(&self, url: &str) -> OrmResult<()> {
        if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
            return Err(PoolError::ConfigurationError {
                message: "Invalid PostgreSQL URL scheme".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn parse_database_url(&self, url: &str) -> OrmResult<DatabaseConnectionConfig> {
        self.validate_database_url(url)?;

        let parsed = url::Url::parse(url)
            .map_err(|e| ModelError::Configuration(format!("Invalid database URL: {}", e)))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| ModelError::Configuration("Missing host in database URL".to_string()))?
            .to_string();

        let port = parsed.port().unwrap_or(5432);

        let database = parsed.path().trim_start_matches('/').to_string();
        if database.is_empty() {
            return Err(ModelError::Configuration("Missing database name in URL".to_string()));
        }

        let username = if parsed.username().is_empty() {
            None
        } else {
            Some(parsed.username().to_string())
        };

        let password = parsed.password().map(|p| p.to_string());

        let additional_params: HashMap<String, String> = parsed
            .query_pairs()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        let ssl_mode = additional_params.get("sslmode").cloned();

        Ok(DatabaseConnectionConfig {
            host,
            port,
            database,
            username,
            password,
            ssl_mode,
            additional_params,
        })
    }
}

/// PostgreSQL connection pool implementation
pub struct PostgresPool {
    pool: Arc<Pool<Postgres>>,
}

impl PostgresPool {
    pub fn new(pool: Arc<Pool<Postgres>>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabasePool for PostgresPool {
    async fn begin_transaction(&self) -> OrmResult<Box<dyn DatabaseTransaction>> {
        if self.pool.is_closed() {
            return Err(PoolError::PoolClosed.into());
        }

        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ModelError::Transaction(format!("Failed to begin transaction: {}", e)))?;

        tracing::debug!("Database transaction started");
        Ok(Box::new(PostgresTransaction::new(tx)))
    }

    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        let mut query = sqlx::query(sql);

        for param in params {
            query = bind_database_value(query, param);
        }

        let result = query
            .execute(&*self.pool)
            .await
            .map_err(|e| query_error("Query execution", e))?;

        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        let mut query = sqlx::query(sql);

        for param in params {
            query = bind_database_value(query, param);
        }

        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| query_error("Query fetch", e))?;

        Ok(rows.into_iter().map(|row| Box::new(PostgresRow::new(row)) as Box<dyn DatabaseRow>).collect())
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        let mut query = sqlx::query(sql);

        for param in params {
            query = bind_database_value(query, param);
        }

        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| query_error("Query fetch", e))?;

        Ok(row.map(|r| Box::new(PostgresRow::new(r)) as Box<dyn DatabaseRow>))
    }

    async fn close(&self) -> OrmResult<()> {
        self.pool.close().await;
        Ok(())
    }

    fn stats(&self) -> DatabasePoolStats {
        let total = self.pool.size();
        let idle = self.pool.num_idle() as u32;
        let active = total.saturating_sub(idle);

        DatabasePoolStats {
            total_connections: total,
            idle_connections: idle,
            active_connections: active,
        }
    }

    async fn health_check(&self) -> OrmResult<std::time::Duration> {
        let start = std::time::Instant::now();

        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| PoolError::HealthCheckFailed { reason: e.to_string() })?;

        let duration = start.elapsed();
        tracing::debug!("Database health check passed in {:?}", duration);
        Ok(duration)
    }
}

/// PostgreSQL transaction implementation
pub struct PostgresTransaction {
    tx: Option<sqlx::Transaction<'static, Postgres>>,
}

impl PostgresTransaction {
    pub fn new(tx: sqlx::Transaction<'static, Postgres>) -> Self {
        Self { tx: Some(tx) }
    }

    fn active(&mut self) -> OrmResult<&mut sqlx::Transaction<'static, Postgres>> {
        self.tx
            .as_mut()
            .ok_or_else(|| ModelError::Transaction("Transaction already completed".to_string()))
    }
}

#[async_trait]
impl DatabaseTransaction for PostgresTransaction {
    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        let tx = self.active()?;

        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_database_value(query, param);
        }

        let result = query
            .execute(&mut **tx)
            .await
            .map_err(|e| query_error("Query execution", e))?;

        Ok(result.rows_affected())
    }

    async fn fetch_all(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        let tx = self.active()?;

        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_database_value(query, param);
        }

        let rows = query
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| query_error("Query fetch", e))?;

        Ok(rows.into_iter().map(|row| Box::new(PostgresRow::new(row)) as Box<dyn DatabaseRow>).collect())
    }

    async fn commit(mut self: Box<Self>) -> OrmResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| ModelError::Transaction("Transaction already completed".to_string()))?;

        tx.commit()
            .await
            .map_err(|e| ModelError::Transaction(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!("Database transaction committed");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> OrmResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| ModelError::Transaction("Transaction already completed".to_string()))?;

        tx.rollback()
            .await
            .map_err(|e| ModelError::Transaction(format!("Transaction rollback failed: {}", e)))?;

        tracing::debug!("Database transaction rolled back");
        Ok(())
    }
}

/// PostgreSQL row implementation
pub struct PostgresRow {
    row: sqlx::postgres::PgRow,
}

impl PostgresRow {
    pub fn new(row: sqlx::postgres::PgRow) -> Self {
        Self { row }
    }
}

impl DatabaseRow for PostgresRow {
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue> {
        if index >= self.row.len() {
            return Err(ModelError::ColumnNotFound(format!("#{}", index)));
        }
        postgres_value_to_database_value(&self.row, index)
    }

    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        let index = self
            .row
            .columns()
            .iter()
            .position(|col| col.name() == name)
            .ok_or_else(|| ModelError::ColumnNotFound(name.to_string()))?;

        postgres_value_to_database_value(&self.row, index)
    }

    fn column_count(&self) -> usize {
        self.row.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.row.columns().iter().map(|col| col.name().to_string()).collect()
    }
}

/// Bind a DatabaseValue to a sqlx query
fn bind_database_value<'a>(
    query: sqlx::query::Query<'a, Postgres, sqlx::postgres::PgArguments>,
    value: &DatabaseValue,
) -> sqlx::query::Query<'a, Postgres, sqlx::postgres::PgArguments> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Uuid(u) => query.bind(*u),
        DatabaseValue::DateTime(dt) => query.bind(*dt),
        DatabaseValue::Json(j) => query.bind(j.clone()),
    }
}

/// Convert a PostgreSQL column value to DatabaseValue
fn postgres_value_to_database_value(row: &sqlx::postgres::PgRow, index: usize) -> OrmResult<DatabaseValue> {
    use sqlx::{TypeInfo, ValueRef};

    let column = &row.columns()[index];
    let type_name = column.type_info().name();

    let raw = row
        .try_get_raw(index)
        .map_err(|e| ModelError::Query(format!("Failed to read column '{}': {}", column.name(), e)))?;
    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }

    let decode_err = |kind: &str, e: sqlx::Error| {
        ModelError::Query(format!("Failed to get {} value for '{}': {}", kind, column.name(), e))
    };

    match type_name {
        "BOOL" => row.try_get::<bool, _>(index).map(DatabaseValue::Bool).map_err(|e| decode_err("bool", e)),
        "INT2" => row
            .try_get::<i16, _>(index)
            .map(|v| DatabaseValue::Int32(v as i32))
            .map_err(|e| decode_err("int16", e)),
        "INT4" => row.try_get::<i32, _>(index).map(DatabaseValue::Int32).map_err(|e| decode_err("int32", e)),
        "INT8" => row.try_get::<i64, _>(index).map(DatabaseValue::Int64).map_err(|e| decode_err("int64", e)),
        "FLOAT4" => row
            .try_get::<f32, _>(index)
            .map(|v| DatabaseValue::Float64(v as f64))
            .map_err(|e| decode_err("float32", e)),
        "FLOAT8" => row.try_get::<f64, _>(index).map(DatabaseValue::Float64).map_err(|e| decode_err("float64", e)),
        "UUID" => row.try_get::<uuid::Uuid, _>(index).map(DatabaseValue::Uuid).map_err(|e| decode_err("UUID", e)),
        "TIMESTAMPTZ" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(index)
            .map(DatabaseValue::DateTime)
            .map_err(|e| decode_err("datetime", e)),
        "TIMESTAMP" => row
            .try_get::<chrono::NaiveDateTime, _>(index)
            .map(|v| DatabaseValue::DateTime(v.and_utc()))
            .map_err(|e| decode_err("datetime", e)),
        "JSON" | "JSONB" => row.try_get::<JsonValue, _>(index).map(DatabaseValue::Json).map_err(|e| decode_err("JSON", e)),
        _ => row
            .try_get::<String, _>(index)
            .map(DatabaseValue::String)
            .map_err(|e| decode_err(type_name, e)),
    }
}
