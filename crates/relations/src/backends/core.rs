//! Core Database Backend Traits
//!
//! This module defines the narrow execution contract the relationship layer
//! consumes: run a statement, fetch decoded rows, and group statements in a
//! transaction. Driver specifics live behind these traits.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use crate::error::{ModelError, OrmResult};

/// Abstract database transaction trait
#[async_trait]
pub trait DatabaseTransaction: Send {
    /// Execute a query within the transaction
    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64>;

    /// Execute a query and return result rows within the transaction
    async fn fetch_all(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> OrmResult<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> OrmResult<()>;
}

/// Abstract database connection pool trait
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Begin a transaction from the pool
    async fn begin_transaction(&self) -> OrmResult<Box<dyn DatabaseTransaction>>;

    /// Execute a query directly on the pool
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64>;

    /// Execute a query and return result rows directly on the pool
    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>>;

    /// Execute a query and return the first result row directly on the pool
    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>>;

    /// Close the pool
    async fn close(&self) -> OrmResult<()>;

    /// Get pool statistics
    fn stats(&self) -> DatabasePoolStats;

    /// Perform a health check on the pool
    async fn health_check(&self) -> OrmResult<std::time::Duration>;
}

/// Database pool statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabasePoolStats {
    pub total_connections: u32,
    pub idle_connections: u32,
    pub active_connections: u32,
}

/// Abstract database row trait
pub trait DatabaseRow: Send + Sync {
    /// Get a column value by index
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue>;

    /// Get a column value by name
    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue>;

    /// Get column count
    fn column_count(&self) -> usize;

    /// Get column names
    fn column_names(&self) -> Vec<String>;

    /// Convert row to JSON value
    fn to_json(&self) -> OrmResult<JsonValue> {
        let mut map = serde_json::Map::new();
        for (index, name) in self.column_names().into_iter().enumerate() {
            map.insert(name, self.get_by_index(index)?.to_json());
        }
        Ok(JsonValue::Object(map))
    }

    /// Convert row to HashMap
    fn to_map(&self) -> OrmResult<HashMap<String, DatabaseValue>> {
        let mut map = HashMap::new();
        for (index, name) in self.column_names().into_iter().enumerate() {
            map.insert(name, self.get_by_index(index)?);
        }
        Ok(map)
    }
}

/// Extension trait for DatabaseRow to support typed column access for models
pub trait DatabaseRowExt {
    /// Get a typed value from a column (for model deserialization)
    fn get<T>(&self, column: &str) -> Result<T, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>;

    /// Try to get an optional typed value from a column
    fn try_get<T>(&self, column: &str) -> Result<Option<T>, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>;
}

impl<R: DatabaseRow + ?Sized> DatabaseRowExt for R {
    fn get<T>(&self, column: &str) -> Result<T, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let db_value = self.get_by_name(column)?;
        serde_json::from_value(db_value.to_json())
            .map_err(|e| ModelError::Serialization(format!("Failed to deserialize column '{}': {}", column, e)))
    }

    fn try_get<T>(&self, column: &str) -> Result<Option<T>, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        match self.get_by_name(column) {
            Ok(db_value) if db_value.is_null() => Ok(None),
            Ok(db_value) => serde_json::from_value(db_value.to_json())
                .map(Some)
                .map_err(|e| ModelError::Serialization(format!("Failed to deserialize column '{}': {}", column, e))),
            Err(ModelError::ColumnNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Uuid(uuid::Uuid),
    DateTime(chrono::DateTime<chrono::Utc>),
    Json(JsonValue),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int32(i) => JsonValue::Number(serde_json::Number::from(*i)),
            DatabaseValue::Int64(i) => JsonValue::Number(serde_json::Number::from(*i)),
            DatabaseValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Uuid(u) => JsonValue::String(u.to_string()),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            DatabaseValue::Json(j) => j.clone(),
        }
    }

    /// Render the value as an inline SQL literal (for logging and tests)
    pub fn to_sql_literal(&self) -> String {
        match self {
            DatabaseValue::Null => "NULL".to_string(),
            DatabaseValue::Bool(b) => b.to_string(),
            DatabaseValue::Int32(i) => i.to_string(),
            DatabaseValue::Int64(i) => i.to_string(),
            DatabaseValue::Float64(f) => f.to_string(),
            DatabaseValue::String(s) => format!("'{}'", s.replace('\'', "''")),
            DatabaseValue::Uuid(u) => format!("'{}'", u),
            DatabaseValue::DateTime(dt) => format!("'{}'", dt.to_rfc3339()),
            DatabaseValue::Json(j) => format!("'{}'", j.to_string().replace('\'', "''")),
        }
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int32(value)
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float64(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<uuid::Uuid> for DatabaseValue {
    fn from(value: uuid::Uuid) -> Self {
        DatabaseValue::Uuid(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for DatabaseValue {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(value: JsonValue) -> Self {
        DatabaseValue::Json(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// Database backend trait that provides database-specific implementations
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Create a connection pool from a database URL
    async fn create_pool(&self, database_url: &str, config: DatabasePoolConfig) -> OrmResult<Arc<dyn DatabasePool>>;

    /// Validate a database URL for this backend
    fn validate_database_url(&self, url: &str) -> OrmResult<()>;

    /// Parse connection parameters from a database URL
    fn parse_database_url(&self, url: &str) -> OrmResult<DatabaseConnectionConfig>;
}

/// Database pool configuration
#[derive(Debug, Clone)]
pub struct DatabasePoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: Option<u64>,
    pub max_lifetime_seconds: Option<u64>,
    pub test_before_acquire: bool,
}

impl Default for DatabasePoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600), // 10 minutes
            max_lifetime_seconds: Some(1800), // 30 minutes
            test_before_acquire: true,
        }
    }
}

/// Database connection configuration parsed from URL
#[derive(Debug, Clone)]
pub struct DatabaseConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: Option<String>,
    pub additional_params: HashMap<String, String>,
}
