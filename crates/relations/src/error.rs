//! Error types for the relationship layer
//!
//! Provides error handling for edge writes, eager loading, query building
//! and schema migrations. Every failure keeps a distinguishable kind so
//! callers can tell an expected duplicate apart from a broken connection.

use std::fmt;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Database connection or query error
    Database(String),
    /// Model not found in database
    NotFound(String),
    /// Primary key is missing or invalid
    MissingPrimaryKey,
    /// Relationship loading failed
    Relationship(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// Migration error
    Migration(String),
    /// Connection pool error
    Connection(String),
    /// Transaction error
    Transaction(String),
    /// Query building error
    Query(String),
    /// Configuration error
    Configuration(String),
    /// Requested column is not part of the row
    ColumnNotFound(String),
    /// A unique constraint rejected a write
    UniqueViolation(String),
    /// Attempted to relate a node to itself
    InvalidEdge(String),
    /// The unordered pair is already stored
    DuplicateEdge(String),
    /// Relationship read before it was eager loaded
    NotLoaded(String),
}

impl ModelError {
    /// True for the expected outcome of re-linking an existing pair
    pub fn is_duplicate_edge(&self) -> bool {
        matches!(self, ModelError::DuplicateEdge(_))
    }

    /// True for a unique constraint violation reported by the store
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, ModelError::UniqueViolation(_))
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::NotFound(table) => write!(f, "Record not found in table '{}'", table),
            ModelError::MissingPrimaryKey => write!(f, "Primary key is missing or invalid"),
            ModelError::Relationship(msg) => write!(f, "Relationship error: {}", msg),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::Migration(msg) => write!(f, "Migration error: {}", msg),
            ModelError::Connection(msg) => write!(f, "Connection error: {}", msg),
            ModelError::Transaction(msg) => write!(f, "Transaction error: {}", msg),
            ModelError::Query(msg) => write!(f, "Query error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ModelError::ColumnNotFound(column) => write!(f, "Column '{}' not found", column),
            ModelError::UniqueViolation(msg) => write!(f, "Unique constraint violation: {}", msg),
            ModelError::InvalidEdge(msg) => write!(f, "Invalid edge: {}", msg),
            ModelError::DuplicateEdge(msg) => write!(f, "Duplicate edge: {}", msg),
            ModelError::NotLoaded(relation) => {
                write!(f, "Relationship '{}' has not been loaded", relation)
            }
        }
    }
}

impl std::error::Error for ModelError {}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                ModelError::UniqueViolation(
                    db_err
                        .constraint()
                        .map(str::to_string)
                        .unwrap_or_else(|| db_err.message().to_string()),
                )
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                ModelError::Connection(err.to_string())
            }
            other => ModelError::Database(other.to_string()),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

/// Error types for query builder operations
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Invalid SQL identifier
    InvalidIdentifier(String),
    /// Invalid parameter binding
    InvalidParameter(String),
    /// Unsupported operation
    UnsupportedOperation(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::InvalidIdentifier(msg) => write!(f, "Invalid identifier: {}", msg),
            QueryError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            QueryError::UnsupportedOperation(msg) => write!(f, "Unsupported operation: {}", msg),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<QueryError> for ModelError {
    fn from(err: QueryError) -> Self {
        ModelError::Query(err.to_string())
    }
}

/// Error types for migration operations
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationError {
    /// Two migrations share a name
    DuplicateName(String),
    /// Migration already applied
    AlreadyApplied(String),
    /// Migration rollback failed
    RollbackFailed(String),
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::DuplicateName(msg) => write!(f, "Duplicate migration name: {}", msg),
            MigrationError::AlreadyApplied(msg) => write!(f, "Migration already applied: {}", msg),
            MigrationError::RollbackFailed(msg) => write!(f, "Migration rollback failed: {}", msg),
        }
    }
}

impl std::error::Error for MigrationError {}

impl From<MigrationError> for ModelError {
    fn from(err: MigrationError) -> Self {
        ModelError::Migration(err.to_string())
    }
}
