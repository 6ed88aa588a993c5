//! Database Backend Abstractions
//!
//! The relationship layer talks to the store only through the traits in
//! [`core`]. [`postgres`] provides the sqlx-backed implementation.

pub mod core;
pub mod postgres;

// Re-export core traits and types
pub use self::core::*;
pub use postgres::{PostgresBackend, PostgresPool};
