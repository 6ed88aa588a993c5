//! Query Builder execution against a [`DatabasePool`]

use serde::de::DeserializeOwned;

use super::builder::QueryBuilder;
use crate::backends::{DatabasePool, DatabaseRow};
use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use crate::security::validate_identifier;

impl<M> QueryBuilder<M> {
    /// Reject aggregate labels that are not plain identifiers
    fn check_labels(&self) -> ModelResult<()> {
        for label in &self.aggregate_labels {
            validate_identifier(label)?;
        }
        Ok(())
    }

    /// Execute the query and return the raw rows
    pub async fn fetch_rows(&self, pool: &dyn DatabasePool) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        self.check_labels()?;
        let (sql, params) = self.to_sql_with_params();
        tracing::debug!(sql = %sql, params = params.len(), "fetching rows");
        pool.fetch_all(&sql, &params).await
    }

    /// Execute an INSERT or DELETE and return the number of affected rows
    pub async fn execute(&self, pool: &dyn DatabasePool) -> ModelResult<u64> {
        self.check_labels()?;
        let (sql, params) = self.to_sql_with_params();
        tracing::debug!(sql = %sql, params = params.len(), "executing statement");
        pool.execute(&sql, &params).await
    }

    /// Execute the query and decode the column named `label` from the first row.
    ///
    /// Zero rows and a SQL NULL both yield `Ok(None)`; an aggregate over an
    /// empty set is absent, not a decode failure.
    pub async fn fetch_aggregate<V>(&self, pool: &dyn DatabasePool, label: &str) -> ModelResult<Option<V>>
    where
        V: DeserializeOwned,
    {
        validate_identifier(label)?;
        self.check_labels()?;

        let (sql, params) = self.to_sql_with_params();
        tracing::debug!(sql = %sql, label, "fetching aggregate");

        let row = match pool.fetch_optional(&sql, &params).await? {
            Some(row) => row,
            None => return Ok(None),
        };

        // A missing label column is a query bug, unlike NULL
        let value = row.get_by_name(label)?;
        if value.is_null() {
            return Ok(None);
        }

        serde_json::from_value(value.to_json()).map(Some).map_err(|e| {
            ModelError::Serialization(format!("Failed to decode aggregate '{}': {}", label, e))
        })
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Execute query and return models
    pub async fn get(&self, pool: &dyn DatabasePool) -> ModelResult<Vec<M>> {
        let rows = self.fetch_rows(pool).await?;
        rows.iter().map(|row| M::from_database_row(row.as_ref())).collect()
    }

    /// Execute query and return first model
    pub async fn first(self, pool: &dyn DatabasePool) -> ModelResult<Option<M>> {
        let mut results = self.limit(1).get(pool).await?;
        Ok(results.pop())
    }

    /// Execute query and return first model or error
    pub async fn first_or_fail(self, pool: &dyn DatabasePool) -> ModelResult<M> {
        self.first(pool)
            .await?
            .ok_or_else(|| ModelError::NotFound(M::table_name().to_string()))
    }
}
