//! Query Builder SELECT operations

use super::builder::QueryBuilder;
use super::types::{AggregateFunction, SqlCast};
use crate::field::Field;
use crate::model::Model;

impl<M> QueryBuilder<M> {
    /// Add SELECT fields to the query
    pub fn select(mut self, fields: &str) -> Self {
        if fields == "*" {
            self.select_fields.push("*".to_string());
        } else {
            self.select_fields.extend(
                fields
                    .split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty()),
            );
        }
        self
    }

    /// Add SELECT DISTINCT to the query
    pub fn select_distinct(mut self, fields: &str) -> Self {
        self.distinct = true;
        self.select(fields)
    }

    /// Set the FROM table
    pub fn from(mut self, table: &str) -> Self {
        self.from_tables = vec![table.to_string()];
        self
    }

    /// Add custom SELECT expression
    pub fn select_raw(mut self, expression: &str) -> Self {
        self.select_fields.push(expression.to_string());
        self
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Select a typed column, qualified with its table
    pub fn select_field<F: Model, T>(mut self, field: Field<F, T>) -> Self {
        self.select_fields.push(field.qualified());
        self
    }

    /// Add an aggregate column labelled `label`.
    ///
    /// With a `cast`, the column is converted before the function runs and the
    /// result is converted back to the same type, so a SUM over INTEGER
    /// columns can be widened to BIGINT without the driver receiving NUMERIC.
    ///
    /// `label` must be a plain identifier; executing a query with any other
    /// label fails with [`ModelError::Query`](crate::error::ModelError::Query)
    /// before it reaches the database.
    pub fn aggregate<F: Model, T>(
        mut self,
        function: AggregateFunction,
        field: Field<F, T>,
        cast: Option<SqlCast>,
        label: &str,
    ) -> Self {
        let column = field.qualified();
        let expression = match cast {
            Some(target) => format!(
                "CAST({}(CAST({} AS {})) AS {}) AS {}",
                function, column, target, target, label
            ),
            None => format!("{}({}) AS {}", function, column, label),
        };
        self.select_fields.push(expression);
        self.aggregate_labels.push(label.to_string());
        self
    }

    /// SUM shorthand for [`aggregate`](Self::aggregate)
    pub fn sum<F: Model, T>(self, field: Field<F, T>, cast: Option<SqlCast>, label: &str) -> Self {
        self.aggregate(AggregateFunction::Sum, field, cast, label)
    }
}
