//! Query Builder ORDER BY and GROUP BY operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::field::Field;
use crate::model::Model;

impl<M> QueryBuilder<M> {
    /// Add ORDER BY clause (ascending)
    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), OrderDirection::Asc));
        self
    }

    /// Add ORDER BY clause (descending)
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), OrderDirection::Desc));
        self
    }

    /// Add GROUP BY clause
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by.push(column.to_string());
        self
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Sort by a typed column
    pub fn order_by_field<F: Model, T>(mut self, field: Field<F, T>, direction: OrderDirection) -> Self {
        self.order_by.push((field.qualified(), direction));
        self
    }

    /// Group by a typed column
    pub fn group_by_field<F: Model, T>(mut self, field: Field<F, T>) -> Self {
        self.group_by.push(field.qualified());
        self
    }
}
