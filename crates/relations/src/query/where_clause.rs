//! Query Builder WHERE clause operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;
use crate::field::Field;
use crate::model::Model;

fn condition(column: &str, operator: QueryOperator, values: Vec<DatabaseValue>) -> WhereCondition {
    WhereCondition {
        column: column.to_string(),
        operator,
        values,
    }
}

impl<M> QueryBuilder<M> {
    fn push_condition(mut self, column: &str, operator: QueryOperator, values: Vec<DatabaseValue>) -> Self {
        self.where_predicates
            .push(WherePredicate::Single(condition(column, operator, values)));
        self
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::Equal, vec![value.into()])
    }

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::NotEqual, vec![value.into()])
    }

    /// Add WHERE condition with greater than
    pub fn where_gt<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::GreaterThan, vec![value.into()])
    }

    /// Add WHERE condition with less than
    pub fn where_lt<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::LessThan, vec![value.into()])
    }

    /// Add WHERE condition with IN. An empty list matches nothing.
    pub fn where_in<T, I>(self, column: &str, values: I) -> Self
    where
        T: Into<DatabaseValue>,
        I: IntoIterator<Item = T>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push_condition(column, QueryOperator::In, values)
    }

    /// Add WHERE condition with IS NULL
    pub fn where_null(self, column: &str) -> Self {
        self.push_condition(column, QueryOperator::IsNull, Vec::new())
    }

    /// Add WHERE condition with IS NOT NULL
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_condition(column, QueryOperator::IsNotNull, Vec::new())
    }

    /// Match rows where any of `columns` is in `values`.
    ///
    /// Renders as `(a IN (..) OR b IN (..))`; the same value list is bound
    /// once per column.
    pub fn where_any_in<T>(mut self, columns: &[&str], values: &[T]) -> Self
    where
        T: Clone + Into<DatabaseValue>,
    {
        let values: Vec<DatabaseValue> = values.iter().cloned().map(Into::into).collect();
        let group = columns
            .iter()
            .map(|column| condition(column, QueryOperator::In, values.clone()))
            .collect();
        self.where_predicates.push(WherePredicate::Any(group));
        self
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Equality on a typed column
    pub fn where_field_eq<F: Model, T: Into<DatabaseValue>>(self, field: Field<F, T>, value: T) -> Self {
        let column = field.qualified();
        self.where_eq(&column, value)
    }

    /// IN on a typed column
    pub fn where_field_in<F: Model, T, I>(self, field: Field<F, T>, values: I) -> Self
    where
        T: Into<DatabaseValue>,
        I: IntoIterator<Item = T>,
    {
        let column = field.qualified();
        self.where_in(&column, values)
    }
}
