//! Query Builder JOIN operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::field::Field;
use crate::model::Model;

impl<M> QueryBuilder<M> {
    /// Add INNER JOIN to the query
    pub fn join(self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.push_join(JoinType::Inner, table, left_col, ComparisonOperator::Equal, right_col)
    }

    /// Add LEFT JOIN to the query
    pub fn left_join(self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.push_join(JoinType::Left, table, left_col, ComparisonOperator::Equal, right_col)
    }

    fn push_join(
        mut self,
        join_type: JoinType,
        table: &str,
        left: &str,
        operator: ComparisonOperator,
        right: &str,
    ) -> Self {
        self.joins.push(JoinClause {
            join_type,
            table: table.to_string(),
            on_conditions: vec![(left.to_string(), operator, right.to_string())],
        });
        self
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Join `F`'s table on a typed predicate between a column of this model
    /// and a column of `F`. Both sides must hold the same value type.
    pub fn join_on<F: Model, T>(
        self,
        join_type: JoinType,
        local: Field<M, T>,
        operator: ComparisonOperator,
        foreign: Field<F, T>,
    ) -> Self {
        let local = local.qualified();
        let foreign = foreign.qualified();
        self.push_join(join_type, F::table_name(), &local, operator, &foreign)
    }

    /// INNER JOIN on equality of two typed columns
    pub fn join_field<F: Model, T>(self, local: Field<M, T>, foreign: Field<F, T>) -> Self {
        self.join_on(JoinType::Inner, local, ComparisonOperator::Equal, foreign)
    }
}
