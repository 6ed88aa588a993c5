//! Query Builder - Core builder implementation

use std::marker::PhantomData;

use super::types::*;

/// Query builder for constructing database queries.
///
/// Every method consumes the builder and returns it, so a chain of calls
/// composes left to right; joins, predicates and sort keys are rendered in
/// the order they were added.
#[derive(Debug)]
pub struct QueryBuilder<M = ()> {
    pub(crate) query_type: QueryType,
    pub(crate) select_fields: Vec<String>,
    pub(crate) from_tables: Vec<String>,
    pub(crate) insert_table: Option<String>,
    pub(crate) delete_table: Option<String>,
    pub(crate) set_clauses: Vec<SetClause>,
    pub(crate) where_predicates: Vec<WherePredicate>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) group_by: Vec<String>,
    pub(crate) limit_count: Option<i64>,
    pub(crate) offset_value: Option<i64>,
    pub(crate) distinct: bool,
    pub(crate) aggregate_labels: Vec<String>,
    _phantom: PhantomData<M>,
}

impl<M> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            query_type: self.query_type,
            select_fields: self.select_fields.clone(),
            from_tables: self.from_tables.clone(),
            insert_table: self.insert_table.clone(),
            delete_table: self.delete_table.clone(),
            set_clauses: self.set_clauses.clone(),
            where_predicates: self.where_predicates.clone(),
            joins: self.joins.clone(),
            order_by: self.order_by.clone(),
            group_by: self.group_by.clone(),
            limit_count: self.limit_count,
            offset_value: self.offset_value,
            distinct: self.distinct,
            aggregate_labels: self.aggregate_labels.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<M> Default for QueryBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> QueryBuilder<M> {
    /// Create a new query builder
    pub fn new() -> Self {
        Self {
            query_type: QueryType::Select,
            select_fields: Vec::new(),
            from_tables: Vec::new(),
            insert_table: None,
            delete_table: None,
            set_clauses: Vec::new(),
            where_predicates: Vec::new(),
            joins: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            limit_count: None,
            offset_value: None,
            distinct: false,
            aggregate_labels: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Number of WHERE predicates added so far
    pub fn predicate_count(&self) -> usize {
        self.where_predicates.len()
    }
}

impl<M: crate::model::Model> QueryBuilder<M> {
    /// Create a SELECT builder over the model's own table
    pub fn for_model() -> Self {
        Self::new().from(M::table_name())
    }
}
