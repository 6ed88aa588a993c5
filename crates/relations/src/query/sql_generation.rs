//! Query Builder SQL generation

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

/// Destination for rendered values: `$n` placeholders or inline literals
struct ValueSink {
    inline: bool,
    params: Vec<DatabaseValue>,
}

impl ValueSink {
    fn new(inline: bool) -> Self {
        Self {
            inline,
            params: Vec::new(),
        }
    }

    fn push(&mut self, value: &DatabaseValue) -> String {
        if self.inline {
            value.to_sql_literal()
        } else {
            self.params.push(value.clone());
            format!("${}", self.params.len())
        }
    }
}

impl<M> QueryBuilder<M> {
    /// Generate SQL with `$n` placeholders and the values bound to them
    pub fn to_sql_with_params(&self) -> (String, Vec<DatabaseValue>) {
        let mut sink = ValueSink::new(false);
        let sql = self.render(&mut sink);
        (sql, sink.params)
    }

    /// Generate SQL with values inlined as literals (for logs and tests)
    pub fn to_sql(&self) -> String {
        let mut sink = ValueSink::new(true);
        self.render(&mut sink)
    }

    fn render(&self, sink: &mut ValueSink) -> String {
        match self.query_type {
            QueryType::Select => self.build_select_sql(sink),
            QueryType::Insert => self.build_insert_sql(sink),
            QueryType::Delete => self.build_delete_sql(sink),
        }
    }

    fn build_select_sql(&self, sink: &mut ValueSink) -> String {
        let mut sql = String::new();

        if self.distinct {
            sql.push_str("SELECT DISTINCT ");
        } else {
            sql.push_str("SELECT ");
        }

        if self.select_fields.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.select_fields.join(", "));
        }

        if !self.from_tables.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&self.from_tables.join(", "));
        }

        for join in &self.joins {
            sql.push_str(&format!(" {} {}", join.join_type, join.table));
            if !join.on_conditions.is_empty() {
                let conditions: Vec<String> = join
                    .on_conditions
                    .iter()
                    .map(|(left, op, right)| format!("{} {} {}", left, op, right))
                    .collect();
                sql.push_str(" ON ");
                sql.push_str(&conditions.join(" AND "));
            }
        }

        self.build_where_clause(&mut sql, sink);

        if !self.group_by.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", self.group_by.join(", ")));
        }

        if !self.order_by.is_empty() {
            let order_clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_clauses.join(", "));
        }

        if let Some(limit) = self.limit_count {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        sql
    }

    fn build_insert_sql(&self, sink: &mut ValueSink) -> String {
        let table = match &self.insert_table {
            Some(table) => table,
            None => return String::new(),
        };

        if self.set_clauses.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", table);
        }

        let columns: Vec<&str> = self.set_clauses.iter().map(|c| c.column.as_str()).collect();
        let values: Vec<String> = self.set_clauses.iter().map(|c| sink.push(&c.value)).collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            values.join(", ")
        )
    }

    fn build_delete_sql(&self, sink: &mut ValueSink) -> String {
        let mut sql = match &self.delete_table {
            Some(table) => format!("DELETE FROM {}", table),
            None => return String::new(),
        };
        self.build_where_clause(&mut sql, sink);
        sql
    }

    fn build_where_clause(&self, sql: &mut String, sink: &mut ValueSink) {
        if self.where_predicates.is_empty() {
            return;
        }

        let predicates: Vec<String> = self
            .where_predicates
            .iter()
            .map(|predicate| match predicate {
                WherePredicate::Single(condition) => render_condition(condition, sink),
                WherePredicate::Any(group) if group.is_empty() => "FALSE".to_string(),
                WherePredicate::Any(group) => {
                    let parts: Vec<String> =
                        group.iter().map(|c| render_condition(c, sink)).collect();
                    format!("({})", parts.join(" OR "))
                }
            })
            .collect();

        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
}

fn render_condition(condition: &WhereCondition, sink: &mut ValueSink) -> String {
    match condition.operator {
        QueryOperator::IsNull | QueryOperator::IsNotNull => {
            format!("{} {}", condition.column, condition.operator)
        }
        // IN () is a syntax error in PostgreSQL; an empty list matches nothing
        QueryOperator::In if condition.values.is_empty() => "FALSE".to_string(),
        QueryOperator::In => {
            let values: Vec<String> = condition.values.iter().map(|v| sink.push(v)).collect();
            format!("{} IN ({})", condition.column, values.join(", "))
        }
        _ => {
            let value = condition
                .values
                .first()
                .map(|v| sink.push(v))
                .unwrap_or_else(|| "NULL".to_string());
            format!("{} {} {}", condition.column, condition.operator, value)
        }
    }
}
