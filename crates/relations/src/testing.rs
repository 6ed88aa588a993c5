//! In-memory test doubles
//!
//! [`MemoryPool`] implements [`DatabasePool`] over a handful of tables held
//! in memory. It understands exactly the statement shapes this crate
//! generates, enforces `UNIQUE (..)` constraints declared in `CREATE TABLE`,
//! and logs every statement so tests can count round trips.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backends::{
    DatabasePool, DatabasePoolStats, DatabaseRow, DatabaseRowExt, DatabaseTransaction, DatabaseValue,
};
use crate::error::{ModelError, ModelResult, OrmResult};
use crate::field::Field;
use crate::model::Model;
use crate::relationships::Siblings;

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(skip)]
    pub friends: Siblings<User>,
}

impl User {
    pub const ID: Field<User, Uuid> = Field::new("id");
    pub const NAME: Field<User, String> = Field::new("name");

    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            friends: Siblings::default(),
        }
    }

    /// User with a fixed id, so canonical order is predictable in tests
    pub fn with_id(id: u128, name: &str) -> Self {
        Self {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            friends: Siblings::default(),
        }
    }

    pub fn friends_mut(&mut self) -> &mut Siblings<User> {
        &mut self.friends
    }

    pub fn to_row(&self) -> MemoryRow {
        MemoryRow::new(vec![
            ("id", self.id.into()),
            ("name", self.name.as_str().into()),
        ])
    }
}

impl Model for User {
    type PrimaryKey = Uuid;

    fn table_name() -> &'static str {
        "users"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "name"]
    }

    fn primary_key(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn from_database_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            friends: Siblings::default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friendship {
    pub id: Uuid,
    pub left_id: Uuid,
    pub right_id: Uuid,
}

impl Friendship {
    pub const LEFT: Field<Friendship, Uuid> = Field::new("left_id");
    pub const RIGHT: Field<Friendship, Uuid> = Field::new("right_id");
}

impl Model for Friendship {
    type PrimaryKey = Uuid;

    fn table_name() -> &'static str {
        "friendships"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "left_id", "right_id", "created_at", "updated_at"]
    }

    fn primary_key(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn uses_timestamps() -> bool {
        true
    }

    fn from_database_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            left_id: row.get("left_id")?,
            right_id: row.get("right_id")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: Uuid,
    pub score: i32,
}

impl Post {
    pub const ID: Field<Post, i64> = Field::new("id");
    pub const AUTHOR: Field<Post, Uuid> = Field::new("author_id");
    pub const SCORE: Field<Post, i32> = Field::new("score");
}

impl Model for Post {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "posts"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "author_id", "score"]
    }

    fn primary_key(&self) -> Option<i64> {
        Some(self.id)
    }

    fn from_database_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            author_id: row.get("author_id")?,
            score: row.get("score")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRow {
    columns: Vec<String>,
    values: Vec<DatabaseValue>,
}

impl MemoryRow {
    pub fn new(pairs: Vec<(&str, DatabaseValue)>) -> Self {
        let (columns, values) = pairs
            .into_iter()
            .map(|(column, value)| (column.to_string(), value))
            .unzip();
        Self { columns, values }
    }

    fn value(&self, column: &str) -> DatabaseValue {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i].clone())
            .unwrap_or(DatabaseValue::Null)
    }

    fn project(&self, columns: &[String]) -> MemoryRow {
        if columns.iter().any(|c| c == "*") {
            return self.clone();
        }
        MemoryRow {
            columns: columns.to_vec(),
            values: columns.iter().map(|c| self.value(c)).collect(),
        }
    }
}

impl DatabaseRow for MemoryRow {
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue> {
        self.values
            .get(index)
            .cloned()
            .ok_or_else(|| ModelError::ColumnNotFound(index.to_string()))
    }

    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i].clone())
            .ok_or_else(|| ModelError::ColumnNotFound(name.to_string()))
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Table {
    rows: Vec<MemoryRow>,
    unique: Vec<(String, Vec<String>)>,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Table>,
    log: Vec<(String, Vec<DatabaseValue>)>,
    transactions: Vec<&'static str>,
    responses: Vec<(String, Vec<MemoryRow>)>,
    failures: Vec<(String, ModelError)>,
}

/// In-memory [`DatabasePool`]
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    state: Arc<Mutex<State>>,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Create `table` if needed and append rows to it
    pub fn seed(&self, table: &str, rows: Vec<MemoryRow>) {
        let mut state = self.lock();
        state.tables.entry(table.to_string()).or_default().rows.extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<MemoryRow> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.lock().tables.contains_key(table)
    }

    /// Answer any query containing `fragment` with `rows`
    pub fn respond_with(&self, fragment: &str, rows: Vec<MemoryRow>) {
        self.lock().responses.push((fragment.to_string(), rows));
    }

    /// Fail any statement containing `fragment` with `error`
    pub fn fail_when(&self, fragment: &str, error: ModelError) {
        self.lock().failures.push((fragment.to_string(), error));
    }

    /// Number of statements executed so far
    pub fn query_count(&self) -> usize {
        self.lock().log.len()
    }

    pub fn statements(&self) -> Vec<String> {
        self.lock().log.iter().map(|(sql, _)| sql.clone()).collect()
    }

    pub fn last_params(&self) -> Vec<DatabaseValue> {
        self.lock()
            .log
            .last()
            .map(|(_, params)| params.clone())
            .unwrap_or_default()
    }

    pub fn reset_log(&self) {
        self.lock().log.clear();
    }

    /// Transaction events in order: "begin", "commit", "rollback"
    pub fn transaction_events(&self) -> Vec<&'static str> {
        self.lock().transactions.clone()
    }

    fn run(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<(u64, Vec<MemoryRow>)> {
        let mut state = self.lock();
        state.log.push((sql.to_string(), params.to_vec()));

        if let Some((_, err)) = state.failures.iter().find(|(f, _)| sql.contains(f.as_str())) {
            return Err(err.clone());
        }
        if let Some((_, rows)) = state.responses.iter().find(|(f, _)| sql.contains(f.as_str())) {
            return Ok((rows.len() as u64, rows.clone()));
        }

        interpret(&mut state.tables, sql, params)
    }
}

#[async_trait]
impl DatabasePool for MemoryPool {
    async fn begin_transaction(&self) -> OrmResult<Box<dyn DatabaseTransaction>> {
        let snapshot = {
            let mut state = self.lock();
            state.transactions.push("begin");
            state.tables.clone()
        };
        Ok(Box::new(MemoryTransaction {
            pool: self.clone(),
            snapshot: Some(snapshot),
        }))
    }

    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        self.run(sql, params).map(|(affected, _)| affected)
    }

    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        let (_, rows) = self.run(sql, params)?;
        Ok(rows
            .into_iter()
            .map(|row| Box::new(row) as Box<dyn DatabaseRow>)
            .collect())
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        let (_, rows) = self.run(sql, params)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| Box::new(row) as Box<dyn DatabaseRow>))
    }

    async fn close(&self) -> OrmResult<()> {
        Ok(())
    }

    fn stats(&self) -> DatabasePoolStats {
        DatabasePoolStats::default()
    }

    async fn health_check(&self) -> OrmResult<Duration> {
        Ok(Duration::ZERO)
    }
}

/// Restores the table snapshot unless committed
pub struct MemoryTransaction {
    pool: MemoryPool,
    snapshot: Option<HashMap<String, Table>>,
}

impl MemoryTransaction {
    fn restore(&mut self, event: &'static str) {
        if let Some(snapshot) = self.snapshot.take() {
            let mut state = self.pool.lock();
            state.tables = snapshot;
            state.transactions.push(event);
        }
    }
}

#[async_trait]
impl DatabaseTransaction for MemoryTransaction {
    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        self.pool.run(sql, params).map(|(affected, _)| affected)
    }

    async fn fetch_all(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        self.pool.fetch_all(sql, params).await
    }

    async fn commit(mut self: Box<Self>) -> OrmResult<()> {
        self.snapshot = None;
        self.pool.lock().transactions.push("commit");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> OrmResult<()> {
        self.restore("rollback");
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        self.restore("rollback");
    }
}

// ---------------------------------------------------------------------------
// Statement interpreter
// ---------------------------------------------------------------------------

fn interpret(
    tables: &mut HashMap<String, Table>,
    sql: &str,
    params: &[DatabaseValue],
) -> OrmResult<(u64, Vec<MemoryRow>)> {
    let sql = sql.trim().trim_end_matches(';');

    if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
        let rest = rest.trim_start_matches("IF NOT EXISTS ");
        let name = rest.split(|c: char| c.is_whitespace() || c == '(').next().unwrap_or_default();
        let table = tables.entry(name.to_string()).or_default();
        if table.unique.is_empty() {
            table.unique = unique_constraints(name, rest);
        }
        return Ok((0, Vec::new()));
    }

    if sql.starts_with("CREATE INDEX") || sql.starts_with("CREATE UNIQUE INDEX") {
        return Ok((0, Vec::new()));
    }

    if let Some(rest) = sql.strip_prefix("DROP TABLE ") {
        let name = rest.trim_start_matches("IF EXISTS ").trim();
        tables.remove(name);
        return Ok((0, Vec::new()));
    }

    if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
        return insert(tables, rest, params).map(|n| (n, Vec::new()));
    }

    if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
        let (name, where_sql) = split_where(rest);
        let table = existing(tables, name)?;
        let predicate = parse_where(where_sql, params);
        let before = table.rows.len();
        table.rows.retain(|row| !predicate.iter().all(|term| term.matches(row)));
        return Ok(((before - table.rows.len()) as u64, Vec::new()));
    }

    if let Some(rest) = sql.strip_prefix("SELECT ") {
        return select(tables, rest, params);
    }

    Err(ModelError::Database(format!("unsupported statement: {}", sql)))
}

fn existing<'a>(tables: &'a mut HashMap<String, Table>, name: &str) -> OrmResult<&'a mut Table> {
    tables
        .get_mut(name)
        .ok_or_else(|| ModelError::Database(format!("relation \"{}\" does not exist", name)))
}

/// `UNIQUE (..)` constraints with their declared name, or the name
/// PostgreSQL would generate
fn unique_constraints(table: &str, create_sql: &str) -> Vec<(String, Vec<String>)> {
    create_sql
        .match_indices("UNIQUE (")
        .filter_map(|(at, matched)| {
            let start = at + matched.len();
            let end = create_sql[start..].find(')')? + start;
            let columns: Vec<String> = create_sql[start..end].split(',').map(|c| c.trim().to_string()).collect();

            let mut preceding = create_sql[..at].split_whitespace().rev();
            let name = match (preceding.next(), preceding.next()) {
                (Some(name), Some("CONSTRAINT")) => name.to_string(),
                _ => format!("{}_{}_key", table, columns.join("_")),
            };
            Some((name, columns))
        })
        .collect()
}

fn insert(tables: &mut HashMap<String, Table>, rest: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
    let name = rest.split_whitespace().next().unwrap_or_default();
    let open = rest.find('(').unwrap_or(rest.len());
    let close = rest.find(')').unwrap_or(rest.len());
    let columns: Vec<&str> = rest[open + 1..close].split(',').map(str::trim).collect();

    let values_at = rest.find("VALUES (").map(|i| i + "VALUES (".len()).unwrap_or(rest.len());
    let values_end = rest.rfind(')').unwrap_or(rest.len());
    let values: Vec<DatabaseValue> = rest[values_at..values_end]
        .split(',')
        .map(|token| resolve(token.trim(), params))
        .collect();

    let row = MemoryRow::new(columns.into_iter().zip(values).collect());
    let table = existing(tables, name)?;

    for (constraint, columns) in &table.unique {
        let clash = table.rows.iter().any(|existing| {
            columns
                .iter()
                .all(|column| same_value(&existing.value(column), &row.value(column)))
        });
        if clash {
            return Err(ModelError::UniqueViolation(constraint.clone()));
        }
    }

    table.rows.push(row);
    Ok(1)
}

fn select(
    tables: &mut HashMap<String, Table>,
    rest: &str,
    params: &[DatabaseValue],
) -> OrmResult<(u64, Vec<MemoryRow>)> {
    let rest = rest.trim_start_matches("DISTINCT ");
    let from_at = rest
        .find(" FROM ")
        .ok_or_else(|| ModelError::Database("SELECT without FROM".to_string()))?;
    let columns: Vec<String> = rest[..from_at]
        .split(',')
        .map(|c| unqualify(c.trim()).to_string())
        .collect();

    let (name, where_sql) = split_where(&rest[from_at + " FROM ".len()..]);
    let limit = where_sql
        .split(" LIMIT ")
        .nth(1)
        .and_then(|l| l.split_whitespace().next())
        .and_then(|l| l.parse::<usize>().ok());

    let table = existing(tables, name)?;
    let predicate = parse_where(where_sql, params);
    let rows: Vec<MemoryRow> = table
        .rows
        .iter()
        .filter(|row| predicate.iter().all(|term| term.matches(row)))
        .take(limit.unwrap_or(usize::MAX))
        .map(|row| row.project(&columns))
        .collect();

    Ok((rows.len() as u64, rows))
}

/// Table name and the text after it (WHERE, ORDER BY, LIMIT)
fn split_where(rest: &str) -> (&str, &str) {
    let end = rest.find(' ').unwrap_or(rest.len());
    (&rest[..end], &rest[end..])
}

fn unqualify(column: &str) -> &str {
    let column = column.trim_start_matches('(');
    column.rsplit('.').next().unwrap_or(column)
}

enum Term {
    False,
    Any(Vec<Condition>),
}

enum Condition {
    Equal(String, DatabaseValue),
    NotEqual(String, DatabaseValue),
    In(String, Vec<DatabaseValue>),
    IsNull(String),
    False,
}

impl Condition {
    fn matches(&self, row: &MemoryRow) -> bool {
        match self {
            Condition::Equal(c, v) => same_value(&row.value(c), v),
            Condition::NotEqual(c, v) => !same_value(&row.value(c), v),
            Condition::In(c, vs) => vs.iter().any(|v| same_value(&row.value(c), v)),
            Condition::IsNull(c) => row.value(c).is_null(),
            Condition::False => false,
        }
    }
}

impl Term {
    fn matches(&self, row: &MemoryRow) -> bool {
        match self {
            Term::False => false,
            Term::Any(conditions) => conditions.iter().any(|c| c.matches(row)),
        }
    }
}

fn parse_where(tail: &str, params: &[DatabaseValue]) -> Vec<Term> {
    let clause = match tail.find(" WHERE ") {
        Some(at) => &tail[at + " WHERE ".len()..],
        None => return Vec::new(),
    };
    let end = [" GROUP BY ", " ORDER BY ", " LIMIT ", " OFFSET "]
        .iter()
        .filter_map(|kw| clause.find(kw))
        .min()
        .unwrap_or(clause.len());

    clause[..end]
        .split(" AND ")
        .map(|term| {
            let term = term.trim();
            if term == "FALSE" {
                return Term::False;
            }
            match term.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
                Some(group) if group.contains(" OR ") => {
                    Term::Any(group.split(" OR ").map(|c| parse_condition(c, params)).collect())
                }
                _ => Term::Any(vec![parse_condition(term, params)]),
            }
        })
        .collect()
}

fn parse_condition(condition: &str, params: &[DatabaseValue]) -> Condition {
    let condition = condition.trim();
    if condition == "FALSE" {
        return Condition::False;
    }
    if let Some(column) = condition.strip_suffix(" IS NULL") {
        return Condition::IsNull(unqualify(column).to_string());
    }
    if let Some((column, list)) = condition.split_once(" IN (") {
        let values = list
            .trim_end_matches(')')
            .split(',')
            .map(|token| resolve(token.trim(), params))
            .collect();
        return Condition::In(unqualify(column).to_string(), values);
    }
    if let Some((column, value)) = condition.split_once(" != ") {
        return Condition::NotEqual(unqualify(column).to_string(), resolve(value.trim(), params));
    }
    match condition.split_once(" = ") {
        Some((column, value)) => Condition::Equal(unqualify(column).to_string(), resolve(value.trim(), params)),
        None => Condition::False,
    }
}

fn resolve(token: &str, params: &[DatabaseValue]) -> DatabaseValue {
    if let Some(index) = token.strip_prefix('$').and_then(|i| i.parse::<usize>().ok()) {
        return index
            .checked_sub(1)
            .and_then(|i| params.get(i))
            .cloned()
            .unwrap_or(DatabaseValue::Null);
    }
    if token.eq_ignore_ascii_case("NULL") {
        return DatabaseValue::Null;
    }
    if let Some(text) = token.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        return DatabaseValue::String(text.replace("''", "'"));
    }
    token
        .parse::<i64>()
        .map(DatabaseValue::Int64)
        .unwrap_or_else(|_| DatabaseValue::String(token.to_string()))
}

/// Compare through JSON so INTEGER and BIGINT, or UUID and its text form, agree
fn same_value(a: &DatabaseValue, b: &DatabaseValue) -> bool {
    !a.is_null() && a.to_json() == b.to_json()
}
