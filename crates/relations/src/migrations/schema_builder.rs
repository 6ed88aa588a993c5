//! Schema Builder - DSL for creating database schema changes
//!
//! Provides a fluent interface for building the SQL statements a
//! [`Migration`](super::Migration) prepares and reverts.

use std::fmt;

/// Action taken on referencing rows when the referenced row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    SetNull,
    NoAction,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferentialAction::Cascade => write!(f, "CASCADE"),
            ReferentialAction::Restrict => write!(f, "RESTRICT"),
            ReferentialAction::SetNull => write!(f, "SET NULL"),
            ReferentialAction::NoAction => write!(f, "NO ACTION"),
        }
    }
}

/// Basic schema operations for migrations
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    statements: Vec<String>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table, followed by any indexes declared on it
    pub fn create_table<F>(&mut self, table_name: &str, callback: F) -> &mut Self
    where
        F: FnOnce(&mut TableBuilder),
    {
        let mut table_builder = TableBuilder::new(table_name);
        callback(&mut table_builder);

        self.statements.extend(table_builder.to_statements());
        self
    }

    /// Drop a table
    pub fn drop_table(&mut self, table_name: &str) -> &mut Self {
        self.statements
            .push(format!("DROP TABLE IF EXISTS {};", table_name));
        self
    }

    /// Create an index
    pub fn create_index(
        &mut self,
        table_name: &str,
        column_names: &[&str],
        index_name: Option<&str>,
    ) -> &mut Self {
        self.statements
            .push(index_sql(table_name, column_names, index_name));
        self
    }

    /// Get all SQL statements
    pub fn to_sql(&self) -> Vec<String> {
        self.statements.clone()
    }

    /// All statements as a single SQL string
    pub fn build(&self) -> String {
        self.statements.join("\n")
    }
}

fn index_sql(table_name: &str, column_names: &[&str], index_name: Option<&str>) -> String {
    let default_name = format!("idx_{}_{}", table_name, column_names.join("_"));
    let index_name = index_name.unwrap_or(&default_name);
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({});",
        index_name,
        table_name,
        column_names.join(", ")
    )
}

/// Table builder for CREATE TABLE statements
#[derive(Debug)]
pub struct TableBuilder {
    table_name: String,
    columns: Vec<String>,
    constraints: Vec<String>,
    indexes: Vec<String>,
}

impl TableBuilder {
    pub fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            columns: Vec::new(),
            constraints: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Add a column
    pub fn column(&mut self, name: &str, column_type: &str) -> &mut Self {
        self.columns.push(format!("{} {}", name, column_type));
        self
    }

    /// Add a non-nullable column
    pub fn required(&mut self, name: &str, column_type: &str) -> &mut Self {
        self.columns.push(format!("{} {} NOT NULL", name, column_type));
        self
    }

    /// Add a UUID primary key generated by the database
    pub fn uuid_id(&mut self, name: &str) -> &mut Self {
        self.columns
            .push(format!("{} UUID PRIMARY KEY DEFAULT gen_random_uuid()", name));
        self
    }

    /// Add an auto-increment primary key
    pub fn id(&mut self, name: &str) -> &mut Self {
        self.columns.push(format!("{} BIGSERIAL PRIMARY KEY", name));
        self
    }

    /// Add a string column
    pub fn string(&mut self, name: &str, length: Option<u32>) -> &mut Self {
        let column_type = match length {
            Some(len) => format!("VARCHAR({})", len),
            None => "TEXT".to_string(),
        };
        self.columns.push(format!("{} {}", name, column_type));
        self
    }

    /// Add an integer column
    pub fn integer(&mut self, name: &str) -> &mut Self {
        self.columns.push(format!("{} INTEGER", name));
        self
    }

    /// Add timestamp columns
    pub fn timestamps(&mut self) -> &mut Self {
        self.columns
            .push("created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string());
        self.columns
            .push("updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string());
        self
    }

    /// Add a foreign key constraint
    pub fn foreign_key(
        &mut self,
        column: &str,
        references_table: &str,
        references_column: &str,
        on_delete: Option<ReferentialAction>,
    ) -> &mut Self {
        let mut constraint = format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            column, references_table, references_column
        );
        if let Some(action) = on_delete {
            constraint.push_str(&format!(" ON DELETE {}", action));
        }
        self.constraints.push(constraint);
        self
    }

    /// Add a unique constraint
    pub fn unique(&mut self, columns: &[&str]) -> &mut Self {
        self.constraints
            .push(format!("UNIQUE ({})", columns.join(", ")));
        self
    }

    /// Add a unique constraint with an explicit name
    pub fn unique_named(&mut self, name: &str, columns: &[&str]) -> &mut Self {
        self.constraints
            .push(format!("CONSTRAINT {} UNIQUE ({})", name, columns.join(", ")));
        self
    }

    /// Add a CHECK constraint
    pub fn check(&mut self, expression: &str) -> &mut Self {
        self.constraints.push(format!("CHECK ({})", expression));
        self
    }

    /// Add an index, created after the table
    pub fn index(&mut self, columns: &[&str], name: Option<&str>) -> &mut Self {
        self.indexes.push(index_sql(&self.table_name, columns, name));
        self
    }

    /// Build the CREATE TABLE SQL
    pub fn to_sql(&self) -> String {
        let mut parts = self.columns.clone();
        parts.extend(self.constraints.iter().cloned());

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            self.table_name,
            parts.join(",\n    ")
        )
    }

    /// CREATE TABLE followed by the declared indexes
    pub fn to_statements(&self) -> Vec<String> {
        let mut statements = vec![self.to_sql()];
        statements.extend(self.indexes.iter().cloned());
        statements
    }
}
