//! Join table shape for sibling relations
//!
//! The table keeps both endpoints as non-null foreign keys to the parent
//! table, forbids self loops with a CHECK, and makes `(left, right)` unique.
//! Uniqueness over the stored order is enough because links are always
//! written in canonical order.

use std::fmt;
use std::sync::Arc;

use super::siblings::SiblingsRelation;
use crate::migrations::{Migration, ReferentialAction, SchemaBuilder, TableBuilder};
use crate::model::{Model, ModelKey};

type Customization = Arc<dyn Fn(&mut TableBuilder) + Send + Sync>;

/// Schema policy and migration for one sibling relation's join table
#[derive(Clone)]
pub struct SiblingsSchema {
    name: String,
    through: &'static str,
    id_column: &'static str,
    parent_table: &'static str,
    parent_key: &'static str,
    key_type: &'static str,
    left: &'static str,
    right: &'static str,
    pair_constraint: String,
    timestamps: bool,
    customizations: Vec<Customization>,
}

impl SiblingsSchema {
    /// Schema for the join table behind `relation`
    pub fn for_relation<M: Model, J: Model>(relation: &SiblingsRelation<M, J>) -> Self {
        Self {
            name: format!("create_{}_table", J::table_name()),
            through: J::table_name(),
            id_column: J::primary_key_name(),
            parent_table: M::table_name(),
            parent_key: M::primary_key_name(),
            key_type: M::PrimaryKey::sql_type(),
            left: relation.left().column(),
            right: relation.right().column(),
            pair_constraint: relation.pair_constraint(),
            timestamps: J::uses_timestamps(),
            customizations: Vec::new(),
        }
    }

    /// Override the migration name
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Add constraints or indexes on top of the base shape.
    ///
    /// Hooks run after the base columns and constraints are declared, in
    /// registration order.
    pub fn with_customization<F>(mut self, customize: F) -> Self
    where
        F: Fn(&mut TableBuilder) + Send + Sync + 'static,
    {
        self.customizations.push(Arc::new(customize));
        self
    }

    pub fn table_name(&self) -> &'static str {
        self.through
    }

    fn build(&self, table: &mut TableBuilder) {
        table.uuid_id(self.id_column);
        table.required(self.left, self.key_type);
        table.required(self.right, self.key_type);
        if self.timestamps {
            table.timestamps();
        }

        table.foreign_key(self.left, self.parent_table, self.parent_key, Some(ReferentialAction::Cascade));
        table.foreign_key(self.right, self.parent_table, self.parent_key, Some(ReferentialAction::Cascade));
        table.unique_named(&self.pair_constraint, &[self.left, self.right]);
        table.check(&format!("{} <> {}", self.left, self.right));

        // The unique index serves lookups by left; right needs its own
        table.index(&[self.right], None);

        for customize in &self.customizations {
            customize(table);
        }
    }
}

impl Migration for SiblingsSchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&self) -> Vec<String> {
        let mut schema = SchemaBuilder::new();
        schema.create_table(self.through, |table| self.build(table));
        schema.to_sql()
    }

    fn revert(&self) -> Vec<String> {
        let mut schema = SchemaBuilder::new();
        schema.drop_table(self.through);
        schema.to_sql()
    }
}

impl fmt::Debug for SiblingsSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiblingsSchema")
            .field("name", &self.name)
            .field("through", &self.through)
            .field("parent_table", &self.parent_table)
            .field("left", &self.left)
            .field("right", &self.right)
            .field("customizations", &self.customizations.len())
            .finish()
    }
}
