//! Relationship Registry - declared sibling relations per model

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::siblings::SiblingsRelation;
use crate::error::{ModelError, ModelResult};
use crate::field::Field;
use crate::model::Model;
use crate::relationships::Siblings;

/// Where a relation's edges are stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationBinding {
    pub through: &'static str,
    pub left: &'static str,
    pub right: &'static str,
}

impl<M: Model, J: Model> From<&SiblingsRelation<M, J>> for RelationBinding {
    fn from(relation: &SiblingsRelation<M, J>) -> Self {
        Self {
            through: relation.through(),
            left: relation.left().column(),
            right: relation.right().column(),
        }
    }
}

/// Thread-safe registry of declared relations, keyed by (model table,
/// relation name).
///
/// Cloning shares the underlying map. A relation may be declared once; an
/// identical re-declaration is accepted, a conflicting one is a
/// configuration error.
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    relations: Arc<DashMap<(String, String), RelationBinding>>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `relation` for its model
    pub fn register<M: Model, J: Model>(&self, relation: &SiblingsRelation<M, J>) -> ModelResult<()> {
        let key = (M::table_name().to_string(), relation.name().to_string());
        let binding = RelationBinding::from(relation);

        match self.relations.entry(key) {
            Entry::Vacant(entry) => {
                tracing::debug!(
                    model = M::table_name(),
                    relation = relation.name(),
                    through = binding.through,
                    "registered sibling relation"
                );
                entry.insert(binding);
                Ok(())
            }
            Entry::Occupied(entry) if *entry.get() == binding => Ok(()),
            Entry::Occupied(entry) => Err(ModelError::Configuration(format!(
                "relation '{}' on '{}' is already declared through {}({}, {})",
                relation.name(),
                M::table_name(),
                entry.get().through,
                entry.get().left,
                entry.get().right
            ))),
        }
    }

    /// Declare a relation and record it in one step
    pub fn declare<M: Model, J: Model>(
        &self,
        name: &'static str,
        left: Field<J, M::PrimaryKey>,
        right: Field<J, M::PrimaryKey>,
        accessor: fn(&mut M) -> &mut Siblings<M>,
    ) -> ModelResult<SiblingsRelation<M, J>> {
        let relation = SiblingsRelation::declare(name, left, right, accessor)?;
        self.register(&relation)?;
        Ok(relation)
    }

    pub fn get<M: Model>(&self, name: &str) -> Option<RelationBinding> {
        self.relations
            .get(&(M::table_name().to_string(), name.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn contains<M: Model>(&self, name: &str) -> bool {
        self.get::<M>(name).is_some()
    }

    /// Relation names declared for `M`
    pub fn names_for<M: Model>(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .relations
            .iter()
            .filter(|entry| entry.key().0 == M::table_name())
            .map(|entry| entry.key().1.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
