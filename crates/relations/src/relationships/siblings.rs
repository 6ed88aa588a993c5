//! Self-referential many-to-many relationships
//!
//! A sibling relation links rows of one model to other rows of the same
//! model through a join table holding `(left, right)` pairs. Edges are
//! undirected: each pair is stored once in canonical order, and a node's
//! neighbors are found on either side of the join table.

use std::fmt;

use chrono::Utc;

use super::canonical::{canonicalize, CanonicalPair};
use crate::backends::DatabasePool;
use crate::error::{ModelError, ModelResult};
use crate::field::Field;
use crate::model::Model;
use crate::query::QueryBuilder;

/// Materialization state of a node's neighbors
#[derive(Debug, Clone, PartialEq)]
pub enum SiblingsState<K, M> {
    /// Never loaded, or invalidated with [`Siblings::unload`]
    Unloaded,
    /// Neighbor ids in load order, plus the neighbor models when hydrated
    Loaded { ids: Vec<K>, hydrated: Option<Vec<M>> },
}

/// Per-instance neighbor cache for a sibling relation.
///
/// Not persisted; models hold it as a `#[serde(skip)]` field, so every
/// freshly built or decoded model starts out unloaded.
#[derive(Debug, Clone)]
pub struct Siblings<M: Model> {
    state: SiblingsState<M::PrimaryKey, M>,
}

impl<M: Model> Default for Siblings<M> {
    fn default() -> Self {
        Self {
            state: SiblingsState::Unloaded,
        }
    }
}

impl<M: Model> Siblings<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SiblingsState<M::PrimaryKey, M> {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, SiblingsState::Loaded { .. })
    }

    /// Neighbor ids. An unloaded cache is an error, never an empty list.
    pub fn neighbors(&self) -> ModelResult<&[M::PrimaryKey]> {
        match &self.state {
            SiblingsState::Loaded { ids, .. } => Ok(ids.as_slice()),
            SiblingsState::Unloaded => Err(self.not_loaded()),
        }
    }

    /// Hydrated neighbor models; `None` when loaded without hydration
    pub fn hydrated(&self) -> ModelResult<Option<&[M]>> {
        match &self.state {
            SiblingsState::Loaded { hydrated, .. } => Ok(hydrated.as_deref()),
            SiblingsState::Unloaded => Err(self.not_loaded()),
        }
    }

    /// Drop the cached neighbors
    pub fn unload(&mut self) {
        self.state = SiblingsState::Unloaded;
    }

    pub(crate) fn set_loaded(&mut self, ids: Vec<M::PrimaryKey>, hydrated: Option<Vec<M>>) {
        self.state = SiblingsState::Loaded { ids, hydrated };
    }

    fn not_loaded(&self) -> ModelError {
        ModelError::NotLoaded(format!("{} siblings", M::table_name()))
    }
}

/// Binding of a sibling relation to its join model `J`
pub struct SiblingsRelation<M: Model, J: Model> {
    name: &'static str,
    left: Field<J, M::PrimaryKey>,
    right: Field<J, M::PrimaryKey>,
    accessor: fn(&mut M) -> &mut Siblings<M>,
}

impl<M: Model, J: Model> SiblingsRelation<M, J> {
    /// Declare relation `name` on `M`, stored in `J`'s table.
    ///
    /// Both fields are checked against `J::columns()` and must name
    /// different columns. `accessor` selects the cache the loader fills.
    ///
    /// This checks one declaration in isolation. Declaring the same name
    /// twice with different bindings is only detected by a
    /// [`RelationRegistry`](super::RelationRegistry); prefer
    /// [`RelationRegistry::declare`](super::RelationRegistry::declare) when
    /// relations are set up from several places.
    pub fn declare(
        name: &'static str,
        left: Field<J, M::PrimaryKey>,
        right: Field<J, M::PrimaryKey>,
        accessor: fn(&mut M) -> &mut Siblings<M>,
    ) -> ModelResult<Self> {
        if name.trim().is_empty() {
            return Err(ModelError::Configuration(
                "relation name cannot be empty".to_string(),
            ));
        }

        left.validate()?;
        right.validate()?;

        if left == right {
            return Err(ModelError::Configuration(format!(
                "relation '{}' binds both sides to {}",
                name,
                left.qualified()
            )));
        }

        Ok(Self {
            name,
            left,
            right,
            accessor,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Join table name
    pub fn through(&self) -> &'static str {
        J::table_name()
    }

    pub fn left(&self) -> Field<J, M::PrimaryKey> {
        self.left
    }

    pub fn right(&self) -> Field<J, M::PrimaryKey> {
        self.right
    }

    /// Name of the join table's `UNIQUE (left, right)` constraint
    pub fn pair_constraint(&self) -> String {
        format!("{}_{}_{}_key", J::table_name(), self.left.column(), self.right.column())
    }

    /// The neighbor cache of `model` for this relation
    pub fn siblings_mut<'a>(&self, model: &'a mut M) -> &'a mut Siblings<M> {
        (self.accessor)(model)
    }

    /// Store an edge between `this` and `other`.
    ///
    /// The pair is canonicalized before any query, so a self loop fails with
    /// [`ModelError::InvalidEdge`] without touching the store. A unique
    /// violation of [`pair_constraint`](Self::pair_constraint) means the pair
    /// already exists, in either direction, and is reported as
    /// [`ModelError::DuplicateEdge`]; other unique violations, such as those
    /// of constraints added by a schema customization, are returned as they
    /// are. Cached neighbor lists of
    /// either node are not updated; call [`Siblings::unload`] on them.
    pub async fn link(
        &self,
        pool: &dyn DatabasePool,
        this: &M,
        other: &M,
    ) -> ModelResult<CanonicalPair<M::PrimaryKey>> {
        let pair = self.pair(this, other)?;

        let mut insert = QueryBuilder::<J>::new()
            .insert_into(J::table_name())
            .set(self.left.column(), pair.left().clone())
            .set(self.right.column(), pair.right().clone());
        if J::uses_timestamps() {
            let now = Utc::now();
            insert = insert.set("created_at", now).set("updated_at", now);
        }

        match insert.execute(pool).await {
            Ok(_) => {
                tracing::debug!(relation = self.name, pair = %pair, "linked");
                Ok(pair)
            }
            Err(ModelError::UniqueViolation(constraint)) if constraint == self.pair_constraint() => {
                tracing::debug!(relation = self.name, pair = %pair, constraint = %constraint, "duplicate link");
                Err(ModelError::DuplicateEdge(format!(
                    "{} {} already exists in {}",
                    self.name,
                    pair,
                    J::table_name()
                )))
            }
            Err(err) => Err(err),
        }
    }

    /// Remove the edge between `this` and `other`, in whichever direction
    /// it was requested. Returns whether a row was deleted.
    pub async fn unlink(&self, pool: &dyn DatabasePool, this: &M, other: &M) -> ModelResult<bool> {
        let pair = self.pair(this, other)?;

        let deleted = QueryBuilder::<J>::new()
            .delete_from(J::table_name())
            .where_eq(self.left.column(), pair.left().clone())
            .where_eq(self.right.column(), pair.right().clone())
            .execute(pool)
            .await?;

        tracing::debug!(relation = self.name, pair = %pair, deleted, "unlinked");
        Ok(deleted > 0)
    }

    /// Query for every edge touching any of `ids`
    pub fn edges_query(&self, ids: &[M::PrimaryKey]) -> QueryBuilder<J> {
        let left = self.left.qualified();
        let right = self.right.qualified();

        QueryBuilder::<J>::for_model()
            .select_field(self.left)
            .select_field(self.right)
            .where_any_in(&[left.as_str(), right.as_str()], ids)
    }

    fn pair(&self, this: &M, other: &M) -> ModelResult<CanonicalPair<M::PrimaryKey>> {
        let a = this.primary_key().ok_or(ModelError::MissingPrimaryKey)?;
        let b = other.primary_key().ok_or(ModelError::MissingPrimaryKey)?;
        canonicalize(a, b)
    }
}

impl<M: Model, J: Model> Clone for SiblingsRelation<M, J> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            left: self.left,
            right: self.right,
            accessor: self.accessor,
        }
    }
}

impl<M: Model, J: Model> fmt::Debug for SiblingsRelation<M, J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiblingsRelation")
            .field("model", &M::table_name())
            .field("name", &self.name)
            .field("through", &J::table_name())
            .field("left", &self.left.column())
            .field("right", &self.right.column())
            .finish()
    }
}
