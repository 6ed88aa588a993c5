use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::backends::{DatabasePool, DatabaseRowExt};
use crate::error::{ModelError, ModelResult};
use crate::model::{Model, ModelKey};
use crate::query::QueryBuilder;
use crate::relationships::SiblingsRelation;

pub mod config;

pub use config::{BatchConfig, LoadReport};

/// Eager loader for sibling relations
#[derive(Debug, Clone, Default)]
pub struct SiblingsLoader {
    config: BatchConfig,
}

impl SiblingsLoader {
    /// Create a new loader with default configuration
    pub fn new() -> Self {
        Self::with_config(BatchConfig::default())
    }

    /// Create a new loader with custom configuration
    pub fn with_config(config: BatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Load `relation` for every parent.
    ///
    /// Issues one query against the join table for all parents, plus one
    /// query for the neighbor models when `hydrate` is set and any neighbor
    /// was found. `max_batch_size` bounds both the parent ids and the
    /// neighbor ids bound into a query; exceeding either is a
    /// [`ModelError::Query`]. Parents are only modified after every query succeeded, so
    /// an error or a dropped future leaves all caches as they were.
    pub async fn load<M, J>(
        &self,
        pool: &dyn DatabasePool,
        parents: &mut [M],
        relation: &SiblingsRelation<M, J>,
        hydrate: bool,
    ) -> ModelResult<LoadReport>
    where
        M: Model + Clone,
        J: Model,
    {
        if parents.is_empty() {
            return Ok(LoadReport::default());
        }

        let keys = parents
            .iter()
            .map(|parent| parent.primary_key().ok_or(ModelError::MissingPrimaryKey))
            .collect::<ModelResult<Vec<_>>>()?;
        let ids = distinct(&keys);

        if ids.len() > self.config.max_batch_size {
            return Err(ModelError::Query(format!(
                "cannot load {} for {} parents in one query (max {})",
                relation.name(),
                ids.len(),
                self.config.max_batch_size
            )));
        }

        let rows = relation.edges_query(&ids).fetch_rows(pool).await?;
        let edges = rows
            .iter()
            .map(|row| -> ModelResult<(M::PrimaryKey, M::PrimaryKey)> {
                Ok((
                    row.get::<M::PrimaryKey>(relation.left().column())?,
                    row.get::<M::PrimaryKey>(relation.right().column())?,
                ))
            })
            .collect::<ModelResult<Vec<_>>>()?;

        let mut report = LoadReport {
            query_count: 1,
            parent_count: ids.len(),
            edge_count: edges.len(),
        };

        let grouped = resolve_neighbors(&ids, &edges);

        let hydrated = if hydrate {
            let neighbor_ids = distinct(ids.iter().filter_map(|id| grouped.get(id)).flatten());
            if neighbor_ids.len() > self.config.max_batch_size {
                return Err(ModelError::Query(format!(
                    "cannot hydrate {} neighbors of {} in one query (max {})",
                    neighbor_ids.len(),
                    relation.name(),
                    self.config.max_batch_size
                )));
            }
            let models = if neighbor_ids.is_empty() {
                Vec::new()
            } else {
                report.query_count += 1;
                let key_column = format!("{}.{}", M::table_name(), M::primary_key_name());
                QueryBuilder::<M>::for_model()
                    .where_in(&key_column, neighbor_ids)
                    .get(pool)
                    .await?
            };
            Some(
                models
                    .into_iter()
                    .filter_map(|model| model.primary_key().map(|key| (key, model)))
                    .collect::<HashMap<_, _>>(),
            )
        } else {
            None
        };

        for (parent, key) in parents.iter_mut().zip(&keys) {
            let neighbor_ids = grouped.get(key).cloned().unwrap_or_default();
            let models = hydrated.as_ref().map(|by_id| {
                neighbor_ids
                    .iter()
                    .filter_map(|id| by_id.get(id).cloned())
                    .collect()
            });
            relation.siblings_mut(parent).set_loaded(neighbor_ids, models);
        }

        tracing::debug!(
            relation = relation.name(),
            parents = report.parent_count,
            edges = report.edge_count,
            queries = report.query_count,
            "eager loaded sibling relation"
        );

        Ok(report)
    }
}

/// Attribute each edge to the parents it touches.
///
/// For edge `(l, r)`, parent `l` gains neighbor `r` and parent `r` gains
/// neighbor `l`; an edge between two parents counts for both. Lists keep
/// edge order and every parent gets an entry, empty if untouched.
pub fn resolve_neighbors<K>(parents: &[K], edges: &[(K, K)]) -> HashMap<K, Vec<K>>
where
    K: Clone + Eq + Hash,
{
    let mut grouped: HashMap<K, Vec<K>> = parents
        .iter()
        .map(|parent| (parent.clone(), Vec::new()))
        .collect();

    for (left, right) in edges {
        if let Some(neighbors) = grouped.get_mut(left) {
            neighbors.push(right.clone());
        }
        if left != right {
            if let Some(neighbors) = grouped.get_mut(right) {
                neighbors.push(left.clone());
            }
        }
    }

    grouped
}

/// Distinct keys in first-seen order
fn distinct<'a, K: ModelKey>(keys: impl IntoIterator<Item = &'a K>) -> Vec<K> {
    let mut seen = HashSet::new();
    keys.into_iter()
        .filter(|key| seen.insert(*key))
        .cloned()
        .collect()
}
