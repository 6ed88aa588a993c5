/// Configuration for batch loading operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum number of distinct ids, parents or hydrated neighbors, bound
    /// into a single query
    pub max_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
        }
    }
}

/// What a load did, for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Queries issued: 0 for an empty batch, 1, or 2 with hydration
    pub query_count: usize,
    /// Distinct parent ids in the batch
    pub parent_count: usize,
    /// Join table rows returned
    pub edge_count: usize,
}
