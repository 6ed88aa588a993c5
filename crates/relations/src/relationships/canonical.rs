//! Canonical ordering for undirected edges
//!
//! An edge between `a` and `b` is stored as `(min, max)`. With every insert
//! going through [`canonicalize`], `UNIQUE (left_id, right_id)` rejects both
//! exact and reciprocal duplicates.

use std::fmt;

use crate::error::{ModelError, ModelResult};

/// An ordered pair with `left < right`.
///
/// Only [`canonicalize`] constructs it, so holding one proves the pair is
/// canonical and not a self loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPair<K> {
    left: K,
    right: K,
}

impl<K> CanonicalPair<K> {
    pub fn left(&self) -> &K {
        &self.left
    }

    pub fn right(&self) -> &K {
        &self.right
    }

    pub fn into_inner(self) -> (K, K) {
        (self.left, self.right)
    }

    /// True if `key` is one of the two endpoints
    pub fn contains(&self, key: &K) -> bool
    where
        K: PartialEq,
    {
        &self.left == key || &self.right == key
    }
}

impl<K: fmt::Display> fmt::Display for CanonicalPair<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.left, self.right)
    }
}

/// Order two node ids so the smaller is on the left.
///
/// Fails with [`ModelError::InvalidEdge`] when both ids are equal.
pub fn canonicalize<K: Ord + fmt::Display>(a: K, b: K) -> ModelResult<CanonicalPair<K>> {
    match a.cmp(&b) {
        std::cmp::Ordering::Less => Ok(CanonicalPair { left: a, right: b }),
        std::cmp::Ordering::Greater => Ok(CanonicalPair { left: b, right: a }),
        std::cmp::Ordering::Equal => Err(ModelError::InvalidEdge(format!(
            "a node cannot be related to itself ({})",
            a
        ))),
    }
}
