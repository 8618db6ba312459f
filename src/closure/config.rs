//! Closure cache configuration

use serde::{Deserialize, Serialize};

/// Configuration for a transitive closure cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Memoize the materialized successor rows of each lead node.
    /// Trades memory (quadratic in hierarchy depth) for query time.
    pub materialization_caching: bool,
    /// Flush eagerly once more than this many deletions are pending
    /// (None = only flush before queries or on request)
    pub max_pending_deletions: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            materialization_caching: false,
            max_pending_deletions: None,
        }
    }
}

impl CacheConfig {
    /// Configuration with materialization caching switched on
    pub fn caching() -> Self {
        Self {
            materialization_caching: true,
            ..Self::default()
        }
    }
}
