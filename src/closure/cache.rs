//! Thread-safe closure cache
//!
//! `TransitiveGraphCache` puts a `TransitiveGraph` behind a `RwLock`.
//! Mutations take the write lock. Queries run under a read lock, so any
//! number of readers can iterate at once; when a query first needs
//! pending deletions flushed or a row memoized, it upgrades to the write
//! lock for that step only and retries.

use super::config::CacheConfig;
use super::error::ClosureResult;
use super::graph::{CacheStats, TransitiveGraph};
use super::walker::{GraphRef, Pairs};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::RwLock;
use tracing::trace;

/// Shared, lock-protected transitive closure of one relation
#[derive(Debug)]
pub struct TransitiveGraphCache<N> {
    inner: RwLock<TransitiveGraph<N>>,
}

impl<N: Clone + Eq + Hash> TransitiveGraphCache<N> {
    pub fn new() -> Self {
        Self::from_graph(TransitiveGraph::new())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self::from_graph(TransitiveGraph::with_config(config))
    }

    pub fn from_graph(graph: TransitiveGraph<N>) -> Self {
        Self {
            inner: RwLock::new(graph),
        }
    }

    /// Unwrap the underlying graph
    pub fn into_inner(self) -> ClosureResult<TransitiveGraph<N>> {
        Ok(self.inner.into_inner()?)
    }

    pub fn config(&self) -> ClosureResult<CacheConfig> {
        Ok(self.inner.read()?.config().clone())
    }

    pub fn set_materialization_caching(&self, enabled: bool) -> ClosureResult<()> {
        self.inner.write()?.set_materialization_caching(enabled);
        Ok(())
    }

    /// Register a new relation instance
    pub fn insert_edge(&self, subject: &N, object: &N) -> ClosureResult<()> {
        self.inner.write()?.insert_edge(subject, object)
    }

    /// Mark a relation instance for removal at the next flush
    pub fn delete_edge(&self, subject: &N, object: &N) -> ClosureResult<()> {
        self.inner.write()?.delete_edge(subject, object);
        Ok(())
    }

    pub fn flush_pending_deletions(&self) -> ClosureResult<()> {
        self.inner.write()?.flush_pending_deletions();
        Ok(())
    }

    pub fn has_pending_deletions(&self) -> ClosureResult<bool> {
        Ok(self.inner.read()?.has_pending_deletions())
    }

    pub fn reaches(&self, subject: &N, object: &N, closed: bool) -> ClosureResult<bool> {
        {
            let graph = self.inner.read()?;
            if !graph.has_pending_deletions() {
                return Ok(graph.reaches_flushed(subject, object, closed));
            }
        }
        Ok(self.inner.write()?.reaches(subject, object, closed))
    }

    /// Pattern query; the returned iterator holds a read lock until dropped
    pub fn query(&self, subject: Option<&N>, object: Option<&N>, closed: bool) -> ClosureResult<Pairs<'_, N>> {
        loop {
            let graph = self.inner.read()?;
            if graph.is_prepared(subject, object, closed) {
                let walk = graph.walk(subject, object, closed);
                return Ok(Pairs::new(GraphRef::Shared(graph), walk));
            }
            drop(graph);

            trace!("preparing graph for query");
            self.inner.write()?.prepare(subject, object, closed);
        }
    }

    pub fn successors_of(&self, subject: &N, closed: bool) -> ClosureResult<Pairs<'_, N>> {
        self.query(Some(subject), None, closed)
    }

    pub fn predecessors_of(&self, object: &N, closed: bool) -> ClosureResult<Pairs<'_, N>> {
        self.query(None, Some(object), closed)
    }

    pub fn all_pairs(&self, closed: bool) -> ClosureResult<Pairs<'_, N>> {
        self.query(None, None, closed)
    }

    pub fn len(&self) -> ClosureResult<usize> {
        Ok(self.inner.read()?.len())
    }

    pub fn is_empty(&self) -> ClosureResult<bool> {
        Ok(self.inner.read()?.is_empty())
    }

    pub fn contains_node(&self, id: &N) -> ClosureResult<bool> {
        Ok(self.inner.read()?.contains_node(id))
    }

    /// Snapshot of the registered identifiers, in registration order
    pub fn nodes(&self) -> ClosureResult<Vec<N>> {
        Ok(self.inner.read()?.nodes().cloned().collect())
    }

    pub fn original_edges(&self) -> ClosureResult<Vec<(N, N)>> {
        Ok(self.inner.read()?.original_edges())
    }

    pub fn stats(&self) -> ClosureResult<CacheStats> {
        Ok(self.inner.read()?.stats())
    }

    /// Independent cache rebuilt from the original edges
    pub fn deep_copy(&self) -> ClosureResult<Self> {
        let copy = self.inner.write()?.deep_copy()?;
        Ok(Self::from_graph(copy))
    }

    pub fn clear(&self) -> ClosureResult<()> {
        self.inner.write()?.clear();
        Ok(())
    }
}

impl<N: Clone + Eq + Hash + Debug> TransitiveGraphCache<N> {
    pub fn dump(&self) -> ClosureResult<String> {
        Ok(self.inner.read()?.dump())
    }
}

impl<N: Clone + Eq + Hash> Default for TransitiveGraphCache<N> {
    fn default() -> Self {
        Self::new()
    }
}
