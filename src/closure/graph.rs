//! Incrementally maintained transitive reduction and closure
//!
//! `TransitiveGraph` owns the node registry and keeps, for every lead
//! node, its reduced successor set, the inverse predecessor set and the
//! closed successor set. Insertions are propagated immediately; deletions
//! are buffered and applied in batches by rebuilding only the region of
//! the graph that can reach a deleted edge.
//!
//! This type is single-owner: mutation needs `&mut self`. Share it between
//! threads through [`TransitiveGraphCache`](super::TransitiveGraphCache).

use super::config::CacheConfig;
use super::error::ClosureResult;
use super::materialize::MaterializedRows;
use super::node::{GraphNode, Membership, NodeIdx};
use super::registry::NodeRegistry;
use super::walker::{GraphRef, Pairs, Walk};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Write as _};
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Size summary of a closure cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Registered identifiers
    pub nodes: usize,
    /// Nodes that represent themselves or an SCC
    pub lead_nodes: usize,
    /// Collapsed strongly connected components
    pub sccs: usize,
    /// Retained original edges
    pub original_edges: usize,
    /// Edges in the transitive reduction (between lead nodes)
    pub reduction_edges: usize,
    /// Edges in the transitive closure (between lead nodes, reflexive excluded)
    pub closure_edges: usize,
    /// Deletions waiting for the next flush
    pub pending_deletions: usize,
    /// Lead nodes with a memoized row
    pub materialized_rows: usize,
}

/// Transitive reduction/closure of a mutable binary relation
#[derive(Debug, Clone)]
pub struct TransitiveGraph<N> {
    /// Identifier -> node record
    pub(crate) registry: NodeRegistry<N>,
    /// Every inserted (subject, object) pair, by raw slot
    original: FxHashSet<(NodeIdx, NodeIdx)>,
    /// Pairs marked for deletion but not yet applied
    pending: FxHashSet<(NodeIdx, NodeIdx)>,
    /// Memoized successor rows
    pub(crate) rows: MaterializedRows<N>,
    config: CacheConfig,
}

impl<N: Clone + Eq + Hash> TransitiveGraph<N> {
    /// Create an empty graph with default configuration
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create an empty graph with the given configuration
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            registry: NodeRegistry::new(),
            original: FxHashSet::default(),
            pending: FxHashSet::default(),
            rows: MaterializedRows::new(config.materialization_caching),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Switch memoization of materialized successor rows on or off
    pub fn set_materialization_caching(&mut self, enabled: bool) {
        self.config.materialization_caching = enabled;
        self.rows.set_enabled(enabled);
    }

    /// Number of registered identifiers
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Check if an identifier has been registered
    pub fn contains_node(&self, id: &N) -> bool {
        self.registry.get(id).is_some()
    }

    /// Registered identifiers, in registration order
    pub fn nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.registry.ids()
    }

    pub fn registry(&self) -> &NodeRegistry<N> {
        &self.registry
    }

    /// Snapshot of the retained original edges
    pub fn original_edges(&self) -> Vec<(N, N)> {
        self.original
            .iter()
            .map(|&(s, o)| (self.registry.id(s).clone(), self.registry.id(o).clone()))
            .collect()
    }

    pub fn has_pending_deletions(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Register a new relation instance
    ///
    /// Idempotent. A self-edge only registers the identifier since
    /// reflexivity is implicit.
    pub fn insert_edge(&mut self, subject: &N, object: &N) -> ClosureResult<()> {
        let start = self.registry.register(subject)?;
        if subject == object {
            return Ok(());
        }
        let end = self.registry.register(object)?;

        // A later insert overrides an earlier, still buffered, delete
        self.pending.remove(&(start, end));
        self.original.insert((start, end));
        trace!("insert edge {} -> {}", start, end);
        self.add_relation(start, end);
        Ok(())
    }

    /// Fold one edge into the reduction and closure
    pub(crate) fn add_relation(&mut self, start: NodeIdx, end: NodeIdx) {
        let start = self.registry.lead_of(start);
        let end = self.registry.lead_of(end);

        if self.path_to(start, end) {
            return;
        }

        if self.path_to(end, start) {
            // Closing a cycle: collapse it into one SCC led by `start`
            let members = self.scc_members(start, end);
            debug!("collapsing {} nodes into SCC led by {}", members.len(), start);
            self.make_lead_node_for(start, &members);
            self.propagate_scc(start, &members);
        } else {
            self.propagate_add(start, end);
            self.link(start, end);
        }
    }

    /// Mark an instance of the relation for removal
    ///
    /// Nothing changes structurally until the next flush. Unknown
    /// identifiers and self-edges are ignored.
    pub fn delete_edge(&mut self, subject: &N, object: &N) {
        if subject == object {
            return;
        }
        let (Some(start), Some(end)) = (self.registry.get(subject), self.registry.get(object)) else {
            return;
        };
        self.pending.insert((start, end));

        if let Some(limit) = self.config.max_pending_deletions {
            if self.pending.len() > limit {
                self.flush_pending_deletions();
            }
        }
    }

    /// Apply every buffered deletion
    ///
    /// Deletions of edges that never took part in the reduction are
    /// applied directly to the original edge set. The rest define the
    /// kernel: the region that can reach one of their sources is wiped
    /// and rebuilt by replaying its remaining original edges.
    pub fn flush_pending_deletions(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);

        let mut kernel: FxHashSet<NodeIdx> = FxHashSet::default();
        let mut structural = Vec::new();
        let mut redundant = 0usize;
        for &(start, end) in &pending {
            if !self.original.contains(&(start, end)) {
                continue;
            }
            let start_lead = self.registry.lead_of(start);
            let end_lead = self.registry.lead_of(end);
            if start_lead != end_lead && !self.registry.node(start_lead).succ.contains(&end_lead) {
                // Not a reduction edge and not inside an SCC: the closure
                // does not depend on it
                self.original.remove(&(start, end));
                redundant += 1;
            } else {
                kernel.insert(start_lead);
                structural.push((start, end));
            }
        }

        if kernel.is_empty() {
            debug!(
                "flushed {} deletions ({} redundant), no rebuild needed",
                pending.len(),
                redundant
            );
            return;
        }

        // Extended kernel: every lead node that can reach the kernel
        let kernel: Vec<NodeIdx> = kernel.into_iter().collect();
        let mut extended: FxHashSet<NodeIdx> = kernel.iter().copied().collect();
        self.visit_predecessors(&kernel, false, |_, node| {
            extended.insert(node);
            Vec::new()
        });

        // Cut the region away from the fringe it points into
        for &lead in &extended {
            let fringe: Vec<NodeIdx> = self
                .registry
                .node(lead)
                .successors()
                .filter(|s| !extended.contains(s))
                .collect();
            for target in fringe {
                self.registry.node_mut(target).pred.remove(&lead);
            }
        }

        // Wipe every record in the region, SCC members included
        let region: FxHashSet<NodeIdx> = extended
            .iter()
            .flat_map(|&lead| self.registry.members(lead).collect::<Vec<_>>())
            .collect();
        for &idx in &region {
            self.registry.node_mut(idx).reset();
            self.rows.invalidate(idx);
        }

        for edge in &structural {
            self.original.remove(edge);
        }

        let replay: Vec<(NodeIdx, NodeIdx)> = self
            .original
            .iter()
            .filter(|(start, _)| region.contains(start))
            .copied()
            .collect();
        for &(start, end) in &replay {
            self.add_relation(start, end);
        }

        debug!(
            "flushed {} deletions ({} redundant): kernel {}, region {}, replayed {} edges",
            pending.len(),
            redundant,
            kernel.len(),
            region.len(),
            replay.len()
        );
    }

    /// Independent copy rebuilt from the original edges only
    ///
    /// Memoized rows are never copied; the configuration is.
    pub fn deep_copy(&mut self) -> ClosureResult<Self> {
        self.flush_pending_deletions();
        let mut copy = Self::with_config(self.config.clone());
        for id in self.registry.ids() {
            copy.registry.register(id)?;
        }
        for &(start, end) in &self.original {
            copy.insert_edge(self.registry.id(start), self.registry.id(end))?;
        }
        Ok(copy)
    }

    /// Reset to an empty graph
    pub fn clear(&mut self) {
        info!("clearing closure cache with {} nodes", self.registry.len());
        self.registry.clear();
        self.original.clear();
        self.pending.clear();
        self.rows.clear();
    }

    /// Size summary
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            nodes: self.registry.len(),
            original_edges: self.original.len(),
            pending_deletions: self.pending.len(),
            materialized_rows: self.rows.len(),
            ..CacheStats::default()
        };
        for idx in self.registry.indices() {
            let node = self.registry.node(idx);
            match node.membership {
                Membership::Subordinate(_) => continue,
                Membership::Leader(_) => stats.sccs += 1,
                Membership::Singleton => {}
            }
            stats.lead_nodes += 1;
            stats.reduction_edges += node.succ.len();
            stats.closure_edges += node.succ_closed.len();
        }
        stats
    }

    // ------------------------------------------------------------------
    // Queries. Each flushes pending deletions first.
    // ------------------------------------------------------------------

    /// Check whether `subject` reaches `object` directly (`closed == false`)
    /// or transitively. Reflexive for any registered identifier.
    pub fn reaches(&mut self, subject: &N, object: &N, closed: bool) -> bool {
        self.flush_pending_deletions();
        self.reaches_flushed(subject, object, closed)
    }

    /// Reflexive pair, SCC siblings, then every (direct or closed) successor
    /// with its aliases
    pub fn successors_of(&mut self, subject: &N, closed: bool) -> Pairs<'_, N> {
        self.query(Some(subject), None, closed)
    }

    /// Reflexive pair, SCC siblings, then every (direct or transitive)
    /// predecessor with its aliases
    pub fn predecessors_of(&mut self, object: &N, closed: bool) -> Pairs<'_, N> {
        self.query(None, Some(object), closed)
    }

    /// Every registered node's successor pairs
    pub fn all_pairs(&mut self, closed: bool) -> Pairs<'_, N> {
        self.query(None, None, closed)
    }

    /// Pattern query; `None` leaves that position unconstrained
    pub fn query(&mut self, subject: Option<&N>, object: Option<&N>, closed: bool) -> Pairs<'_, N> {
        self.prepare(subject, object, closed);
        let walk = self.walk(subject, object, closed);
        Pairs::new(GraphRef::Borrowed(self), walk)
    }

    // ------------------------------------------------------------------
    // Query plumbing shared with the thread-safe cache
    // ------------------------------------------------------------------

    /// True when `walk` can run against the current state without mutation
    pub(crate) fn is_prepared(&self, subject: Option<&N>, object: Option<&N>, closed: bool) -> bool {
        if !self.pending.is_empty() {
            return false;
        }
        match (subject, object) {
            (Some(subject), None) if self.rows.is_enabled() => self
                .registry
                .resolve(subject)
                .map_or(true, |lead| self.rows.contains(lead, closed)),
            _ => true,
        }
    }

    /// Flush pending deletions and memoize the row a query will replay
    pub(crate) fn prepare(&mut self, subject: Option<&N>, object: Option<&N>, closed: bool) {
        self.flush_pending_deletions();
        if let (Some(subject), None) = (subject, object) {
            if let Some(lead) = self.registry.resolve(subject) {
                self.materialize_row(lead, closed);
            }
        }
    }

    /// Memoize the row of `lead`, if caching is on and it is missing
    fn materialize_row(&mut self, lead: NodeIdx, closed: bool) {
        if !self.rows.is_enabled() || self.rows.contains(lead, closed) {
            return;
        }
        let node = self.registry.node(lead);
        let targets = if closed { &node.succ_closed } else { &node.succ };
        let row: Arc<[N]> = self
            .registry
            .members(lead)
            .chain(targets.iter().flat_map(|&t| self.registry.members(t)))
            .map(|idx| self.registry.id(idx).clone())
            .collect();
        self.rows.store(lead, closed, row);
    }

    pub(crate) fn reaches_flushed(&self, subject: &N, object: &N, closed: bool) -> bool {
        let (Some(start), Some(end)) = (self.registry.resolve(subject), self.registry.resolve(object)) else {
            return false;
        };
        if closed {
            self.path_to(start, end)
        } else {
            self.direct_path_to(start, end)
        }
    }

    /// Select the walk for a pattern; assumes `prepare` has run
    pub(crate) fn walk(&self, subject: Option<&N>, object: Option<&N>, closed: bool) -> Walk<N> {
        match (subject, object) {
            (Some(subject), Some(object)) => {
                if self.reaches_flushed(subject, object, closed) {
                    Walk::single(subject.clone(), object.clone())
                } else {
                    Walk::Empty
                }
            }
            (Some(subject), None) => match self.registry.get(subject) {
                Some(root) => {
                    let lead = self.registry.lead_of(root);
                    match self.rows.get(lead, closed) {
                        Some(row) => Walk::rows(root, row),
                        None => Walk::successors(self, root, closed),
                    }
                }
                None => Walk::Empty,
            },
            (None, Some(object)) => match self.registry.get(object) {
                Some(root) => Walk::predecessors(self, root, closed),
                None => Walk::Empty,
            },
            (None, None) => Walk::all(closed),
        }
    }

    // ------------------------------------------------------------------
    // Structural helpers. All set mutation goes through these so that
    // memoized rows are dropped alongside.
    // ------------------------------------------------------------------

    pub(crate) fn node(&self, idx: NodeIdx) -> &GraphNode {
        self.registry.node(idx)
    }

    /// `start` reaches `end` (reflexive)
    pub(crate) fn path_to(&self, start: NodeIdx, end: NodeIdx) -> bool {
        start == end || self.node(start).succ_closed.contains(&end)
    }

    /// `end` is a reduction successor of `start` (reflexive)
    pub(crate) fn direct_path_to(&self, start: NodeIdx, end: NodeIdx) -> bool {
        start == end || self.node(start).succ.contains(&end)
    }

    /// Add a reduction edge and its closure entry
    pub(crate) fn link(&mut self, from: NodeIdx, to: NodeIdx) {
        if from == to {
            return;
        }
        let node = self.registry.node_mut(from);
        node.succ.insert(to);
        node.succ_closed.insert(to);
        self.registry.node_mut(to).pred.insert(from);
        self.rows.invalidate(from);
    }

    /// Remove a reduction edge, keeping its closure entry
    pub(crate) fn unlink(&mut self, from: NodeIdx, to: NodeIdx) {
        self.registry.node_mut(from).succ.remove(&to);
        self.registry.node_mut(to).pred.remove(&from);
        self.rows.invalidate(from);
    }

    /// Union a set into a node's closure
    pub(crate) fn extend_closed(&mut self, idx: NodeIdx, closure: &FxHashSet<NodeIdx>) {
        self.registry.node_mut(idx).succ_closed.extend(closure.iter().copied());
        self.rows.invalidate(idx);
    }
}

impl<N: Clone + Eq + Hash + Debug> TransitiveGraph<N> {
    /// Describe every lead node, for debugging
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for idx in self.registry.indices() {
            let node = self.registry.node(idx);
            if node.membership.is_subordinate() {
                continue;
            }
            let names = |set: &FxHashSet<NodeIdx>| {
                set.iter()
                    .map(|&i| format!("{:?}", self.registry.id(i)))
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            let _ = write!(
                out,
                "{:?} succ [{}] closed [{}]",
                self.registry.id(idx),
                names(&node.succ),
                names(&node.succ_closed)
            );
            if node.membership.is_leader() {
                let members = self
                    .registry
                    .members(idx)
                    .map(|i| format!("{:?}", self.registry.id(i)))
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = write!(out, " scc [{}]", members);
            }
            out.push('\n');
        }
        out
    }
}

impl<N: Clone + Eq + Hash> Default for TransitiveGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}
