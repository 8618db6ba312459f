//! Graph node records and SCC membership
//!
//! Every identifier the registry has seen owns one `GraphNode` in the
//! arena. Cross references (successors, predecessors, SCC links) are
//! `NodeIdx` handles into that arena, never references.

use rustc_hash::FxHashSet;
use std::fmt;

/// Handle of a graph node inside the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub(crate) usize);

impl NodeIdx {
    pub fn new(idx: usize) -> Self {
        NodeIdx(idx)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a node takes part in cycle collapsing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Membership {
    /// Ordinary node, not part of any collapsed cycle
    #[default]
    Singleton,
    /// Representative of a collapsed SCC. Holds every member, itself included.
    Leader(Vec<NodeIdx>),
    /// Non-representative SCC member; its own sets are unused
    Subordinate(NodeIdx),
}

impl Membership {
    pub fn is_subordinate(&self) -> bool {
        matches!(self, Membership::Subordinate(_))
    }

    pub fn is_leader(&self) -> bool {
        matches!(self, Membership::Leader(_))
    }
}

/// Per-identifier record
///
/// Only the lead node of an SCC carries meaningful sets:
/// - `succ`: transitive reduction successors (lead nodes only)
/// - `pred`: exact inverse of `succ`
/// - `succ_closed`: every lead node reachable from this one, itself excluded
#[derive(Debug, Clone, Default)]
pub struct GraphNode {
    pub(crate) succ: FxHashSet<NodeIdx>,
    pub(crate) pred: FxHashSet<NodeIdx>,
    pub(crate) succ_closed: FxHashSet<NodeIdx>,
    pub(crate) membership: Membership,
}

impl GraphNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct (reduced) successors
    pub fn successors(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.succ.iter().copied()
    }

    /// Direct predecessors
    pub fn predecessors(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.pred.iter().copied()
    }

    /// Every node reachable from this one
    pub fn closed_successors(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.succ_closed.iter().copied()
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    /// Drop all structural links, leaving an isolated singleton
    pub(crate) fn reset(&mut self) {
        self.succ.clear();
        self.pred.clear();
        self.succ_closed.clear();
        self.membership = Membership::Singleton;
    }
}
