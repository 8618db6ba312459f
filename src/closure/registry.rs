//! Node registry
//!
//! Maps caller-supplied identifiers to arena slots. Identifiers are
//! interned in an `IndexSet`, so a slot's `NodeIdx` is also the
//! identifier's position in registration order. Records are created
//! lazily and only released by `clear()`.

use super::error::{ClosureError, ClosureResult};
use super::node::{GraphNode, Membership, NodeIdx};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use std::hash::Hash;

/// Arena of graph nodes keyed by external identifier
#[derive(Debug, Clone)]
pub struct NodeRegistry<N> {
    /// Interned identifiers; position == arena slot
    ids: IndexSet<N, FxBuildHasher>,
    /// Node records, aligned with `ids`
    nodes: Vec<GraphNode>,
}

impl<N: Eq + Hash> NodeRegistry<N> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            ids: IndexSet::with_hasher(FxBuildHasher),
            nodes: Vec::new(),
        }
    }

    /// Number of registered identifiers
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Raw slot of an identifier, if it has been seen
    pub fn get(&self, id: &N) -> Option<NodeIdx> {
        self.ids.get_index_of(id).map(NodeIdx)
    }

    /// Lead node of an identifier's SCC, if it has been seen
    pub fn resolve(&self, id: &N) -> Option<NodeIdx> {
        self.get(id).map(|idx| self.lead_of(idx))
    }

    /// Identifier stored in a slot
    pub fn id(&self, idx: NodeIdx) -> &N {
        &self.ids[idx.0]
    }

    /// All registered identifiers, in registration order
    pub fn ids(&self) -> impl Iterator<Item = &N> + '_ {
        self.ids.iter()
    }

    /// All arena slots, in registration order
    pub fn indices(&self) -> impl Iterator<Item = NodeIdx> {
        (0..self.nodes.len()).map(NodeIdx)
    }

    pub fn node(&self, idx: NodeIdx) -> &GraphNode {
        &self.nodes[idx.0]
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIdx) -> &mut GraphNode {
        &mut self.nodes[idx.0]
    }

    /// Representative of the SCC containing `idx`
    pub fn lead_of(&self, idx: NodeIdx) -> NodeIdx {
        let mut current = idx;
        while let Membership::Subordinate(lead) = self.nodes[current.0].membership {
            current = lead;
        }
        current
    }

    /// The `pos`-th member of the SCC led by `lead`.
    /// A node outside any SCC is its own single member.
    pub fn member_at(&self, lead: NodeIdx, pos: usize) -> Option<NodeIdx> {
        match &self.nodes[lead.0].membership {
            Membership::Leader(members) => members.get(pos).copied(),
            _ if pos == 0 => Some(lead),
            _ => None,
        }
    }

    /// Every member of the SCC led by `lead`
    pub fn members(&self, lead: NodeIdx) -> impl Iterator<Item = NodeIdx> + '_ {
        (0..).map_while(move |pos| self.member_at(lead, pos))
    }

    /// Drop every identifier and record
    pub fn clear(&mut self) {
        self.ids.clear();
        self.nodes.clear();
    }
}

impl<N: Eq + Hash + Clone> NodeRegistry<N> {
    /// Raw slot of an identifier, allocating a singleton record on first sight
    pub fn register(&mut self, id: &N) -> ClosureResult<NodeIdx> {
        if let Some(idx) = self.get(id) {
            return Ok(idx);
        }
        let (slot, inserted) = self.ids.insert_full(id.clone());
        if !inserted || slot != self.nodes.len() {
            return Err(ClosureError::Inconsistent(format!(
                "registry slot {} already taken while allocating slot {}",
                slot,
                self.nodes.len()
            )));
        }
        self.nodes.push(GraphNode::new());
        Ok(NodeIdx(slot))
    }
}

impl<N: Eq + Hash> Default for NodeRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_stable() {
        let mut registry = NodeRegistry::new();
        let a = registry.register(&"a").unwrap();
        let b = registry.register(&"b").unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.register(&"a").unwrap(), a);
        assert_eq!(registry.len(), 2);
        assert_eq!(*registry.id(b), "b");
        assert_eq!(registry.ids().copied().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_identifier() {
        let registry: NodeRegistry<&str> = NodeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.get(&"missing"), None);
        assert_eq!(registry.resolve(&"missing"), None);
    }

    #[test]
    fn test_lead_resolution() {
        let mut registry = NodeRegistry::new();
        let a = registry.register(&"a").unwrap();
        let b = registry.register(&"b").unwrap();
        let c = registry.register(&"c").unwrap();

        registry.node_mut(a).membership = Membership::Leader(vec![a, b]);
        registry.node_mut(b).membership = Membership::Subordinate(a);

        assert_eq!(registry.lead_of(b), a);
        assert_eq!(registry.resolve(&"b"), Some(a));
        assert_eq!(registry.members(a).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(registry.members(c).collect::<Vec<_>>(), vec![c]);
        assert_eq!(registry.member_at(c, 1), None);
    }

    #[test]
    fn test_clear() {
        let mut registry = NodeRegistry::new();
        registry.register(&1u32).unwrap();
        registry.register(&2u32).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.register(&2u32).unwrap(), NodeIdx::new(0));
    }
}
