//! Closure propagation over predecessor chains
//!
//! Every insertion either adds a reduction edge between two lead nodes or
//! closes a cycle. In both cases the new reachability has to be pushed to
//! all ancestors, and reduction edges made redundant by it must go.

use super::graph::TransitiveGraph;
use super::node::{Membership, NodeIdx};
use rustc_hash::FxHashSet;
use std::hash::Hash;

impl<N: Clone + Eq + Hash> TransitiveGraph<N> {
    /// Depth-first walk over `starts` and everything that reaches them
    ///
    /// The visitor returns reduction edges to drop. They are applied once
    /// the walk is over, so predecessor sets stay stable while walking.
    /// Returns the visited nodes in visit order.
    pub(crate) fn visit_predecessors<F>(&mut self, starts: &[NodeIdx], include_start: bool, mut visitor: F) -> Vec<NodeIdx>
    where
        F: FnMut(&mut Self, NodeIdx) -> Vec<(NodeIdx, NodeIdx)>,
    {
        let mut seen: FxHashSet<NodeIdx> = starts.iter().copied().collect();
        let mut order = Vec::new();
        let mut removals = Vec::new();
        let mut stack: Vec<NodeIdx> = Vec::new();

        for &start in starts {
            if include_start {
                removals.extend(visitor(self, start));
                order.push(start);
            }
            stack.extend(self.node(start).predecessors());
        }

        while let Some(idx) = stack.pop() {
            if !seen.insert(idx) {
                continue;
            }
            removals.extend(visitor(self, idx));
            order.push(idx);
            stack.extend(self.node(idx).predecessors().filter(|p| !seen.contains(p)));
        }

        for (from, to) in removals {
            self.unlink(from, to);
        }
        order
    }

    /// Lead nodes on a cycle through `start -> end`: `end` plus every
    /// ancestor of `start` (itself included) that `end` reaches
    pub(crate) fn scc_members(&mut self, start: NodeIdx, end: NodeIdx) -> Vec<NodeIdx> {
        let mut members = vec![end];
        let found = self.visit_predecessors(&[start], true, |_, _| Vec::new());
        members.extend(found.into_iter().filter(|&node| node != end && self.path_to(end, node)));
        members
    }

    /// Push `end`'s closure to `start` and all its ancestors, dropping
    /// reduction edges the new path makes redundant
    pub(crate) fn propagate_add(&mut self, start: NodeIdx, end: NodeIdx) {
        let mut closure = self.node(end).succ_closed.clone();
        closure.insert(end);

        self.visit_predecessors(&[start], true, |graph, node| {
            graph.extend_closed(node, &closure);
            graph
                .node(node)
                .successors()
                .filter(|s| closure.contains(s))
                .map(|s| (node, s))
                .collect()
        });
    }

    /// Collapse `members` into a single SCC represented by `lead`
    ///
    /// Members may already lead SCCs of their own; those are absorbed.
    /// External edges of every member are re-targeted at `lead`.
    pub(crate) fn make_lead_node_for(&mut self, lead: NodeIdx, members: &[NodeIdx]) {
        let mut all_members: Vec<NodeIdx> = Vec::new();
        for &member in members {
            all_members.extend(self.registry.members(member));
        }
        all_members.sort_unstable();
        all_members.dedup();
        let member_set: FxHashSet<NodeIdx> = all_members.iter().copied().collect();

        // Combined external edges of the component
        let mut succ: FxHashSet<NodeIdx> = FxHashSet::default();
        let mut succ_closed: FxHashSet<NodeIdx> = FxHashSet::default();
        let mut pred: FxHashSet<NodeIdx> = FxHashSet::default();
        for &member in &member_set {
            let node = self.node(member);
            succ.extend(node.successors().filter(|s| !member_set.contains(s)));
            succ_closed.extend(node.closed_successors().filter(|s| !member_set.contains(s)));
            pred.extend(node.predecessors().filter(|p| !member_set.contains(p)));
        }

        // Detach members from the outside
        for &member in &member_set {
            let outgoing: Vec<NodeIdx> = self.node(member).successors().collect();
            for target in outgoing.into_iter().filter(|t| !member_set.contains(t)) {
                self.registry.node_mut(target).pred.remove(&member);
            }
            let incoming: Vec<NodeIdx> = self.node(member).predecessors().collect();
            for source in incoming.into_iter().filter(|s| !member_set.contains(s)) {
                let node = self.registry.node_mut(source);
                node.succ.remove(&member);
                node.succ_closed.remove(&member);
                self.rows.invalidate(source);
            }
        }

        // Targets reachable through another target are not reduction edges
        let redundant: Vec<NodeIdx> = succ
            .iter()
            .copied()
            .filter(|&x| succ.iter().any(|&y| y != x && self.node(y).succ_closed.contains(&x)))
            .collect();
        for x in redundant {
            succ.remove(&x);
        }

        // Attach the lead
        for &target in &succ {
            self.registry.node_mut(target).pred.insert(lead);
        }
        for &source in &pred {
            let node = self.registry.node_mut(source);
            node.succ.insert(lead);
            node.succ_closed.insert(lead);
            self.rows.invalidate(source);
        }

        for &member in &member_set {
            let node = self.registry.node_mut(member);
            node.reset();
            if member != lead {
                node.membership = Membership::Subordinate(lead);
            }
            self.rows.invalidate(member);
        }
        let node = self.registry.node_mut(lead);
        node.succ = succ;
        node.succ_closed = succ_closed;
        node.pred = pred;
        node.membership = Membership::Leader(all_members);
    }

    /// Push the closure of a freshly collapsed SCC to all its ancestors
    ///
    /// Ancestors may still list absorbed members in their closure, and
    /// may hold reduction edges that became redundant once several
    /// members turned into one node.
    pub(crate) fn propagate_scc(&mut self, lead: NodeIdx, members: &[NodeIdx]) {
        let absorbed: FxHashSet<NodeIdx> = members
            .iter()
            .copied()
            .filter(|&m| m != lead)
            .collect();
        let below = self.node(lead).succ_closed.clone();
        let mut closure = below.clone();
        closure.insert(lead);

        let visited = self.visit_predecessors(&[lead], false, |graph, node| {
            graph.registry.node_mut(node).succ_closed.retain(|x| !absorbed.contains(x));
            graph.extend_closed(node, &closure);
            graph
                .node(node)
                .successors()
                .filter(|s| below.contains(s))
                .map(|s| (node, s))
                .collect()
        });

        let mut redundant = Vec::new();
        for &node in &visited {
            let succ = &self.node(node).succ;
            for &x in succ {
                if succ.iter().any(|&y| y != x && self.node(y).succ_closed.contains(&x)) {
                    redundant.push((node, x));
                }
            }
        }
        for (from, to) in redundant {
            self.unlink(from, to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(graph: &TransitiveGraph<&'static str>, id: &'static str) -> NodeIdx {
        graph.registry().get(&id).unwrap()
    }

    fn check_invariants(graph: &TransitiveGraph<&'static str>) {
        for node in graph.registry().indices() {
            let record = graph.node(node);
            if record.membership().is_subordinate() {
                assert!(record.successors().next().is_none());
                assert!(record.predecessors().next().is_none());
                continue;
            }
            for succ in record.successors() {
                assert!(graph.node(succ).pred.contains(&node), "pred missing for {} -> {}", node, succ);
                assert!(record.succ_closed.contains(&succ));
                assert!(!graph.node(succ).membership().is_subordinate());
            }
            for closed in record.closed_successors() {
                assert!(!graph.node(closed).membership().is_subordinate());
                assert_ne!(closed, node);
            }
        }
    }

    #[test]
    fn test_visit_predecessors_reaches_all_ancestors() {
        let mut graph = TransitiveGraph::new();
        graph.insert_edge(&"a", &"b").unwrap();
        graph.insert_edge(&"b", &"c").unwrap();
        graph.insert_edge(&"x", &"c").unwrap();
        let c = idx(&graph, "c");

        let mut visited = graph.visit_predecessors(&[c], false, |_, _| Vec::new());
        visited.sort();
        let mut expected = vec![idx(&graph, "a"), idx(&graph, "b"), idx(&graph, "x")];
        expected.sort();
        assert_eq!(visited, expected);

        let with_start = graph.visit_predecessors(&[c], true, |_, _| Vec::new());
        assert_eq!(with_start[0], c);
        assert_eq!(with_start.len(), 4);
    }

    #[test]
    fn test_propagate_add_updates_ancestors() {
        // Adding b -> c after a -> b and a -> c: a -> c must go
        let mut graph = TransitiveGraph::new();
        graph.insert_edge(&"a", &"b").unwrap();
        graph.insert_edge(&"a", &"c").unwrap();
        graph.insert_edge(&"c", &"d").unwrap();
        graph.insert_edge(&"b", &"c").unwrap();
        check_invariants(&graph);

        let (a, b, c, d) = (idx(&graph, "a"), idx(&graph, "b"), idx(&graph, "c"), idx(&graph, "d"));
        assert_eq!(graph.node(a).successors().collect::<Vec<_>>(), vec![b]);
        assert!(graph.node(a).succ_closed.contains(&d));
        assert!(graph.node(c).pred.contains(&b));
        assert!(!graph.node(c).pred.contains(&a));
    }

    #[test]
    fn test_scc_members_of_long_cycle() {
        let mut graph = TransitiveGraph::new();
        for (s, o) in [("a", "b"), ("b", "c"), ("c", "d"), ("z", "a")] {
            graph.insert_edge(&s, &o).unwrap();
        }
        let (a, d) = (idx(&graph, "a"), idx(&graph, "d"));
        let mut members = graph.scc_members(d, a);
        members.sort();
        let mut expected: Vec<NodeIdx> = ["a", "b", "c", "d"].iter().map(|n| idx(&graph, n)).collect();
        expected.sort();
        assert_eq!(members, expected);
    }

    #[test]
    fn test_make_lead_absorbs_existing_scc() {
        let mut graph = TransitiveGraph::new();
        graph.insert_edge(&"a", &"b").unwrap();
        graph.insert_edge(&"b", &"a").unwrap();
        graph.insert_edge(&"b", &"c").unwrap();
        graph.insert_edge(&"c", &"a").unwrap();
        graph.insert_edge(&"p", &"c").unwrap();
        graph.insert_edge(&"a", &"q").unwrap();
        check_invariants(&graph);

        let stats = graph.stats();
        assert_eq!(stats.sccs, 1);
        assert_eq!(stats.lead_nodes, 3);
        assert_eq!(stats.reduction_edges, 2);

        let lead = graph.registry().resolve(&"c").unwrap();
        assert_eq!(graph.registry().members(lead).count(), 3);
        assert!(graph.node(idx(&graph, "p")).succ.contains(&lead));
    }

    #[test]
    fn test_propagate_scc_strips_absorbed_members() {
        let mut graph = TransitiveGraph::new();
        graph.insert_edge(&"top", &"m1").unwrap();
        graph.insert_edge(&"m1", &"m2").unwrap();
        graph.insert_edge(&"m2", &"m3").unwrap();
        graph.insert_edge(&"m3", &"m1").unwrap();
        check_invariants(&graph);

        let top = idx(&graph, "top");
        let lead = graph.registry().resolve(&"m1").unwrap();
        let closed: Vec<NodeIdx> = graph.node(top).closed_successors().collect();
        assert_eq!(closed, vec![lead]);
    }
}
