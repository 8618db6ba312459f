//! Lazy pair iteration over the reduction and closure
//!
//! Walkers hold only arena indices and snapshots of successor or
//! predecessor sets. The graph is handed to them on every step, so one
//! `Pairs` value can own either a plain borrow of the graph or a read
//! guard on the thread-safe cache.

use super::graph::TransitiveGraph;
use super::node::NodeIdx;
use rustc_hash::FxHashSet;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::{Arc, RwLockReadGuard};

/// Access to the graph a `Pairs` iterator walks over
pub(crate) enum GraphRef<'a, N> {
    Borrowed(&'a TransitiveGraph<N>),
    Shared(RwLockReadGuard<'a, TransitiveGraph<N>>),
}

impl<N> Deref for GraphRef<'_, N> {
    type Target = TransitiveGraph<N>;

    fn deref(&self) -> &Self::Target {
        match self {
            GraphRef::Borrowed(graph) => graph,
            GraphRef::Shared(guard) => &**guard,
        }
    }
}

/// Iterator over `(subject, object)` pairs of the relation
///
/// While it lives the graph cannot be mutated: it either borrows the
/// graph or holds a read lock on the cache.
pub struct Pairs<'a, N> {
    graph: GraphRef<'a, N>,
    walk: Walk<N>,
}

impl<'a, N: Clone + Eq + Hash> Pairs<'a, N> {
    pub(crate) fn new(graph: GraphRef<'a, N>, walk: Walk<N>) -> Self {
        Self { graph, walk }
    }
}

impl<N: Clone + Eq + Hash> Iterator for Pairs<'_, N> {
    type Item = (N, N);

    fn next(&mut self) -> Option<Self::Item> {
        self.walk.next(&self.graph)
    }
}

/// Iteration state for one query pattern
pub(crate) enum Walk<N> {
    Empty,
    Single(Option<(N, N)>),
    Rows(RowWalk<N>),
    Successors(SuccessorWalk),
    Predecessors(PredecessorWalk),
    All(FullGraphWalk),
}

impl<N: Clone + Eq + Hash> Walk<N> {
    pub(crate) fn single(subject: N, object: N) -> Self {
        Walk::Single(Some((subject, object)))
    }

    pub(crate) fn rows(root: NodeIdx, row: Arc<[N]>) -> Self {
        Walk::Rows(RowWalk {
            root,
            row,
            pos: 0,
            started: false,
        })
    }

    pub(crate) fn successors(graph: &TransitiveGraph<N>, root: NodeIdx, closed: bool) -> Self {
        Walk::Successors(SuccessorWalk::new(graph, root, closed))
    }

    pub(crate) fn predecessors(graph: &TransitiveGraph<N>, root: NodeIdx, closed: bool) -> Self {
        Walk::Predecessors(PredecessorWalk::new(graph, root, closed))
    }

    pub(crate) fn all(closed: bool) -> Self {
        Walk::All(FullGraphWalk {
            closed,
            next_root: 0,
            current: None,
        })
    }

    fn next(&mut self, graph: &TransitiveGraph<N>) -> Option<(N, N)> {
        let raw = match self {
            Walk::Empty => None,
            Walk::Single(pair) => return pair.take(),
            Walk::Rows(walk) => return walk.next(graph),
            Walk::Successors(walk) => walk.next(graph),
            Walk::Predecessors(walk) => walk.next(graph),
            Walk::All(walk) => walk.next(graph),
        };
        raw.map(|(s, o)| (graph.registry.id(s).clone(), graph.registry.id(o).clone()))
    }
}

/// Members of one SCC, optionally skipping one of them
#[derive(Debug, Clone)]
pub(crate) struct MemberCursor {
    lead: NodeIdx,
    pos: usize,
    skip: Option<NodeIdx>,
}

impl MemberCursor {
    fn new(lead: NodeIdx, skip: Option<NodeIdx>) -> Self {
        Self { lead, pos: 0, skip }
    }

    fn next<N: Eq + Hash>(&mut self, graph: &TransitiveGraph<N>) -> Option<NodeIdx> {
        loop {
            let member = graph.registry.member_at(self.lead, self.pos)?;
            self.pos += 1;
            if Some(member) != self.skip {
                return Some(member);
            }
        }
    }
}

/// Replays a memoized row for one subject
pub(crate) struct RowWalk<N> {
    root: NodeIdx,
    row: Arc<[N]>,
    pos: usize,
    started: bool,
}

impl<N: Clone + Eq + Hash> RowWalk<N> {
    fn next(&mut self, graph: &TransitiveGraph<N>) -> Option<(N, N)> {
        let subject = graph.registry.id(self.root);
        if !self.started {
            self.started = true;
            return Some((subject.clone(), subject.clone()));
        }
        while let Some(object) = self.row.get(self.pos) {
            self.pos += 1;
            if object != subject {
                return Some((subject.clone(), object.clone()));
            }
        }
        None
    }
}

/// Successors of one node: itself, its SCC siblings, then every member of
/// every direct (or closed) successor
#[derive(Debug, Clone)]
pub(crate) struct SuccessorWalk {
    root: NodeIdx,
    started: bool,
    siblings: MemberCursor,
    targets: Vec<NodeIdx>,
    next_target: usize,
    current: Option<MemberCursor>,
}

impl SuccessorWalk {
    fn new<N: Eq + Hash>(graph: &TransitiveGraph<N>, root: NodeIdx, closed: bool) -> Self {
        let lead = graph.registry.lead_of(root);
        let node = graph.registry.node(lead);
        let targets = if closed {
            node.closed_successors().collect()
        } else {
            node.successors().collect()
        };
        Self {
            root,
            started: false,
            siblings: MemberCursor::new(lead, Some(root)),
            targets,
            next_target: 0,
            current: None,
        }
    }

    fn next<N: Eq + Hash>(&mut self, graph: &TransitiveGraph<N>) -> Option<(NodeIdx, NodeIdx)> {
        if !self.started {
            self.started = true;
            return Some((self.root, self.root));
        }
        if let Some(sibling) = self.siblings.next(graph) {
            return Some((self.root, sibling));
        }
        loop {
            if let Some(cursor) = self.current.as_mut() {
                if let Some(member) = cursor.next(graph) {
                    return Some((self.root, member));
                }
            }
            let target = *self.targets.get(self.next_target)?;
            self.next_target += 1;
            self.current = Some(MemberCursor::new(target, None));
        }
    }
}

/// Predecessors of one node: itself, its SCC siblings, then every member
/// of every direct (or transitive) predecessor
#[derive(Debug, Clone)]
pub(crate) struct PredecessorWalk {
    root: NodeIdx,
    closed: bool,
    started: bool,
    siblings: MemberCursor,
    /// Predecessor snapshots still being scanned, with scan position
    stack: Vec<(Vec<NodeIdx>, usize)>,
    visited: FxHashSet<NodeIdx>,
    current: Option<MemberCursor>,
}

impl PredecessorWalk {
    fn new<N: Eq + Hash>(graph: &TransitiveGraph<N>, root: NodeIdx, closed: bool) -> Self {
        let lead = graph.registry.lead_of(root);
        let mut visited = FxHashSet::default();
        visited.insert(lead);
        Self {
            root,
            closed,
            started: false,
            siblings: MemberCursor::new(lead, Some(root)),
            stack: vec![(graph.registry.node(lead).predecessors().collect(), 0)],
            visited,
            current: None,
        }
    }

    fn next<N: Eq + Hash>(&mut self, graph: &TransitiveGraph<N>) -> Option<(NodeIdx, NodeIdx)> {
        if !self.started {
            self.started = true;
            return Some((self.root, self.root));
        }
        if let Some(sibling) = self.siblings.next(graph) {
            return Some((sibling, self.root));
        }
        loop {
            if let Some(cursor) = self.current.as_mut() {
                if let Some(member) = cursor.next(graph) {
                    return Some((member, self.root));
                }
                self.current = None;
            }

            let (preds, pos) = self.stack.last_mut()?;
            let Some(&pred) = preds.get(*pos) else {
                self.stack.pop();
                continue;
            };
            *pos += 1;
            if !self.visited.insert(pred) {
                continue;
            }
            self.current = Some(MemberCursor::new(pred, None));
            if self.closed {
                self.stack.push((graph.registry.node(pred).predecessors().collect(), 0));
            }
        }
    }
}

/// Successor walk of every registered node, in registration order
#[derive(Debug, Clone)]
pub(crate) struct FullGraphWalk {
    closed: bool,
    next_root: usize,
    current: Option<SuccessorWalk>,
}

impl FullGraphWalk {
    fn next<N: Eq + Hash>(&mut self, graph: &TransitiveGraph<N>) -> Option<(NodeIdx, NodeIdx)> {
        loop {
            if let Some(walk) = self.current.as_mut() {
                if let Some(pair) = walk.next(graph) {
                    return Some(pair);
                }
            }
            if self.next_root >= graph.registry.len() {
                return None;
            }
            let root = NodeIdx::new(self.next_root);
            self.next_root += 1;
            self.current = Some(SuccessorWalk::new(graph, root, self.closed));
        }
    }
}
