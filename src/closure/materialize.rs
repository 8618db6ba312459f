//! Optional memo of materialized successor rows
//!
//! A row lists every identifier a lead node's SCC relates to: the SCC
//! members first, then each (direct or closed) successor with its own
//! aliases. Queries for any member of the SCC replay the row, skipping
//! the queried identifier itself. Rows are dropped whenever the lead's
//! sets or membership change.

use super::node::NodeIdx;
use rustc_hash::FxHashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct RowPair<N> {
    direct: Option<Arc<[N]>>,
    closed: Option<Arc<[N]>>,
}

impl<N> Default for RowPair<N> {
    fn default() -> Self {
        Self {
            direct: None,
            closed: None,
        }
    }
}

/// Per-lead memo of materialized rows
#[derive(Debug, Clone)]
pub struct MaterializedRows<N> {
    enabled: bool,
    rows: FxHashMap<NodeIdx, RowPair<N>>,
}

impl<N> MaterializedRows<N> {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            rows: FxHashMap::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch memoization on or off; switching off releases every row
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.rows.clear();
        }
        self.enabled = enabled;
    }

    pub fn get(&self, lead: NodeIdx, closed: bool) -> Option<Arc<[N]>> {
        let pair = self.rows.get(&lead)?;
        if closed {
            pair.closed.clone()
        } else {
            pair.direct.clone()
        }
    }

    pub fn contains(&self, lead: NodeIdx, closed: bool) -> bool {
        self.rows.get(&lead).map_or(false, |pair| {
            if closed {
                pair.closed.is_some()
            } else {
                pair.direct.is_some()
            }
        })
    }

    pub fn store(&mut self, lead: NodeIdx, closed: bool, row: Arc<[N]>) {
        if !self.enabled {
            return;
        }
        let pair = self.rows.entry(lead).or_default();
        if closed {
            pair.closed = Some(row);
        } else {
            pair.direct = Some(row);
        }
    }

    /// Forget the rows of one node
    pub fn invalidate(&mut self, idx: NodeIdx) {
        if self.enabled {
            self.rows.remove(&idx);
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Number of leads with at least one memoized row
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
