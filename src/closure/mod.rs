//! Incremental transitive closure of a binary relation
//!
//! Maintains, under edge insertion and batched deletion, both the
//! transitive reduction (direct links) and the transitive closure of an
//! arbitrary relation over hashable identifiers. Cycles are collapsed into
//! strongly connected components represented by one lead node, so the
//! stored structure is always a DAG.
//!
//! # Example
//!
//! ```rust
//! use samyama_closure::closure::TransitiveGraph;
//!
//! let mut graph = TransitiveGraph::new();
//! graph.insert_edge(&"Student", &"Person").unwrap();
//! graph.insert_edge(&"Person", &"Agent").unwrap();
//!
//! assert!(graph.reaches(&"Student", &"Agent", true));
//! assert!(!graph.reaches(&"Student", &"Agent", false));
//!
//! let supers: Vec<_> = graph.successors_of(&"Student", true).map(|(_, o)| o).collect();
//! assert_eq!(supers.len(), 3);
//! ```

mod cache;
mod config;
mod error;
mod graph;
mod materialize;
mod node;
mod propagate;
mod registry;
mod walker;

pub use cache::TransitiveGraphCache;
pub use config::CacheConfig;
pub use error::{ClosureError, ClosureResult};
pub use graph::{CacheStats, TransitiveGraph};
pub use materialize::MaterializedRows;
pub use node::{GraphNode, Membership, NodeIdx};
pub use registry::NodeRegistry;
pub use walker::Pairs;
