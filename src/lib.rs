//! Samyama Closure
//!
//! An incrementally maintained transitive closure cache for a single
//! binary relation, such as a class or property hierarchy.
//!
//! # Architecture
//!
//! - `closure`: the generic engine. Nodes live in an arena indexed by
//!   `NodeIdx`; cycles collapse into strongly connected components; the
//!   transitive reduction and closure are updated on every insertion and
//!   rebuilt regionally after batched deletions.
//! - `rdf`: a triple-pattern front end over the engine, keyed by RDF
//!   resources.
//!
//! ## Example Usage
//!
//! ```rust
//! use samyama_closure::{CacheConfig, TransitiveGraphCache};
//!
//! let cache = TransitiveGraphCache::with_config(CacheConfig::caching());
//! cache.insert_edge(&"a", &"b").unwrap();
//! cache.insert_edge(&"b", &"c").unwrap();
//! cache.insert_edge(&"c", &"a").unwrap();
//!
//! // a, b and c form one SCC: each reaches the other two directly
//! let direct: Vec<_> = cache.successors_of(&"a", false).unwrap().collect();
//! assert_eq!(direct.len(), 3);
//! assert_eq!(cache.stats().unwrap().sccs, 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod closure;
pub mod rdf;

// Re-export main types for convenience
pub use closure::{
    CacheConfig, CacheStats, ClosureError, ClosureResult, NodeIdx, Pairs, TransitiveGraph,
    TransitiveGraphCache,
};

pub use rdf::{
    Finder, NamedNode, RdfError, RdfPredicate, RdfResult, RdfSubject, RelationFinder, Triple,
    TriplePattern,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
