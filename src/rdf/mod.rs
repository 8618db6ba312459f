//! RDF front end for relation closures
//!
//! Exposes a cached transitive relation (`rdfs:subClassOf`,
//! `rdfs:subPropertyOf`, ...) through triple-pattern queries:
//! - RDF terms wrapping oxrdf primitives
//! - A `Finder` trait for anything answering triple patterns
//! - `RelationFinder`, which answers patterns over one relation from its closure
//!
//! # Example
//!
//! ```rust
//! use samyama_closure::rdf::{Finder, NamedNode, RelationFinder, Triple, TriplePattern};
//!
//! let finder = RelationFinder::sub_class_of("http://example.org/vocab#directSubClassOf").unwrap();
//! let student = NamedNode::new("http://example.org/Student").unwrap();
//! let person = NamedNode::new("http://example.org/Person").unwrap();
//!
//! let triple = Triple::new(student.clone().into(), finder.closed_predicate().clone(), person.into());
//! finder.add_triple(&triple).unwrap();
//!
//! let pattern = TriplePattern::new(Some(student.into()), None, None);
//! assert_eq!(finder.find(&pattern).unwrap().count(), 2);
//! ```

mod finder;
mod types;

pub use finder::{Finder, RelationFinder, TripleIter, RDFS_SUB_CLASS_OF, RDFS_SUB_PROPERTY_OF};
pub use types::{
    BlankNode, Literal, NamedNode, RdfError, RdfObject, RdfPredicate, RdfResult, RdfSubject, Triple,
    TriplePattern,
};
