//! Triple-pattern access to a cached relation closure
//!
//! A `RelationFinder` caches one transitive relation, such as
//! `rdfs:subClassOf`, under two predicates: a *direct* one whose matches
//! are the transitive reduction and a *closed* one whose matches are the
//! full reflexive closure.

use super::types::{RdfError, RdfPredicate, RdfResult, RdfSubject, Triple, TriplePattern};
use crate::closure::{CacheConfig, CacheStats, Pairs, TransitiveGraphCache};
use tracing::debug;

/// `rdfs:subClassOf`
pub const RDFS_SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
/// `rdfs:subPropertyOf`
pub const RDFS_SUB_PROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";

/// Lazily evaluated triple matches
pub type TripleIter<'a> = Box<dyn Iterator<Item = Triple> + 'a>;

/// Anything that can answer triple-pattern queries
pub trait Finder {
    /// All triples matching `pattern`
    fn find(&self, pattern: &TriplePattern) -> RdfResult<TripleIter<'_>>;

    /// Whether any triple matches `pattern`
    fn contains(&self, pattern: &TriplePattern) -> RdfResult<bool> {
        Ok(self.find(pattern)?.next().is_some())
    }
}

impl Finder for [Triple] {
    fn find(&self, pattern: &TriplePattern) -> RdfResult<TripleIter<'_>> {
        let pattern = pattern.clone();
        Ok(Box::new(
            self.iter().filter(move |t| pattern.matches(t)).cloned(),
        ))
    }
}

impl Finder for Vec<Triple> {
    fn find(&self, pattern: &TriplePattern) -> RdfResult<TripleIter<'_>> {
        self.as_slice().find(pattern)
    }
}

/// Closure cache for one relation, queried with triple patterns
#[derive(Debug)]
pub struct RelationFinder {
    direct: RdfPredicate,
    closed: RdfPredicate,
    cache: TransitiveGraphCache<RdfSubject>,
}

impl RelationFinder {
    pub fn new(direct: RdfPredicate, closed: RdfPredicate) -> Self {
        Self::with_config(direct, closed, CacheConfig::default())
    }

    pub fn with_config(direct: RdfPredicate, closed: RdfPredicate, config: CacheConfig) -> Self {
        Self {
            direct,
            closed,
            cache: TransitiveGraphCache::with_config(config),
        }
    }

    /// Closure of `rdfs:subClassOf`, with `direct` naming its reduction
    pub fn sub_class_of(direct: &str) -> RdfResult<Self> {
        Ok(Self::new(RdfPredicate::new(direct)?, RdfPredicate::new(RDFS_SUB_CLASS_OF)?))
    }

    /// Closure of `rdfs:subPropertyOf`, with `direct` naming its reduction
    pub fn sub_property_of(direct: &str) -> RdfResult<Self> {
        Ok(Self::new(RdfPredicate::new(direct)?, RdfPredicate::new(RDFS_SUB_PROPERTY_OF)?))
    }

    pub fn direct_predicate(&self) -> &RdfPredicate {
        &self.direct
    }

    pub fn closed_predicate(&self) -> &RdfPredicate {
        &self.closed
    }

    /// The underlying closure cache
    pub fn cache(&self) -> &TransitiveGraphCache<RdfSubject> {
        &self.cache
    }

    /// Register a triple's subject/object pair
    ///
    /// The predicate is not checked: callers may feed sub-properties of
    /// the cached relation. Returns false for literal objects, which
    /// cannot take part in the relation.
    pub fn add_triple(&self, triple: &Triple) -> RdfResult<bool> {
        let Ok(object) = RdfSubject::try_from(triple.object.clone()) else {
            debug!("ignoring literal object in {}", triple);
            return Ok(false);
        };
        self.cache.insert_edge(&triple.subject, &object)?;
        Ok(true)
    }

    /// Schedule removal of a triple's subject/object pair
    pub fn remove_triple(&self, triple: &Triple) -> RdfResult<()> {
        if let Ok(object) = RdfSubject::try_from(triple.object.clone()) {
            self.cache.delete_edge(&triple.subject, &object)?;
        }
        Ok(())
    }

    /// Cache every triple with `predicate` found in `source`
    ///
    /// Returns true if the source held any such triple.
    pub fn cache_all(&self, source: &dyn Finder, predicate: &RdfPredicate) -> RdfResult<bool> {
        let pattern = TriplePattern::new(None, Some(predicate.clone()), None);
        let mut found = false;
        for triple in source.find(&pattern)? {
            found = true;
            self.add_triple(&triple)?;
        }
        debug!("cached relation {} from source: {}", predicate, found);
        Ok(found)
    }

    /// Cache results chained with `continuation` for a variable predicate,
    /// cache results alone for the cached predicates, and the continuation
    /// alone otherwise
    pub fn find_with_continuation<'a>(
        &'a self,
        pattern: &TriplePattern,
        continuation: &'a dyn Finder,
    ) -> RdfResult<TripleIter<'a>> {
        match &pattern.predicate {
            None => {
                let cached = self.find(pattern)?;
                Ok(Box::new(cached.chain(continuation.find(pattern)?)))
            }
            Some(p) if *p == self.direct || *p == self.closed => self.find(pattern),
            Some(_) => continuation.find(pattern),
        }
    }

    /// Every registered resource, in registration order
    pub fn list_all_subjects(&self) -> RdfResult<Vec<RdfSubject>> {
        Ok(self.cache.nodes()?)
    }

    pub fn is_subject(&self, node: &RdfSubject) -> RdfResult<bool> {
        Ok(self.cache.contains_node(node)?)
    }

    /// Independent finder rebuilt from the cached relation's original pairs
    pub fn deep_copy(&self) -> RdfResult<Self> {
        Ok(Self {
            direct: self.direct.clone(),
            closed: self.closed.clone(),
            cache: self.cache.deep_copy()?,
        })
    }

    pub fn clear(&self) -> RdfResult<()> {
        Ok(self.cache.clear()?)
    }

    /// Switch memoization of result rows on or off
    pub fn set_caching(&self, enabled: bool) -> RdfResult<()> {
        Ok(self.cache.set_materialization_caching(enabled)?)
    }

    pub fn stats(&self) -> RdfResult<CacheStats> {
        Ok(self.cache.stats()?)
    }

    fn to_triples<'a>(&self, pairs: Pairs<'a, RdfSubject>) -> TripleIter<'a> {
        let predicate = self.closed.clone();
        Box::new(pairs.map(move |(s, o)| Triple::new(s, predicate.clone(), o.into())))
    }
}

impl Finder for RelationFinder {
    /// Matches are always reported with the closed predicate, whichever
    /// cached predicate the pattern asked for
    fn find(&self, pattern: &TriplePattern) -> RdfResult<TripleIter<'_>> {
        let closed = match &pattern.predicate {
            None => true,
            Some(p) if *p == self.closed => true,
            Some(p) if *p == self.direct => false,
            Some(_) => return Ok(Box::new(std::iter::empty())),
        };

        let object = match &pattern.object {
            None => None,
            Some(object) => match RdfSubject::try_from(object.clone()) {
                Ok(subject) => Some(subject),
                Err(RdfError::NotASubject(literal)) => {
                    debug!("literal {} can never match a relation object", literal);
                    return Ok(Box::new(std::iter::empty()));
                }
                Err(e) => return Err(e),
            },
        };

        let pairs = self
            .cache
            .query(pattern.subject.as_ref(), object.as_ref(), closed)?;
        Ok(self.to_triples(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{Literal, NamedNode};

    const DIRECT_SUB_CLASS_OF: &str = "http://example.org/vocab#directSubClassOf";

    fn node(name: &str) -> NamedNode {
        NamedNode::new(&format!("http://example.org/{}", name)).unwrap()
    }

    fn finder() -> RelationFinder {
        RelationFinder::sub_class_of(DIRECT_SUB_CLASS_OF).unwrap()
    }

    fn sub_class(s: &str, o: &str) -> Triple {
        Triple::new(node(s).into(), RdfPredicate::new(RDFS_SUB_CLASS_OF).unwrap(), node(o).into())
    }

    #[test]
    fn test_literal_objects_are_ignored() {
        let finder = finder();
        let triple = Triple::new(
            node("a").into(),
            RdfPredicate::new(RDFS_SUB_CLASS_OF).unwrap(),
            Literal::new_simple_literal("b").into(),
        );
        assert!(!finder.add_triple(&triple).unwrap());
        assert!(finder.list_all_subjects().unwrap().is_empty());

        let pattern = TriplePattern::new(None, None, Some(Literal::new_simple_literal("b").into()));
        assert!(!finder.contains(&pattern).unwrap());
    }

    #[test]
    fn test_results_use_closed_predicate() {
        let finder = finder();
        finder.add_triple(&sub_class("a", "b")).unwrap();

        let pattern = TriplePattern::new(
            Some(node("a").into()),
            Some(finder.direct_predicate().clone()),
            None,
        );
        let triples: Vec<Triple> = finder.find(&pattern).unwrap().collect();
        assert_eq!(triples.len(), 2);
        assert!(triples.iter().all(|t| t.predicate == *finder.closed_predicate()));
    }

    #[test]
    fn test_unrelated_predicate_finds_nothing() {
        let finder = finder();
        finder.add_triple(&sub_class("a", "b")).unwrap();
        let other = RdfPredicate::new("http://example.org/knows").unwrap();
        let pattern = TriplePattern::new(None, Some(other), None);
        assert_eq!(finder.find(&pattern).unwrap().count(), 0);
    }

    #[test]
    fn test_slice_finder() {
        let triples = vec![sub_class("a", "b"), sub_class("b", "c")];
        let pattern = TriplePattern::new(Some(node("b").into()), None, None);
        assert_eq!(triples.find(&pattern).unwrap().count(), 1);
        assert!(Finder::contains(triples.as_slice(), &pattern).unwrap());
    }
}
