use anyhow::Context;
use samyama_closure::rdf::{Finder, NamedNode, RelationFinder, Triple, TriplePattern};
use samyama_closure::{CacheConfig, TransitiveGraphCache};
use std::sync::Arc;
use std::thread;

const DIRECT_SUB_CLASS_OF: &str = "http://samyama.ai/closure#directSubClassOf";

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Samyama Closure v{}", samyama_closure::version());
    println!("==========================================");
    println!();

    // Optional JSON config as first argument
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("reading config {}", path))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path))?
        }
        None => CacheConfig::caching(),
    };
    println!("Config: {}", serde_json::to_string(&config)?);

    demo_class_hierarchy(config.clone())?;
    demo_shared_cache(config)?;
    Ok(())
}

fn class(name: &str) -> anyhow::Result<NamedNode> {
    Ok(NamedNode::new(&format!("http://example.org/{}", name))?)
}

fn demo_class_hierarchy(config: CacheConfig) -> anyhow::Result<()> {
    println!("\n=== Demo 1: Class Hierarchy ===");
    let base = RelationFinder::sub_class_of(DIRECT_SUB_CLASS_OF)?;
    let finder = RelationFinder::with_config(
        base.direct_predicate().clone(),
        base.closed_predicate().clone(),
        config,
    );
    let sub_class_of = finder.closed_predicate().clone();

    let edges = [
        ("Student", "Person"),
        ("Teacher", "Person"),
        ("Person", "Agent"),
        ("Organization", "Agent"),
        ("Student", "Agent"),
        ("Human", "Person"),
        ("Person", "Human"),
    ];
    for (sub, sup) in edges {
        finder.add_triple(&Triple::new(class(sub)?.into(), sub_class_of.clone(), class(sup)?.into()))?;
        println!("✓ {} subClassOf {}", sub, sup);
    }

    let student = class("Student")?;
    for (label, predicate) in [("direct", finder.direct_predicate()), ("closed", finder.closed_predicate())] {
        let pattern = TriplePattern::new(Some(student.clone().into()), Some(predicate.clone()), None);
        println!("\nStudent superclasses ({}):", label);
        for triple in finder.find(&pattern)? {
            println!("  {}", triple.object);
        }
    }

    println!("\nRemoving Person subClassOf Agent");
    finder.remove_triple(&Triple::new(class("Person")?.into(), sub_class_of, class("Agent")?.into()))?;
    let pattern = TriplePattern::new(None, Some(finder.closed_predicate().clone()), Some(class("Agent")?.into()));
    println!("Agent subclasses (closed):");
    for triple in finder.find(&pattern)? {
        println!("  {}", triple.subject);
    }

    println!("\nStats: {}", serde_json::to_string_pretty(&finder.stats()?)?);
    Ok(())
}

fn demo_shared_cache(config: CacheConfig) -> anyhow::Result<()> {
    println!("\n=== Demo 2: Shared Cache ===");
    let cache = Arc::new(TransitiveGraphCache::with_config(config));

    let writers: Vec<_> = (0..4u32)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || -> samyama_closure::ClosureResult<()> {
                for i in 0..25u32 {
                    let n = t * 25 + i;
                    cache.insert_edge(&n, &(n + 1))?;
                }
                Ok(())
            })
        })
        .collect();
    for writer in writers {
        writer
            .join()
            .map_err(|_| anyhow::anyhow!("writer thread panicked"))??;
    }

    let reachable = cache.successors_of(&0, true)?.count();
    println!("✓ 4 writers built a chain of {} nodes", cache.len()?);
    println!("✓ node 0 reaches {} nodes (reflexive included)", reachable);
    println!("Stats: {}", serde_json::to_string(&cache.stats()?)?);
    Ok(())
}
