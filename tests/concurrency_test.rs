use samyama_closure::{CacheConfig, TransitiveGraphCache};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_writers_build_one_chain() {
    let cache = Arc::new(TransitiveGraphCache::new());

    let handles: Vec<_> = (0..8u32)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..50u32 {
                    let n = t * 50 + i;
                    cache.insert_edge(&n, &(n + 1)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len().unwrap(), 401);
    assert_eq!(cache.successors_of(&0, true).unwrap().count(), 401);
    assert_eq!(cache.successors_of(&0, false).unwrap().count(), 2);
    assert!(cache.reaches(&17, &400, true).unwrap());
}

#[test]
fn test_readers_during_writes() {
    let cache = Arc::new(TransitiveGraphCache::with_config(CacheConfig::caching()));
    for i in 0..20u32 {
        cache.insert_edge(&i, &(i + 1)).unwrap();
    }

    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for i in 100..200u32 {
                cache.insert_edge(&i, &0).unwrap();
                if i % 10 == 0 {
                    cache.delete_edge(&(i - 5), &0).unwrap();
                }
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..50 {
                    // The chain below 0 is never touched by the writer
                    let reached: BTreeSet<u32> = cache.successors_of(&0, true).unwrap().map(|(_, o)| o).collect();
                    assert_eq!(reached, (0..=20).collect());
                    let preds = cache.predecessors_of(&20, false).unwrap().count();
                    assert_eq!(preds, 2);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    // 100 writer edges minus the 9 deletions that hit an existing edge (105, 115, ..., 185)
    let preds = cache.predecessors_of(&0, false).unwrap().count();
    assert_eq!(preds, 1 + 100 - 9);
}

#[test]
fn test_deep_copy_while_shared() {
    let cache = Arc::new(TransitiveGraphCache::new());
    cache.insert_edge(&"a", &"b").unwrap();
    cache.insert_edge(&"b", &"a").unwrap();

    let copier = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || cache.deep_copy().unwrap())
    };
    let copy = copier.join().unwrap();
    cache.insert_edge(&"b", &"c").unwrap();

    assert!(!copy.reaches(&"a", &"c", true).unwrap());
    assert!(cache.reaches(&"a", &"c", true).unwrap());
    assert_eq!(copy.stats().unwrap().sccs, 1);
}
