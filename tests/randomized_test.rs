use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use samyama_closure::{CacheConfig, TransitiveGraph};
use std::collections::BTreeSet;

/// Brute-force model: the edge set plus every identifier ever seen
#[derive(Default)]
struct Model {
    nodes: BTreeSet<u32>,
    edges: BTreeSet<(u32, u32)>,
}

impl Model {
    fn insert(&mut self, s: u32, o: u32) {
        self.nodes.insert(s);
        self.nodes.insert(o);
        if s != o {
            self.edges.insert((s, o));
        }
    }

    fn delete(&mut self, s: u32, o: u32) {
        self.edges.remove(&(s, o));
    }

    /// Reflexive transitive closure by repeated search
    fn closure(&self) -> BTreeSet<(u32, u32)> {
        let mut result = BTreeSet::new();
        for &start in &self.nodes {
            let mut seen = BTreeSet::from([start]);
            let mut stack = vec![start];
            while let Some(n) = stack.pop() {
                for &(s, o) in &self.edges {
                    if s == n && seen.insert(o) {
                        stack.push(o);
                    }
                }
            }
            result.extend(seen.into_iter().map(|o| (start, o)));
        }
        result
    }

    /// Direct pairs: same SCC, or an edge between SCCs with no
    /// alternative path through a third SCC
    fn direct(&self, closure: &BTreeSet<(u32, u32)>) -> BTreeSet<(u32, u32)> {
        let reaches = |a: u32, b: u32| closure.contains(&(a, b));
        let same = |a: u32, b: u32| reaches(a, b) && reaches(b, a);
        let mut result = BTreeSet::new();
        for &(a, b) in closure {
            if same(a, b) {
                result.insert((a, b));
                continue;
            }
            let via_other = self
                .nodes
                .iter()
                .any(|&c| !same(c, a) && !same(c, b) && reaches(a, c) && reaches(c, b));
            if !via_other {
                result.insert((a, b));
            }
        }
        result
    }
}

fn check(graph: &mut TransitiveGraph<u32>, model: &Model, step: usize) {
    let closure = model.closure();
    let got: BTreeSet<(u32, u32)> = graph.all_pairs(true).collect();
    assert_eq!(got, closure, "closed pairs diverged at step {}", step);

    let direct = model.direct(&closure);
    let got: BTreeSet<(u32, u32)> = graph.all_pairs(false).collect();
    assert_eq!(got, direct, "direct pairs diverged at step {}", step);

    for &n in &model.nodes {
        let forward: BTreeSet<(u32, u32)> = graph.successors_of(&n, true).collect();
        let expected: BTreeSet<(u32, u32)> = closure.iter().filter(|(s, _)| *s == n).copied().collect();
        assert_eq!(forward, expected, "successors of {} at step {}", n, step);

        let backward: BTreeSet<(u32, u32)> = graph.predecessors_of(&n, false).collect();
        let expected: BTreeSet<(u32, u32)> = direct.iter().filter(|(_, o)| *o == n).copied().collect();
        assert_eq!(backward, expected, "direct predecessors of {} at step {}", n, step);
    }
}

fn run(seed: u64, config: CacheConfig, nodes: u32, steps: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = TransitiveGraph::with_config(config);
    let mut model = Model::default();

    for step in 0..steps {
        let s = rng.gen_range(0..nodes);
        let o = rng.gen_range(0..nodes);
        if rng.gen_bool(0.3) && !model.edges.is_empty() {
            // Mostly delete edges that exist
            let (s, o) = if rng.gen_bool(0.8) {
                let idx = rng.gen_range(0..model.edges.len());
                *model.edges.iter().nth(idx).unwrap()
            } else {
                (s, o)
            };
            graph.delete_edge(&s, &o);
            model.delete(s, o);
        } else {
            graph.insert_edge(&s, &o).unwrap();
            model.insert(s, o);
        }

        // Let deletions pile up between some checks
        if step % 3 == 0 {
            check(&mut graph, &model, step);
        }
    }
    check(&mut graph, &model, steps);

    let mut copy = graph.deep_copy().unwrap();
    check(&mut copy, &model, steps);
}

#[test]
fn test_random_sparse_graphs() {
    for seed in 0..20 {
        run(seed, CacheConfig::default(), 12, 60);
    }
}

#[test]
fn test_random_dense_graphs_with_cycles() {
    for seed in 100..110 {
        run(seed, CacheConfig::default(), 6, 80);
    }
}

#[test]
fn test_random_graphs_with_memoized_rows() {
    for seed in 200..210 {
        run(seed, CacheConfig::caching(), 10, 60);
    }
}

#[test]
fn test_random_graphs_with_eager_flush() {
    let config = CacheConfig {
        max_pending_deletions: Some(2),
        ..CacheConfig::default()
    };
    for seed in 300..310 {
        run(seed, config.clone(), 10, 60);
    }
}
