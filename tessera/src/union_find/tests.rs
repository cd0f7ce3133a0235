use std::collections::{HashMap as StdHashMap, HashSet, VecDeque};

use rand::prelude::*;

use super::*;

fn edges(pairs: &[(u64, u64)]) -> Vec<MergeEdge> {
    pairs
        .iter()
        .filter_map(|&(a, b)| MergeEdge::new(a, b))
        .collect()
}

/// Connected components of the edge graph by breadth-first search.
fn closure_classes(edges: &[MergeEdge]) -> StdHashMap<u64, usize> {
    let mut adjacency: StdHashMap<u64, Vec<u64>> = StdHashMap::new();
    for e in edges {
        adjacency.entry(e.low).or_default().push(e.high);
        adjacency.entry(e.high).or_default().push(e.low);
    }

    let mut class = StdHashMap::new();
    let mut nodes: Vec<u64> = adjacency.keys().copied().collect();
    nodes.sort_unstable();
    for (next, &start) in nodes.iter().enumerate() {
        if class.contains_key(&start) {
            continue;
        }
        class.insert(start, next);
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            for &n in &adjacency[&id] {
                if !class.contains_key(&n) {
                    class.insert(n, next);
                    queue.push_back(n);
                }
            }
        }
    }
    class
}

fn random_edges(rng: &mut StdRng, ids: &[u64], count: usize) -> Vec<MergeEdge> {
    (0..count)
        .filter_map(|_| {
            let a = ids[rng.random_range(0..ids.len())];
            let b = ids[rng.random_range(0..ids.len())];
            MergeEdge::new(a, b)
        })
        .collect()
}

fn sparse_ids(rng: &mut StdRng, count: usize) -> Vec<u64> {
    let mut ids: Vec<u64> = (0..count).map(|_| rng.random_range(1..u64::MAX / 2)).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[test]
fn test_unknown_id_is_its_own_root() {
    let mut uf = UnionFind::new();
    assert_eq!(uf.find(42), 42);
    assert!(!uf.contains(42));
    assert!(uf.is_empty());
}

#[test]
fn test_union_by_rank() {
    let mut uf = UnionFind::new();
    // Equal ranks: the first argument's root survives.
    uf.union(10, 20);
    assert_eq!(uf.find(20), 10);

    // 30 has rank 0, so it hangs under the rank-1 root regardless of order.
    uf.union(30, 20);
    assert_eq!(uf.find(30), 10);

    // Two rank-1 trees: the first argument's root survives.
    uf.union(40, 50);
    uf.union(50, 30);
    assert_eq!(uf.find(10), 40);
    assert_eq!(uf.find(20), 40);
    assert_eq!(uf.len(), 5);
}

#[test]
fn test_insertion_order_follows_edges() {
    let uf = UnionFind::from_edges(&edges(&[(7, 9), (3, 9), (1, 2)]));
    assert_eq!(uf.ids(), &[7, 9, 3, 1, 2]);
}

#[test]
fn test_find_matches_transitive_closure() {
    let mut rng = StdRng::seed_from_u64(0x0f1d);
    for round in 0..20 {
        let ids = sparse_ids(&mut rng, 60);
        let edge_list = random_edges(&mut rng, &ids, 10 + round * 3);
        let oracle = closure_classes(&edge_list);
        let mut uf = UnionFind::from_edges(&edge_list);

        let known: Vec<u64> = oracle.keys().copied().collect();
        for &x in &known {
            for &y in &known {
                assert_eq!(
                    uf.find(x) == uf.find(y),
                    oracle[&x] == oracle[&y],
                    "round {round}: {x} vs {y}"
                );
            }
        }
    }
}

#[test]
fn test_result_is_independent_of_union_order() {
    let mut rng = StdRng::seed_from_u64(0x0dd);
    let ids = sparse_ids(&mut rng, 200);
    let mut edge_list = random_edges(&mut rng, &ids, 150);
    let mut reference = UnionFind::from_edges(&edge_list);

    for _ in 0..5 {
        edge_list.shuffle(&mut rng);
        let mut shuffled = UnionFind::new();
        for e in &edge_list {
            // Swapping the arguments must not matter either.
            if rng.random_bool(0.5) {
                shuffled.union(e.low, e.high);
            } else {
                shuffled.union(e.high, e.low);
            }
        }

        let ids: Vec<u64> = reference.ids().to_vec();
        for (i, &x) in ids.iter().enumerate() {
            for &y in &ids[i + 1..] {
                assert_eq!(
                    reference.find(x) == reference.find(y),
                    shuffled.find(x) == shuffled.find(y)
                );
            }
        }
    }
}

#[test]
fn test_renumbering_is_a_bijection_onto_dense_range() {
    let mut rng = StdRng::seed_from_u64(0x4e);
    let ids = sparse_ids(&mut rng, 300);
    let edge_list = random_edges(&mut rng, &ids, 200);
    let mut uf = UnionFind::from_edges(&edge_list);
    let (mapping, roots) = uf.renumber();

    assert_eq!(mapping.len(), uf.len());
    let numbers: HashSet<u64> = mapping.values().copied().collect();
    assert_eq!(numbers, (1..=roots).collect::<HashSet<u64>>());

    for &x in uf.ids().to_vec().iter() {
        for &y in uf.ids().to_vec().iter() {
            assert_eq!(uf.find(x) == uf.find(y), mapping[&x] == mapping[&y]);
        }
    }
}

#[test]
fn test_renumbering_follows_first_appearance() {
    // Sets {100, 5}, {7, 8}; 100 is seen first.
    let mut uf = UnionFind::from_edges(&edges(&[(5, 100), (7, 8), (8, 100)]));
    assert_eq!(uf.ids(), &[5, 100, 7, 8]);
    let (mapping, roots) = uf.renumber();
    assert_eq!(roots, 1);
    assert!(mapping.values().all(|&v| v == 1));

    let mut uf = UnionFind::from_edges(&edges(&[(7, 8), (5, 100)]));
    let (mapping, roots) = uf.renumber();
    assert_eq!(roots, 2);
    assert_eq!(mapping[&7], 1);
    assert_eq!(mapping[&8], 1);
    assert_eq!(mapping[&5], 2);
    assert_eq!(mapping[&100], 2);
}

#[test]
fn test_renumbering_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(0x1d3);
    let ids = sparse_ids(&mut rng, 100);
    let edge_list = random_edges(&mut rng, &ids, 80);
    let mut uf = UnionFind::from_edges(&edge_list);

    let first = uf.renumber();
    let second = uf.renumber();
    assert_eq!(first, second);

    // Compact roots that are already their own insertion-order numbers stay put.
    let mut compact = UnionFind::from_edges(&edges(&[(1, 50), (2, 60), (1, 70)]));
    let (mapping, _) = compact.renumber();
    assert_eq!(mapping[&1], 1);
    assert_eq!(mapping[&2], 2);
}

#[test]
fn test_million_element_chain_resolves_to_one_root() {
    const N: u64 = 1_000_000;
    let mut uf = UnionFind::with_capacity(N as usize);
    // Each union joins a fresh singleton to the growing set from below.
    for id in (1..N).rev() {
        uf.union(id, id + 1);
    }
    let root = uf.find(N);
    assert_eq!(uf.find(1), root);
    assert_eq!(uf.find(N / 2), root);

    let (mapping, roots) = uf.renumber();
    assert_eq!(roots, 1);
    assert_eq!(mapping.len(), N as usize);
}
