//! Union-find over sparse 64-bit provisional IDs.
//!
//! Only IDs that appear in at least one merge edge are inserted. Every other
//! ID is implicitly its own root. Nodes live in dense vectors indexed through
//! a hash map, in order of first insertion, which makes renumbering
//! reproducible for a given edge order.

#[cfg(test)]
mod tests;

use hashbrown::HashMap;

use crate::boundary::MergeEdge;

#[derive(Debug, Default, Clone)]
pub struct UnionFind {
    index: HashMap<u64, usize>,
    /// ID of each node, in insertion order.
    ids: Vec<u64>,
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
            parent: Vec::with_capacity(capacity),
            rank: Vec::with_capacity(capacity),
        }
    }

    /// Builds the forest from an edge list, inserting IDs in edge order.
    pub fn from_edges(edges: &[MergeEdge]) -> Self {
        let mut uf = Self::with_capacity(edges.len());
        for edge in edges {
            uf.union(edge.low, edge.high);
        }
        uf
    }

    /// Number of known IDs.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.index.contains_key(&id)
    }

    /// Known IDs in insertion order.
    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    fn node(&mut self, id: u64) -> usize {
        if let Some(&node) = self.index.get(&id) {
            return node;
        }
        let node = self.ids.len();
        self.index.insert(id, node);
        self.ids.push(id);
        self.parent.push(node);
        self.rank.push(0);
        node
    }

    /// Root node with full path compression. Iterative, so deep chains
    /// cannot exhaust the stack.
    fn find_node(&mut self, node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut current = node;
        while current != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Root ID of `id`. IDs never inserted are their own root.
    pub fn find(&mut self, id: u64) -> u64 {
        match self.index.get(&id) {
            Some(&node) => {
                let root = self.find_node(node);
                self.ids[root]
            }
            None => id,
        }
    }

    /// Merges the sets of `a` and `b`, inserting either if unknown.
    ///
    /// Union by rank; on equal ranks the root of `a` survives and its rank
    /// grows.
    pub fn union(&mut self, a: u64, b: u64) {
        let node_a = self.node(a);
        let node_b = self.node(b);
        let root_a = self.find_node(node_a);
        let root_b = self.find_node(node_b);
        if root_a == root_b {
            return;
        }

        let (rank_a, rank_b) = (self.rank[root_a], self.rank[root_b]);
        if rank_a < rank_b {
            self.parent[root_a] = root_b;
        } else {
            self.parent[root_b] = root_a;
            if rank_a == rank_b {
                self.rank[root_a] = rank_a.saturating_add(1);
            }
        }
    }

    /// Dense root numbering: walks known IDs in insertion order and gives each
    /// new root the next integer from 1. Returns `ID -> compact root` for every
    /// known ID, and the number of roots.
    pub fn renumber(&mut self) -> (HashMap<u64, u64>, u64) {
        let mut root_number = vec![0u64; self.ids.len()];
        let mut next = 0u64;
        let mut mapping = HashMap::with_capacity(self.ids.len());

        for node in 0..self.ids.len() {
            let root = self.find_node(node);
            if root_number[root] == 0 {
                next += 1;
                root_number[root] = next;
            }
            mapping.insert(self.ids[node], root_number[root]);
        }

        (mapping, next)
    }
}
