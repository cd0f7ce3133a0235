//! Connected component labeling of a single block using union-find.
//!
//! Works on run-length encoded rows:
//! - each (y, z) row is split into runs of equal, non-zero class along x
//! - every run is merged with overlapping runs of the same class in the
//!   already-visited neighbor rows, which connectivity selects
//! - labels are flattened to sequential `1..=n` in raster order of first voxel
//!
//! Plain foreground labeling uses a single class (1). Contact-site labeling
//! uses one class per entity pair, so runs of different pairs never merge even
//! when they touch.

mod block;

pub use block::{
    BlockLabeler, BlockLabels, ComponentRecord, EntityPair, IdSpace, LabeledBlock,
};

use crate::config::Connectivity;
use crate::volume::Volume3;

// ============================================================================
// Run-Length Encoding
// ============================================================================

/// A run of voxels along x sharing one class.
#[derive(Debug, Clone, Copy)]
pub(super) struct Run {
    start: u32, // Starting x coordinate (inclusive)
    end: u32,   // Ending x coordinate (exclusive)
    class: u32,
    label: u32, // Provisional label
}

/// How far runs in a neighbor row may be shifted along x and still touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    /// Runs must share an x coordinate.
    Overlap,
    /// Runs may also touch diagonally (x differs by one).
    Diagonal,
}

impl Run {
    /// Search window in a neighbor row, end exclusive.
    #[inline]
    fn search_window(&self, reach: Reach) -> (u32, u32) {
        match reach {
            Reach::Overlap => (self.start, self.end),
            Reach::Diagonal => (self.start.saturating_sub(1), self.end + 1),
        }
    }
}

#[inline]
fn runs_connected(prev: &Run, curr: &Run, reach: Reach) -> bool {
    prev.class == curr.class
        && match reach {
            Reach::Overlap => prev.start < curr.end && prev.end > curr.start,
            Reach::Diagonal => prev.start < curr.end + 1 && prev.end + 1 > curr.start,
        }
}

/// Already-visited neighbor rows as `(dy, dz, reach)`.
fn neighbor_rows(connectivity: Connectivity) -> &'static [(isize, isize, Reach)] {
    use Reach::*;
    match connectivity {
        Connectivity::Six => &[(-1, 0, Overlap), (0, -1, Overlap)],
        Connectivity::Eighteen => &[
            (-1, 0, Diagonal),
            (0, -1, Diagonal),
            (-1, -1, Overlap),
            (1, -1, Overlap),
        ],
        Connectivity::TwentySix => &[
            (-1, 0, Diagonal),
            (0, -1, Diagonal),
            (-1, -1, Diagonal),
            (1, -1, Diagonal),
        ],
    }
}

/// Split a row of classes into runs. Class 0 is background.
fn extract_runs_from_row(row: &[u32], runs: &mut Vec<Run>) {
    let mut x = 0;
    while x < row.len() {
        let class = row[x];
        if class == 0 {
            x += 1;
            continue;
        }
        let start = x;
        while x < row.len() && row[x] == class {
            x += 1;
        }
        runs.push(Run {
            start: start as u32,
            end: x as u32,
            class,
            label: 0,
        });
    }
}

/// Merge `run` with connected runs of one neighbor row.
///
/// `assigned` carries the label picked from an earlier neighbor row, so a run
/// touching several rows unions all of them.
#[inline]
fn merge_run_with_row(
    run: &Run,
    neighbors: &[Run],
    reach: Reach,
    assigned: &mut Option<u32>,
    uf: &mut UnionFind,
) {
    let (search_start, search_end) = run.search_window(reach);
    let first = neighbors.partition_point(|r| r.end <= search_start);

    for prev in neighbors[first..].iter().take_while(|r| r.start < search_end) {
        if runs_connected(prev, run, reach) {
            match *assigned {
                Some(label) if label != prev.label => uf.union(label, prev.label),
                None => *assigned = Some(prev.label),
                _ => {}
            }
        }
    }
}

// ============================================================================
// Labeling
// ============================================================================

/// Labels connected regions of equal non-zero class.
///
/// Returns the label volume (0 for background, `1..=n` otherwise, numbered in
/// raster order of each component's first voxel) and `n`.
///
/// # Panics
///
/// Panics if a row is longer than `u32::MAX` voxels.
pub fn label_classes(classes: &Volume3<u32>, connectivity: Connectivity) -> (Volume3<u32>, usize) {
    let [width, height, depth] = classes.shape();
    let mut labels = Volume3::new_filled(classes.shape(), 0u32);
    if classes.is_empty() {
        return (labels, 0);
    }
    assert!(width <= u32::MAX as usize, "row too long for run encoding");

    let rows = height * depth;
    let neighbor_rows = neighbor_rows(connectivity);

    // Runs of all rows, row r occupying runs[row_start[r]..row_start[r + 1]].
    let mut runs: Vec<Run> = Vec::new();
    let mut row_start: Vec<usize> = Vec::with_capacity(rows + 1);
    let mut uf = UnionFind::new();

    for z in 0..depth {
        for y in 0..height {
            let begin = runs.len();
            row_start.push(begin);
            extract_runs_from_row(classes.row(y, z), &mut runs);

            let (done, current) = runs.split_at_mut(begin);
            for run in current.iter_mut() {
                let mut assigned = None;
                for &(dy, dz, reach) in neighbor_rows {
                    let (Some(ny), Some(nz)) =
                        (y.checked_add_signed(dy), z.checked_add_signed(dz))
                    else {
                        continue;
                    };
                    if ny >= height {
                        continue;
                    }
                    let row = ny + height * nz;
                    let neighbors = &done[row_start[row]..row_start[row + 1]];
                    merge_run_with_row(run, neighbors, reach, &mut assigned, &mut uf);
                }
                run.label = assigned.unwrap_or_else(|| uf.make_set());
            }
        }
    }
    row_start.push(runs.len());

    let label_map = uf.flatten();
    let num_labels = label_map.iter().copied().max().unwrap_or(0) as usize;

    for row in 0..rows {
        let (y, z) = (row % height, row / height);
        let base = labels.index_of([0, y, z]);
        let voxels = labels.voxels_mut();
        for run in &runs[row_start[row]..row_start[row + 1]] {
            let label = label_map[run.label as usize];
            voxels[base + run.start as usize..base + run.end as usize].fill(label);
        }
    }

    (labels, num_labels)
}

/// Labels a binary mask. Convenience over [`label_classes`] with one class.
pub fn label_mask(mask: &Volume3<bool>, connectivity: Connectivity) -> (Volume3<u32>, usize) {
    let classes = Volume3::new(
        mask.shape(),
        mask.voxels().iter().map(|&fg| u32::from(fg)).collect(),
    );
    label_classes(&classes, connectivity)
}

/// Renumbers the labels present in `labels` to `1..=n` in order of first
/// appearance. Returns `n`.
pub(crate) fn resequence(labels: &mut [u32], max_label: usize) -> usize {
    let mut map = vec![0u32; max_label + 1];
    let mut next = 0u32;
    for label in labels.iter_mut().filter(|l| **l != 0) {
        let slot = &mut map[*label as usize];
        if *slot == 0 {
            next += 1;
            *slot = next;
        }
        *label = *slot;
    }
    next as usize
}

// ============================================================================
// Union-Find (sequential, block-local)
// ============================================================================

/// Union-find over dense labels `1..`, used while labeling one block.
#[derive(Debug)]
struct UnionFind {
    parent: Vec<u32>,
    next_label: u32,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parent: Vec::with_capacity(256),
            next_label: 1,
        }
    }

    #[inline]
    fn make_set(&mut self) -> u32 {
        let label = self.next_label;
        self.parent.push(label);
        self.next_label += 1;
        label
    }

    /// Find root with iterative path compression (two-pass).
    #[inline]
    fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        loop {
            let parent = self.parent[(root - 1) as usize];
            if parent == root {
                break;
            }
            root = parent;
        }

        let mut current = label;
        while current != root {
            let idx = (current - 1) as usize;
            let parent = self.parent[idx];
            self.parent[idx] = root;
            current = parent;
        }

        root
    }

    /// Attaches the larger root under the smaller, so a root is always the
    /// first-created label of its set.
    #[inline]
    fn union(&mut self, a: u32, b: u32) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (smaller, larger) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[(larger - 1) as usize] = smaller;
        }
    }

    /// Mapping from provisional label to sequential final label; index 0 is
    /// background.
    fn flatten(&mut self) -> Vec<u32> {
        let len = self.parent.len();
        let mut label_map = vec![0u32; len + 1];
        let mut num_labels = 0u32;

        for i in 1..=len as u32 {
            let root = self.find(i);
            if label_map[root as usize] == 0 {
                num_labels += 1;
                label_map[root as usize] = num_labels;
            }
            label_map[i as usize] = label_map[root as usize];
        }

        label_map
    }
}
