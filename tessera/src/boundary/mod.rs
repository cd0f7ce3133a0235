//! Must-merge pairs across block faces.
//!
//! For every block and each positive axis, the last plane of the block is
//! compared voxel by voxel with the first plane of the next block along that
//! axis. Each face is therefore visited by exactly one block.
//!
//! With face connectivity the two planes are walked in lock-step. With edge or
//! corner connectivity a voxel also faces the diagonal neighbors of its
//! opposite voxel, so the far plane is read with a one-voxel rim (clipped to
//! the volume). The rim reaches into blocks that only share an edge or a
//! corner with this one, which covers every cross-block adjacency.


use hashbrown::HashMap;

use crate::config::Connectivity;
use crate::error::StoreError;
use crate::grid::{BlockDescriptor, BlockGrid};
use crate::labeling::EntityPair;
use crate::volume::VolumeReader;

/// Two provisional IDs that denote the same object. Always `low < high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MergeEdge {
    pub low: u64,
    pub high: u64,
}

impl MergeEdge {
    /// `None` for a self-pair.
    pub fn new(a: u64, b: u64) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

// ============================================================================
// Edge equivalence
// ============================================================================

/// Decides whether two non-background IDs facing each other across a block
/// boundary must merge.
pub trait EdgeEquivalence: Sync {
    fn equivalent(&self, a: u64, b: u64) -> bool;
}

/// Plain connected components: any two touching foreground IDs merge.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyForeground;

impl EdgeEquivalence for AnyForeground {
    #[inline]
    fn equivalent(&self, _a: u64, _b: u64) -> bool {
        true
    }
}

/// Contact sites: IDs merge only when they lie between the same entity pair.
#[derive(Debug, Clone, Default)]
pub struct SameEntityPair {
    pairs: HashMap<u64, EntityPair>,
}

impl SameEntityPair {
    pub fn new(pairs: HashMap<u64, EntityPair>) -> Self {
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(u64, EntityPair)> for SameEntityPair {
    fn from_iter<I: IntoIterator<Item = (u64, EntityPair)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl EdgeEquivalence for SameEntityPair {
    fn equivalent(&self, a: u64, b: u64) -> bool {
        match (self.pairs.get(&a), self.pairs.get(&b)) {
            (Some(pa), Some(pb)) => pa == pb,
            _ => false,
        }
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// In-plane offsets `(du, dv)` at which a voxel touches the opposite plane.
fn plane_offsets(connectivity: Connectivity) -> &'static [(isize, isize)] {
    match connectivity {
        Connectivity::Six => &[(0, 0)],
        Connectivity::Eighteen => &[(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)],
        Connectivity::TwentySix => &[
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (0, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ],
    }
}

/// Sorted, deduplicated merge edges across the positive faces of `block`.
///
/// Reads `labels`, the dataset of provisional IDs.
pub fn extract_block_edges<R, P>(
    store: &R,
    labels: &str,
    grid: &BlockGrid,
    block: &BlockDescriptor,
    connectivity: Connectivity,
    predicate: &P,
) -> Result<Vec<MergeEdge>, StoreError>
where
    R: VolumeReader + ?Sized,
    P: EdgeEquivalence + ?Sized,
{
    let region = block.region();
    let offsets = plane_offsets(connectivity);
    let rim = usize::from(connectivity != Connectivity::Six);
    let mut edges = Vec::new();

    for axis in 0..3 {
        let Some(next) = grid.next_along(block, axis) else {
            continue;
        };
        // The two in-plane axes.
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);

        let plane1_region = region.plane(axis, region.end()[axis] - 1);
        let mut halo = [rim; 3];
        halo[axis] = 0;
        let plane2_region = region
            .plane(axis, next.offset[axis])
            .expanded(halo, grid.shape());
        let plane1 = store.read_region(labels, plane1_region)?;
        let plane2 = store.read_region(labels, plane2_region)?;

        for (index, &a) in plane1.voxels().iter().enumerate() {
            if a == 0 {
                continue;
            }
            let local = plane1.position_of(index);
            // Position in plane2's frame; the axis coordinate is 0 in both.
            let mut base = [0usize; 3];
            base[u] = plane1_region.offset[u] + local[u] - plane2_region.offset[u];
            base[v] = plane1_region.offset[v] + local[v] - plane2_region.offset[v];

            for &(du, dv) in offsets {
                let (Some(pu), Some(pv)) =
                    (base[u].checked_add_signed(du), base[v].checked_add_signed(dv))
                else {
                    continue;
                };
                if pu >= plane2_region.extent[u] || pv >= plane2_region.extent[v] {
                    continue;
                }
                let mut p = [0usize; 3];
                p[u] = pu;
                p[v] = pv;
                let b = plane2[p];
                if b == 0 || !predicate.equivalent(a, b) {
                    continue;
                }
                if let Some(edge) = MergeEdge::new(a, b) {
                    edges.push(edge);
                }
            }
        }
    }

    edges.sort_unstable();
    edges.dedup();
    tracing::trace!(block = block.grid_index, edges = edges.len(), "Extracted block edges");
    Ok(edges)
}

/// Concatenates per-block edge sets (in grid order) into one sorted,
/// deduplicated set.
pub fn merge_edge_sets(per_block: Vec<Vec<MergeEdge>>) -> Vec<MergeEdge> {
    let mut edges: Vec<MergeEdge> = per_block.into_iter().flatten().collect();
    edges.sort_unstable();
    edges.dedup();
    edges
}
