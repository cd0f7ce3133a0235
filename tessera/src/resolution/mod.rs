//! Final component identities and per-component statistics.
//!
//! Turns the union-find forest plus every block's component records into a
//! dense `provisional ID -> final ID` mapping:
//! 1. union-find roots are numbered `1..=m` in insertion order
//! 2. provisional IDs that touched no block face follow as `m + 1..`, in grid
//!    order and then local label order
//!
//! Volumes (and optional coordinate sums) are summed per final ID, and the
//! minimum-volume filter is applied when labels are looked up.


use hashbrown::HashMap;
use serde::Serialize;

use crate::labeling::BlockLabels;
use crate::union_find::UnionFind;

/// Aggregate of one merged component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComponentStats {
    pub id: u64,
    /// Voxel count over all blocks.
    pub volume: u64,
    /// Sum of global voxel coordinates. Zero unless centroids were computed.
    pub position_sum: [u64; 3],
}

impl ComponentStats {
    pub fn centroid(&self) -> Option<[f64; 3]> {
        if self.volume == 0 {
            return None;
        }
        let volume = self.volume as f64;
        Some(self.position_sum.map(|sum| sum as f64 / volume))
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    mapping: HashMap<u64, u64>,
    /// Indexed by `final ID - 1`.
    components: Vec<ComponentStats>,
    min_volume: u64,
    root_count: u64,
}

impl Resolution {
    /// Resolves every provisional ID reported in `blocks`.
    ///
    /// `blocks` may come in any order; they are visited by grid index.
    pub fn resolve(mut union_find: UnionFind, blocks: &[BlockLabels], min_volume: u64) -> Self {
        let (mut mapping, root_count) = union_find.renumber();

        let mut order: Vec<&BlockLabels> = blocks.iter().collect();
        order.sort_by_key(|labels| labels.block.grid_index);

        let mut next = root_count;
        for labels in &order {
            for record in &labels.components {
                mapping.entry(record.id).or_insert_with(|| {
                    next += 1;
                    next
                });
            }
        }

        let mut components: Vec<ComponentStats> = (1..=next)
            .map(|id| ComponentStats {
                id,
                volume: 0,
                position_sum: [0; 3],
            })
            .collect();
        for labels in &order {
            for record in &labels.components {
                let stats = &mut components[(mapping[&record.id] - 1) as usize];
                stats.volume += record.voxels;
                for axis in 0..3 {
                    stats.position_sum[axis] += record.position_sum[axis];
                }
            }
        }

        let resolution = Self {
            mapping,
            components,
            min_volume,
            root_count,
        };
        tracing::debug!(
            roots = root_count,
            components = resolution.component_count(),
            kept = resolution.kept_count(),
            "Resolved provisional IDs"
        );
        resolution
    }

    /// Final ID of a provisional ID, before filtering.
    pub fn final_id(&self, provisional: u64) -> Option<u64> {
        self.mapping.get(&provisional).copied()
    }

    /// Value written for a voxel holding `provisional`.
    ///
    /// Background stays 0. Components below the minimum volume become 0. An ID
    /// this resolution never saw has volume 0, so it is dropped unless the
    /// minimum volume is 0, in which case it is written unchanged.
    #[inline]
    pub fn output_label(&self, provisional: u64) -> u64 {
        if provisional == 0 {
            return 0;
        }
        match self.mapping.get(&provisional) {
            Some(&id) if self.is_kept(id) => id,
            Some(_) => 0,
            None if self.min_volume == 0 => provisional,
            None => 0,
        }
    }

    fn is_kept(&self, id: u64) -> bool {
        self.components[(id - 1) as usize].volume >= self.min_volume
    }

    pub fn mapping(&self) -> &HashMap<u64, u64> {
        &self.mapping
    }

    /// All components, ordered by final ID.
    pub fn components(&self) -> &[ComponentStats] {
        &self.components
    }

    pub fn component(&self, id: u64) -> Option<&ComponentStats> {
        id.checked_sub(1)
            .and_then(|index| self.components.get(index as usize))
    }

    /// Components that survive the minimum-volume filter.
    pub fn kept_components(&self) -> impl Iterator<Item = &ComponentStats> + '_ {
        self.components
            .iter()
            .filter(move |stats| stats.volume >= self.min_volume)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn kept_count(&self) -> usize {
        self.kept_components().count()
    }

    /// Components that crossed at least one block face.
    pub fn root_count(&self) -> u64 {
        self.root_count
    }

    pub fn min_volume(&self) -> u64 {
        self.min_volume
    }
}
