//! Labeling of one block into globally unique provisional IDs.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::{Config, Connectivity, ContactConfig, Foreground, MaskConfig};
use crate::error::{ConfigError, StoreError};
use crate::grid::{BlockDescriptor, BlockGrid, Region};
use crate::volume::{Volume3, VolumeReader};

use super::{label_classes, resequence};

// ============================================================================
// Provisional ID space
// ============================================================================

/// Maps block-local labels to provisional IDs, `grid_index * stride + local`.
///
/// The stride is the voxel count of a full block, an upper bound on the
/// components a block can hold. Local labels are `1..=stride`, so IDs of
/// different blocks never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdSpace {
    stride: u64,
}

impl IdSpace {
    /// Fails if the largest provisional ID of the grid does not fit in `u64`.
    pub fn new(grid: &BlockGrid) -> Result<Self, ConfigError> {
        let stride = grid.block_voxels() as u64;
        let block_count = grid.block_count() as u64;
        match block_count.checked_mul(stride) {
            Some(_) => Ok(Self { stride }),
            None => Err(ConfigError::IdSpaceExhausted {
                block_count,
                stride,
            }),
        }
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    #[inline]
    pub fn provisional_id(&self, block: &BlockDescriptor, local: u32) -> u64 {
        debug_assert!(local >= 1 && u64::from(local) <= self.stride);
        block.grid_index * self.stride + u64::from(local)
    }

    /// Grid index of the block that produced `id`.
    #[inline]
    pub fn block_of(&self, id: u64) -> u64 {
        (id - 1) / self.stride
    }
}

// ============================================================================
// Results
// ============================================================================

/// One upstream entity pair a contact site lies between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityPair {
    pub first: u64,
    pub second: u64,
}

impl EntityPair {
    pub fn new(first: u64, second: u64) -> Self {
        Self { first, second }
    }

    /// Pair with `(a, b)` and `(b, a)` collapsed to `(min, max)`.
    pub fn unordered(a: u64, b: u64) -> Self {
        Self::new(a.min(b), a.max(b))
    }
}

/// Voxel count and coordinate sum of one provisional ID within its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentRecord {
    pub id: u64,
    pub voxels: u64,
    /// Sum of global voxel coordinates, zero unless centroids are enabled.
    pub position_sum: [u64; 3],
}

/// Per-block statistics handed to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLabels {
    pub block: BlockDescriptor,
    /// Ordered by local label.
    pub components: Vec<ComponentRecord>,
    /// Entity pair of every provisional ID. Empty for plain labeling.
    pub pairs: Vec<(u64, EntityPair)>,
}

#[derive(Debug)]
pub struct LabeledBlock {
    /// Provisional IDs over the block extent.
    pub labels: Volume3<u64>,
    pub summary: BlockLabels,
}

// ============================================================================
// Labeler
// ============================================================================

/// Labels blocks of the input dataset, as configured.
#[derive(Debug, Clone)]
pub struct BlockLabeler {
    input: String,
    foreground: Foreground,
    mask: Option<MaskConfig>,
    contacts: Option<ContactConfig>,
    connectivity: Connectivity,
    halo: [usize; 3],
    compute_centroids: bool,
    shape: [usize; 3],
    id_space: IdSpace,
}

impl BlockLabeler {
    pub fn new(config: &Config, grid: &BlockGrid) -> Result<Self, ConfigError> {
        let block_size = grid.block_size();
        let widest: u64 = (0..3)
            .map(|axis| (block_size[axis] + 2 * config.halo[axis]).min(grid.shape()[axis]) as u64)
            .product();
        if widest > u64::from(u32::MAX) {
            return Err(ConfigError::InvalidBlockSize(block_size));
        }

        Ok(Self {
            input: config.input.clone(),
            foreground: config.foreground,
            mask: config.mask.clone(),
            contacts: config.contacts.clone(),
            connectivity: config.connectivity,
            halo: config.halo,
            compute_centroids: config.compute_centroids,
            shape: grid.shape(),
            id_space: IdSpace::new(grid)?,
        })
    }

    pub fn id_space(&self) -> IdSpace {
        self.id_space
    }

    /// Labels `block`, reading a halo around it if configured.
    ///
    /// Components are found over the widened region, so voxels joined only
    /// through the halo share a label, but only voxels inside the block are
    /// labeled and counted.
    pub fn label_block<R: VolumeReader + ?Sized>(
        &self,
        store: &R,
        block: &BlockDescriptor,
    ) -> Result<LabeledBlock, StoreError> {
        let region = block.region().expanded(self.halo, self.shape);
        let (classes, pair_table) = self.classify(store, region)?;

        let (labels, num_labels) = label_classes(&classes, self.connectivity);
        let interior = Region::new(
            [
                block.offset[0] - region.offset[0],
                block.offset[1] - region.offset[1],
                block.offset[2] - region.offset[2],
            ],
            block.extent,
        );

        let (mut labels, interior_classes) = if interior == Region::new([0; 3], region.extent) {
            (labels, classes)
        } else {
            (labels.crop(interior), classes.crop(interior))
        };
        let num_labels = resequence(labels.voxels_mut(), num_labels);

        Ok(self.finish(block, &labels, &interior_classes, num_labels, &pair_table))
    }

    /// Class of every voxel of `region`: 0 for background, otherwise 1 for
    /// plain foreground or `1 + index` into the returned pair table.
    fn classify<R: VolumeReader + ?Sized>(
        &self,
        store: &R,
        region: Region,
    ) -> Result<(Volume3<u32>, Vec<EntityPair>), StoreError> {
        let input = store.read_region(&self.input, region)?;
        let mask = match &self.mask {
            Some(mask) => Some(MaskWindow::read(store, mask, region)?),
            None => None,
        };
        let in_mask = |index: usize| {
            mask.as_ref()
                .is_none_or(|m| m.contains(input.position_of(index)))
        };

        let Some(contacts) = &self.contacts else {
            let classes = input
                .voxels()
                .iter()
                .enumerate()
                .map(|(i, &v)| u32::from(self.foreground.test(v) && in_mask(i)))
                .collect();
            return Ok((Volume3::new(region.extent, classes), Vec::new()));
        };

        let partner = store.read_region(&contacts.partner, region)?;
        let mut pair_index: HashMap<EntityPair, u32> = HashMap::new();
        let mut pair_table = Vec::new();
        let mut classes = Vec::with_capacity(input.len());
        for (i, (&a, &b)) in input.voxels().iter().zip(partner.voxels()).enumerate() {
            if a == 0 || b == 0 || !in_mask(i) {
                classes.push(0);
                continue;
            }
            let pair = if contacts.same_class {
                EntityPair::unordered(a, b)
            } else {
                EntityPair::new(a, b)
            };
            let class = *pair_index.entry(pair).or_insert_with(|| {
                pair_table.push(pair);
                pair_table.len() as u32
            });
            classes.push(class);
        }
        Ok((Volume3::new(region.extent, classes), pair_table))
    }

    fn finish(
        &self,
        block: &BlockDescriptor,
        labels: &Volume3<u32>,
        classes: &Volume3<u32>,
        num_labels: usize,
        pair_table: &[EntityPair],
    ) -> LabeledBlock {
        let mut components: Vec<ComponentRecord> = (1..=num_labels as u32)
            .map(|local| ComponentRecord {
                id: self.id_space.provisional_id(block, local),
                voxels: 0,
                position_sum: [0; 3],
            })
            .collect();
        let mut component_class = vec![0u32; num_labels];

        let mut ids = Vec::with_capacity(labels.len());
        for (i, &local) in labels.voxels().iter().enumerate() {
            if local == 0 {
                ids.push(0);
                continue;
            }
            let slot = (local - 1) as usize;
            let record = &mut components[slot];
            record.voxels += 1;
            if self.compute_centroids {
                let p = labels.position_of(i);
                for axis in 0..3 {
                    record.position_sum[axis] += (block.offset[axis] + p[axis]) as u64;
                }
            }
            component_class[slot] = classes[i];
            ids.push(record.id);
        }

        let pairs = if pair_table.is_empty() {
            Vec::new()
        } else {
            components
                .iter()
                .zip(&component_class)
                .map(|(record, &class)| (record.id, pair_table[(class - 1) as usize]))
                .collect()
        };

        LabeledBlock {
            labels: Volume3::new(block.extent, ids),
            summary: BlockLabels {
                block: *block,
                components,
                pairs,
            },
        }
    }
}

// ============================================================================
// Mask
// ============================================================================

/// The part of a (possibly downsampled) mask covering one region.
struct MaskWindow {
    voxels: Volume3<u64>,
    skew: [usize; 3],
    downsampling: [usize; 3],
}

impl MaskWindow {
    fn read<R: VolumeReader + ?Sized>(
        store: &R,
        mask: &MaskConfig,
        region: Region,
    ) -> Result<Self, StoreError> {
        let f = mask.downsampling;
        let end = region.end();
        let offset = [region.offset[0] / f[0], region.offset[1] / f[1], region.offset[2] / f[2]];
        let extent = [
            (end[0] - 1) / f[0] + 1 - offset[0],
            (end[1] - 1) / f[1] + 1 - offset[1],
            (end[2] - 1) / f[2] + 1 - offset[2],
        ];
        let voxels = store.read_region(&mask.dataset, Region::new(offset, extent))?;

        // Distance from the first mask cell's origin to the region origin.
        let skew = [
            region.offset[0] - offset[0] * f[0],
            region.offset[1] - offset[1] * f[1],
            region.offset[2] - offset[2] * f[2],
        ];
        Ok(Self {
            voxels,
            skew,
            downsampling: f,
        })
    }

    /// `local` is a position inside the region the window was read for.
    #[inline]
    fn contains(&self, local: [usize; 3]) -> bool {
        let f = self.downsampling;
        let p = [
            (local[0] + self.skew[0]) / f[0],
            (local[1] + self.skew[1]) / f[1],
            (local[2] + self.skew[2]) / f[2],
        ];
        self.voxels[p] != 0
    }
}
