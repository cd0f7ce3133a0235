//! Deterministic tiling of a volume into blocks.
//!
//! Blocks are enumerated in row-major grid order with x varying fastest. The
//! resulting `grid_index` doubles as the namespace key for provisional IDs, so
//! this order must never change between stages of a run.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// An axis-aligned box inside a volume: `offset .. offset + extent` on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub offset: [usize; 3],
    pub extent: [usize; 3],
}

impl Region {
    pub const fn new(offset: [usize; 3], extent: [usize; 3]) -> Self {
        Self { offset, extent }
    }

    /// Exclusive upper corner.
    #[inline]
    pub fn end(&self) -> [usize; 3] {
        [
            self.offset[0] + self.extent[0],
            self.offset[1] + self.extent[1],
            self.offset[2] + self.extent[2],
        ]
    }

    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.extent[0] * self.extent[1] * self.extent[2]
    }

    pub fn is_empty(&self) -> bool {
        self.voxel_count() == 0
    }

    /// Whether the region lies entirely inside a volume of `shape`.
    pub fn fits_in(&self, shape: [usize; 3]) -> bool {
        let end = self.end();
        (0..3).all(|axis| end[axis] <= shape[axis])
    }

    pub fn contains(&self, position: [usize; 3]) -> bool {
        let end = self.end();
        (0..3).all(|axis| position[axis] >= self.offset[axis] && position[axis] < end[axis])
    }

    /// Grows the region by `halo` on every side, clipped to `shape`.
    pub fn expanded(&self, halo: [usize; 3], shape: [usize; 3]) -> Region {
        let end = self.end();
        let mut offset = [0; 3];
        let mut extent = [0; 3];
        for axis in 0..3 {
            offset[axis] = self.offset[axis].saturating_sub(halo[axis]);
            let clipped_end = (end[axis] + halo[axis]).min(shape[axis]);
            extent[axis] = clipped_end - offset[axis];
        }
        Region { offset, extent }
    }

    /// The single-voxel-thick slab at `position` along `axis`, spanning this
    /// region on the other two axes.
    pub fn plane(&self, axis: usize, position: usize) -> Region {
        let mut offset = self.offset;
        let mut extent = self.extent;
        offset[axis] = position;
        extent[axis] = 1;
        Region { offset, extent }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "offset {:?} extent {:?}", self.offset, self.extent)
    }
}

/// One unit of parallel work. Immutable once the grid is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockDescriptor {
    pub offset: [usize; 3],
    /// Clipped to the volume bound for blocks on the upper faces.
    pub extent: [usize; 3],
    pub grid_position: [usize; 3],
    pub grid_index: u64,
}

impl BlockDescriptor {
    #[inline]
    pub fn region(&self) -> Region {
        Region::new(self.offset, self.extent)
    }

    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.region().voxel_count()
    }
}

impl std::fmt::Display for BlockDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "block #{} (offset {:?}, extent {:?})",
            self.grid_index, self.offset, self.extent
        )
    }
}

/// The block tiling of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    shape: [usize; 3],
    block_size: [usize; 3],
    dims: [usize; 3],
}

impl BlockGrid {
    pub fn new(shape: [usize; 3], block_size: [usize; 3]) -> Result<Self, ConfigError> {
        if shape.contains(&0) {
            return Err(ConfigError::InvalidShape(shape));
        }
        if block_size.contains(&0) {
            return Err(ConfigError::InvalidBlockSize(block_size));
        }
        let dims = [
            shape[0].div_ceil(block_size[0]),
            shape[1].div_ceil(block_size[1]),
            shape[2].div_ceil(block_size[2]),
        ];
        Ok(Self {
            shape,
            block_size,
            dims,
        })
    }

    #[inline]
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    #[inline]
    pub fn block_size(&self) -> [usize; 3] {
        self.block_size
    }

    /// Number of blocks along each axis.
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// Voxels in a full (unclipped) block.
    #[inline]
    pub fn block_voxels(&self) -> usize {
        self.block_size[0] * self.block_size[1] * self.block_size[2]
    }

    #[inline]
    pub fn grid_index(&self, grid_position: [usize; 3]) -> u64 {
        (grid_position[0] + self.dims[0] * (grid_position[1] + self.dims[1] * grid_position[2]))
            as u64
    }

    /// The block at `grid_position`, or `None` outside the grid.
    pub fn block_at(&self, grid_position: [usize; 3]) -> Option<BlockDescriptor> {
        if (0..3).any(|axis| grid_position[axis] >= self.dims[axis]) {
            return None;
        }

        let mut offset = [0; 3];
        let mut extent = [0; 3];
        for axis in 0..3 {
            offset[axis] = grid_position[axis] * self.block_size[axis];
            extent[axis] = self.block_size[axis].min(self.shape[axis] - offset[axis]);
        }

        Some(BlockDescriptor {
            offset,
            extent,
            grid_position,
            grid_index: self.grid_index(grid_position),
        })
    }

    /// The block with the given grid index.
    pub fn block(&self, grid_index: u64) -> Option<BlockDescriptor> {
        let index = usize::try_from(grid_index).ok()?;
        if index >= self.block_count() {
            return None;
        }
        let x = index % self.dims[0];
        let y = (index / self.dims[0]) % self.dims[1];
        let z = index / (self.dims[0] * self.dims[1]);
        self.block_at([x, y, z])
    }

    /// The adjacent block in the positive direction of `axis`. No wraparound.
    pub fn next_along(&self, block: &BlockDescriptor, axis: usize) -> Option<BlockDescriptor> {
        let mut position = block.grid_position;
        position[axis] += 1;
        self.block_at(position)
    }

    /// Every block, in grid-index order.
    pub fn blocks(&self) -> Vec<BlockDescriptor> {
        let mut blocks = Vec::with_capacity(self.block_count());
        for z in 0..self.dims[2] {
            for y in 0..self.dims[1] {
                for x in 0..self.dims[0] {
                    if let Some(block) = self.block_at([x, y, z]) {
                        blocks.push(block);
                    }
                }
            }
        }
        blocks
    }
}
