//! Dense 3-D voxel buffers and the chunked-volume store interface.

mod memory;
mod store;

use std::ops::{Index, IndexMut};

pub use memory::MemoryStore;
pub use store::{Compression, DataType, DatasetAttributes, VolumeReader, VolumeWriter};

use crate::grid::Region;

/// An owned dense 3-D buffer in x-fastest order: `index = x + sx * (y + sy * z)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume3<T> {
    voxels: Vec<T>,
    shape: [usize; 3],
}

impl<T> Volume3<T> {
    pub fn new(shape: [usize; 3], voxels: Vec<T>) -> Self {
        assert_eq!(
            voxels.len(),
            shape[0] * shape[1] * shape[2],
            "voxel count must equal the product of the shape"
        );
        Self { voxels, shape }
    }

    #[inline]
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    #[inline]
    pub fn index_of(&self, [x, y, z]: [usize; 3]) -> usize {
        debug_assert!(x < self.shape[0] && y < self.shape[1] && z < self.shape[2]);
        x + self.shape[0] * (y + self.shape[1] * z)
    }

    /// Inverse of [`Self::index_of`].
    #[inline]
    pub fn position_of(&self, index: usize) -> [usize; 3] {
        let x = index % self.shape[0];
        let y = (index / self.shape[0]) % self.shape[1];
        let z = index / (self.shape[0] * self.shape[1]);
        [x, y, z]
    }

    #[inline]
    pub fn get(&self, position: [usize; 3]) -> &T {
        &self.voxels[self.index_of(position)]
    }

    #[inline]
    pub fn get_mut(&mut self, position: [usize; 3]) -> &mut T {
        let index = self.index_of(position);
        &mut self.voxels[index]
    }

    #[inline]
    pub fn voxels(&self) -> &[T] {
        &self.voxels
    }

    #[inline]
    pub fn voxels_mut(&mut self) -> &mut [T] {
        &mut self.voxels
    }

    /// One x-row, `shape[0]` voxels long.
    #[inline]
    pub fn row(&self, y: usize, z: usize) -> &[T] {
        let start = self.index_of([0, y, z]);
        &self.voxels[start..start + self.shape[0]]
    }

    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.voxels
    }
}

impl<T: Clone> Volume3<T> {
    pub fn new_filled(shape: [usize; 3], value: T) -> Self {
        Self {
            voxels: vec![value; shape[0] * shape[1] * shape[2]],
            shape,
        }
    }

    #[inline]
    pub fn fill(&mut self, value: T) {
        self.voxels.fill(value);
    }
}

impl<T: Copy> Volume3<T> {
    /// Copies `region` (in this buffer's coordinates) into a new buffer.
    pub fn crop(&self, region: Region) -> Volume3<T> {
        assert!(region.fits_in(self.shape), "crop region {region} exceeds {:?}", self.shape);
        let mut voxels = Vec::with_capacity(region.voxel_count());
        let end = region.end();
        for z in region.offset[2]..end[2] {
            for y in region.offset[1]..end[1] {
                let row = self.row(y, z);
                voxels.extend_from_slice(&row[region.offset[0]..end[0]]);
            }
        }
        Volume3::new(region.extent, voxels)
    }

    /// Writes all of `source` into this buffer with its origin at `offset`.
    pub fn copy_region_from(&mut self, offset: [usize; 3], source: &Volume3<T>) {
        let region = Region::new(offset, source.shape);
        assert!(region.fits_in(self.shape), "target region {region} exceeds {:?}", self.shape);
        let width = source.shape[0];
        for z in 0..source.shape[2] {
            for y in 0..source.shape[1] {
                let dst = self.index_of([offset[0], offset[1] + y, offset[2] + z]);
                self.voxels[dst..dst + width].copy_from_slice(source.row(y, z));
            }
        }
    }
}

impl<T: Default + Clone> Volume3<T> {
    pub fn new_default(shape: [usize; 3]) -> Self {
        Self::new_filled(shape, T::default())
    }
}

impl<T> Index<[usize; 3]> for Volume3<T> {
    type Output = T;

    #[inline]
    fn index(&self, position: [usize; 3]) -> &Self::Output {
        self.get(position)
    }
}

impl<T> IndexMut<[usize; 3]> for Volume3<T> {
    #[inline]
    fn index_mut(&mut self, position: [usize; 3]) -> &mut Self::Output {
        self.get_mut(position)
    }
}

impl<T> Index<usize> for Volume3<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.voxels[index]
    }
}

impl<T> IndexMut<usize> for Volume3<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.voxels[index]
    }
}
