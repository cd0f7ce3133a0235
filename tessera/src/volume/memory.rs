use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::grid::{BlockDescriptor, Region};
use crate::volume::{DatasetAttributes, Volume3, VolumeReader, VolumeWriter};

#[derive(Debug)]
struct Dataset {
    attributes: DatasetAttributes,
    voxels: RwLock<Volume3<u64>>,
}

/// Thread-safe in-memory store. Each dataset is one dense buffer behind its
/// own lock, so blocks of different datasets never contend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    datasets: RwLock<HashMap<String, Arc<Dataset>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a dataset with the given content.
    pub fn insert(&self, name: &str, attributes: DatasetAttributes, voxels: Volume3<u64>) {
        assert_eq!(
            attributes.shape,
            voxels.shape(),
            "dataset shape must match the voxel buffer"
        );
        let dataset = Arc::new(Dataset {
            attributes,
            voxels: RwLock::new(voxels),
        });
        self.datasets.write().insert(name.to_string(), dataset);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.read().contains_key(name)
    }

    /// A copy of the full dataset.
    pub fn volume(&self, name: &str) -> Option<Volume3<u64>> {
        let dataset = self.datasets.read().get(name).cloned()?;
        let voxels = dataset.voxels.read().clone();
        Some(voxels)
    }

    pub fn remove(&self, name: &str) -> bool {
        self.datasets.write().remove(name).is_some()
    }

    fn dataset(&self, name: &str) -> Result<Arc<Dataset>, StoreError> {
        self.datasets
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::DatasetNotFound(name.to_string()))
    }
}

impl VolumeReader for MemoryStore {
    fn attributes(&self, dataset: &str) -> Result<DatasetAttributes, StoreError> {
        Ok(self.dataset(dataset)?.attributes)
    }

    fn read_region(&self, dataset: &str, region: Region) -> Result<Volume3<u64>, StoreError> {
        let entry = self.dataset(dataset)?;
        if !region.fits_in(entry.attributes.shape) {
            return Err(StoreError::OutOfBounds {
                dataset: dataset.to_string(),
                region,
                shape: entry.attributes.shape,
            });
        }
        Ok(entry.voxels.read().crop(region))
    }
}

impl VolumeWriter for MemoryStore {
    fn create_dataset(
        &self,
        dataset: &str,
        attributes: &DatasetAttributes,
    ) -> Result<(), StoreError> {
        let mut datasets = self.datasets.write();
        if let Some(existing) = datasets.get(dataset) {
            if existing.attributes == *attributes {
                return Ok(());
            }
            return Err(StoreError::DatasetConflict(dataset.to_string()));
        }
        if attributes.shape.contains(&0) {
            return Err(StoreError::OutOfBounds {
                dataset: dataset.to_string(),
                region: Region::new([0; 3], attributes.shape),
                shape: attributes.shape,
            });
        }

        let dataset_entry = Arc::new(Dataset {
            attributes: *attributes,
            voxels: RwLock::new(Volume3::new_filled(attributes.shape, 0)),
        });
        datasets.insert(dataset.to_string(), dataset_entry);
        Ok(())
    }

    fn write_block(
        &self,
        dataset: &str,
        block: &BlockDescriptor,
        data: &Volume3<u64>,
    ) -> Result<(), StoreError> {
        let entry = self.dataset(dataset)?;
        if data.shape() != block.extent {
            return Err(StoreError::BlockShapeMismatch {
                dataset: dataset.to_string(),
                expected: block.extent,
                actual: data.shape(),
            });
        }
        if !block.region().fits_in(entry.attributes.shape) {
            return Err(StoreError::OutOfBounds {
                dataset: dataset.to_string(),
                region: block.region(),
                shape: entry.attributes.shape,
            });
        }
        entry.voxels.write().copy_region_from(block.offset, data);
        Ok(())
    }
}
