//! The contract the pipeline needs from a chunked-array backend.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::grid::{BlockDescriptor, Region};
use crate::volume::Volume3;

/// Element type a dataset is stored as. Readers always widen to `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
}

/// Block compression, passed through untouched from input to output datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Compression {
    #[default]
    Raw,
    Gzip {
        level: u32,
    },
    Zstd {
        level: i32,
    },
    Lz4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetAttributes {
    pub shape: [usize; 3],
    pub block_size: [usize; 3],
    pub data_type: DataType,
    pub compression: Compression,
}

impl DatasetAttributes {
    pub fn new(shape: [usize; 3], block_size: [usize; 3], data_type: DataType) -> Self {
        Self {
            shape,
            block_size,
            data_type,
            compression: Compression::default(),
        }
    }

    /// Label output derived from these attributes: same geometry, 64-bit IDs.
    pub fn for_labels(&self, block_size: [usize; 3]) -> Self {
        Self {
            shape: self.shape,
            block_size,
            data_type: DataType::Uint64,
            compression: self.compression,
        }
    }
}

/// Read access to named chunked datasets.
///
/// Implementations must be safe to call from many blocks concurrently.
pub trait VolumeReader: Sync {
    fn attributes(&self, dataset: &str) -> Result<DatasetAttributes, StoreError>;

    /// Reads any in-bounds region. Out-of-bounds regions are an error, not
    /// zero-extended.
    fn read_region(&self, dataset: &str, region: Region) -> Result<Volume3<u64>, StoreError>;

    fn read_block(
        &self,
        dataset: &str,
        block: &BlockDescriptor,
    ) -> Result<Volume3<u64>, StoreError> {
        self.read_region(dataset, block.region())
    }
}

/// Write access to named chunked datasets.
pub trait VolumeWriter: Sync {
    /// Creates a dataset. Re-creating one with identical attributes is a no-op.
    fn create_dataset(
        &self,
        dataset: &str,
        attributes: &DatasetAttributes,
    ) -> Result<(), StoreError>;

    /// Writes `data` at the location of `block`. `data` must have the block's extent.
    fn write_block(
        &self,
        dataset: &str,
        block: &BlockDescriptor,
        data: &Volume3<u64>,
    ) -> Result<(), StoreError>;
}
