//! Rewrites provisional IDs to final, size-filtered IDs.


use crate::error::StoreError;
use crate::grid::BlockDescriptor;
use crate::resolution::Resolution;
use crate::volume::{VolumeReader, VolumeWriter};

/// Voxel counts of one relabeled block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelabelCounts {
    /// Non-zero voxels written.
    pub written: u64,
    /// Foreground voxels zeroed by the size filter.
    pub dropped: u64,
}

impl std::ops::Add for RelabelCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            written: self.written + other.written,
            dropped: self.dropped + other.dropped,
        }
    }
}

/// Reads `block` from `source`, maps every voxel through `resolution`, and
/// writes the result to the same block of `destination`.
pub fn relabel_block<S>(
    store: &S,
    source: &str,
    destination: &str,
    block: &BlockDescriptor,
    resolution: &Resolution,
) -> Result<RelabelCounts, StoreError>
where
    S: VolumeReader + VolumeWriter + ?Sized,
{
    let mut labels = store.read_block(source, block)?;
    let mut counts = RelabelCounts::default();

    for voxel in labels.voxels_mut() {
        if *voxel == 0 {
            continue;
        }
        *voxel = resolution.output_label(*voxel);
        if *voxel == 0 {
            counts.dropped += 1;
        } else {
            counts.written += 1;
        }
    }

    store.write_block(destination, block, &labels)?;
    tracing::trace!(
        block = block.grid_index,
        written = counts.written,
        dropped = counts.dropped,
        "Relabeled block"
    );
    Ok(counts)
}
