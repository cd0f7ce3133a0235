//! Fixtures and brute-force oracles shared by the unit tests.

use std::collections::VecDeque;

use rand::prelude::*;

use crate::config::Connectivity;
use crate::volume::{DataType, DatasetAttributes, MemoryStore, Volume3};

/// Builds a binary volume from ASCII art: one string slice per z layer, one
/// string per y row, `#` for foreground and anything else for background.
pub fn mask_from_layers(layers: &[&[&str]]) -> Volume3<bool> {
    let depth = layers.len();
    let height = layers[0].len();
    let width = layers[0][0].len();
    let mut voxels = Vec::with_capacity(width * height * depth);
    for layer in layers {
        assert_eq!(layer.len(), height, "ragged layer");
        for row in layer.iter() {
            assert_eq!(row.len(), width, "ragged row");
            voxels.extend(row.bytes().map(|c| c == b'#'));
        }
    }
    Volume3::new([width, height, depth], voxels)
}

pub fn to_values(mask: &Volume3<bool>) -> Volume3<u64> {
    Volume3::new(
        mask.shape(),
        mask.voxels().iter().map(|&fg| u64::from(fg)).collect(),
    )
}

pub fn random_mask(rng: &mut StdRng, shape: [usize; 3], density: f64) -> Volume3<bool> {
    let len = shape[0] * shape[1] * shape[2];
    Volume3::new(shape, (0..len).map(|_| rng.random_bool(density)).collect())
}

/// A store holding `volume` as dataset `name`.
pub fn store_with(name: &str, volume: Volume3<u64>, block_size: [usize; 3]) -> MemoryStore {
    let store = MemoryStore::new();
    add_dataset(&store, name, volume, block_size);
    store
}

pub fn add_dataset(store: &MemoryStore, name: &str, volume: Volume3<u64>, block_size: [usize; 3]) {
    let attributes = DatasetAttributes::new(volume.shape(), block_size, DataType::Uint64);
    store.insert(name, attributes, volume);
}

fn neighbor_offsets(connectivity: Connectivity) -> Vec<[isize; 3]> {
    let max_nonzero = match connectivity {
        Connectivity::Six => 1,
        Connectivity::Eighteen => 2,
        Connectivity::TwentySix => 3,
    };
    let mut offsets = Vec::new();
    for dz in -1..=1isize {
        for dy in -1..=1isize {
            for dx in -1..=1isize {
                let nonzero = [dx, dy, dz].iter().filter(|d| **d != 0).count();
                if nonzero > 0 && nonzero <= max_nonzero {
                    offsets.push([dx, dy, dz]);
                }
            }
        }
    }
    offsets
}

/// Flood-fill labeling of a whole volume, numbered in raster order of each
/// component's first voxel.
pub fn bfs_labels(mask: &Volume3<bool>, connectivity: Connectivity) -> (Volume3<u32>, usize) {
    let shape = mask.shape();
    let offsets = neighbor_offsets(connectivity);
    let mut labels = Volume3::new_filled(shape, 0u32);
    let mut next = 0u32;
    let mut queue = VecDeque::new();

    for start in 0..mask.len() {
        if !mask[start] || labels[start] != 0 {
            continue;
        }
        next += 1;
        labels[start] = next;
        queue.push_back(mask.position_of(start));

        while let Some(p) = queue.pop_front() {
            for d in &offsets {
                let q = [
                    p[0].checked_add_signed(d[0]),
                    p[1].checked_add_signed(d[1]),
                    p[2].checked_add_signed(d[2]),
                ];
                let [Some(x), Some(y), Some(z)] = q else {
                    continue;
                };
                if x >= shape[0] || y >= shape[1] || z >= shape[2] {
                    continue;
                }
                if mask[[x, y, z]] && labels[[x, y, z]] == 0 {
                    labels[[x, y, z]] = next;
                    queue.push_back([x, y, z]);
                }
            }
        }
    }

    (labels, next as usize)
}

/// True if both labelings group foreground voxels identically.
pub fn same_partition(a: &[u64], b: &[u64]) -> bool {
    use std::collections::HashMap;

    if a.len() != b.len() {
        return false;
    }
    let mut forward = HashMap::new();
    let mut backward = HashMap::new();
    for (&x, &y) in a.iter().zip(b) {
        if (x == 0) != (y == 0) {
            return false;
        }
        if x == 0 {
            continue;
        }
        if *forward.entry(x).or_insert(y) != y || *backward.entry(y).or_insert(x) != x {
            return false;
        }
    }
    true
}
