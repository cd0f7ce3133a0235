//! Tests for the block grid.

use rand::prelude::*;

use super::*;

#[test]
fn exact_multiple_has_no_clipping() {
    let grid = BlockGrid::new([8, 8, 8], [4, 4, 4]).unwrap();
    assert_eq!(grid.dims(), [2, 2, 2]);
    assert_eq!(grid.block_count(), 8);
    assert!(grid.blocks().iter().all(|b| b.extent == [4, 4, 4]));
}

#[test]
fn upper_blocks_are_clipped() {
    // 10 = 4 + 4 + 2 along x, 5 = 4 + 1 along y, 3 < 4 along z
    let grid = BlockGrid::new([10, 5, 3], [4, 4, 4]).unwrap();
    assert_eq!(grid.dims(), [3, 2, 1]);

    let last = grid.block_at([2, 1, 0]).unwrap();
    assert_eq!(last.offset, [8, 4, 0]);
    assert_eq!(last.extent, [2, 1, 3]);

    let first = grid.block_at([0, 0, 0]).unwrap();
    assert_eq!(first.extent, [4, 4, 3]);
}

#[test]
fn grid_index_is_x_fastest() {
    let grid = BlockGrid::new([12, 8, 8], [4, 4, 4]).unwrap();
    let blocks = grid.blocks();
    let positions: Vec<[usize; 3]> = blocks.iter().take(4).map(|b| b.grid_position).collect();
    assert_eq!(positions, vec![[0, 0, 0], [1, 0, 0], [2, 0, 0], [0, 1, 0]]);
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(block.grid_index, i as u64);
    }
    assert_eq!(grid.grid_index([1, 1, 1]), 1 + 3 * (1 + 2));
}

#[test]
fn block_by_index_matches_enumeration() {
    let grid = BlockGrid::new([9, 7, 5], [2, 3, 4]).unwrap();
    for block in grid.blocks() {
        assert_eq!(grid.block(block.grid_index), Some(block));
    }
    assert_eq!(grid.block(grid.block_count() as u64), None);
}

#[test]
fn zero_shape_or_block_size_is_a_config_error() {
    assert_eq!(
        BlockGrid::new([0, 4, 4], [2, 2, 2]),
        Err(ConfigError::InvalidShape([0, 4, 4]))
    );
    assert_eq!(
        BlockGrid::new([4, 4, 4], [2, 0, 2]),
        Err(ConfigError::InvalidBlockSize([2, 0, 2]))
    );
}

#[test]
fn next_along_stops_at_volume_edge() {
    let grid = BlockGrid::new([8, 4, 4], [4, 4, 4]).unwrap();
    let first = grid.block_at([0, 0, 0]).unwrap();
    let second = grid.next_along(&first, 0).unwrap();
    assert_eq!(second.offset, [4, 0, 0]);
    assert_eq!(grid.next_along(&second, 0), None);
    assert_eq!(grid.next_along(&first, 1), None);
    assert_eq!(grid.next_along(&first, 2), None);
}

#[test]
fn blocks_tile_random_volumes_exactly_once() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..50 {
        let shape = [
            rng.random_range(1..20),
            rng.random_range(1..20),
            rng.random_range(1..20),
        ];
        let block_size = [
            rng.random_range(1..9),
            rng.random_range(1..9),
            rng.random_range(1..9),
        ];
        let grid = BlockGrid::new(shape, block_size).unwrap();

        let mut coverage = vec![0u8; shape[0] * shape[1] * shape[2]];
        for block in grid.blocks() {
            assert!(block.region().fits_in(shape), "{block} exceeds {shape:?}");
            let end = block.region().end();
            for z in block.offset[2]..end[2] {
                for y in block.offset[1]..end[1] {
                    for x in block.offset[0]..end[0] {
                        coverage[x + shape[0] * (y + shape[1] * z)] += 1;
                    }
                }
            }
        }
        assert!(
            coverage.iter().all(|&c| c == 1),
            "shape {shape:?} block {block_size:?} not tiled exactly once"
        );
    }
}

#[test]
fn expanded_region_is_clipped_to_volume() {
    let region = Region::new([0, 4, 6], [4, 4, 2]);
    let grown = region.expanded([1, 2, 3], [10, 10, 8]);
    assert_eq!(grown.offset, [0, 2, 3]);
    assert_eq!(grown.end(), [5, 10, 8]);
    assert!(grown.contains([0, 2, 3]));
    assert!(!grown.contains([5, 2, 3]));
}

#[test]
fn plane_is_one_voxel_thick() {
    let region = Region::new([4, 8, 12], [4, 5, 6]);
    let plane = region.plane(1, 12);
    assert_eq!(plane.offset, [4, 12, 12]);
    assert_eq!(plane.extent, [4, 1, 6]);
    assert_eq!(plane.voxel_count(), 24);
}
