//! Example: Label a synthetic volume of random blobs
//!
//! Fills an in-memory volume with random ellipsoids, some of them overlapping
//! several blocks, runs the blockwise connected-component pipeline and writes
//! a JSON report of the surviving components.
//!
//! The pipeline configuration can be supplied as YAML or JSON through
//! `TESSERA_CONFIG`; its `input` and `output` names are ignored. Without it a
//! default configuration with a 20-voxel minimum volume is used.
//!
//! Output:
//! ```text
//! test_output/synthetic_volume_config.yaml
//! test_output/synthetic_volume_report.json
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --example synthetic_volume
//! TESSERA_CONFIG=my_config.yaml cargo run --release --example synthetic_volume
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use common::{LogConfig, load_from_file, save_to_file, setup_logging};
use rand::prelude::*;
use tessera::{
    Config, ConnectedComponents, DataType, DatasetAttributes, MemoryStore, MinimumVolume,
    Progress, Volume3,
};

const SHAPE: [usize; 3] = [160, 128, 96];
const BLOCK_SIZE: [usize; 3] = [32, 32, 32];
const BLOB_COUNT: usize = 400;

fn main() -> anyhow::Result<()> {
    setup_logging(&LogConfig::default())?;

    let mut config = match env::var("TESSERA_CONFIG") {
        Ok(path) => load_from_file::<Config>(&path)
            .with_context(|| format!("Failed to load TESSERA_CONFIG from {path}"))?,
        Err(_) => Config {
            min_volume: MinimumVolume::Voxels(20),
            compute_centroids: true,
            ..Config::default()
        },
    };
    config.input = "raw".to_string();
    config.output = "cells".to_string();

    let output_dir = PathBuf::from("test_output");
    std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
    save_to_file(&config, output_dir.join("synthetic_volume_config.yaml"))?;

    let start = Instant::now();
    let volume = random_blobs(&mut StdRng::seed_from_u64(7), SHAPE, BLOB_COUNT);
    let foreground = volume.voxels().iter().filter(|&&v| v != 0).count();
    tracing::info!(
        shape = ?SHAPE,
        blobs = BLOB_COUNT,
        foreground,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Generated synthetic volume"
    );

    let store = MemoryStore::new();
    store.insert(
        "raw",
        DatasetAttributes::new(SHAPE, BLOCK_SIZE, DataType::Uint8),
        volume,
    );

    let progress = Arc::new(|p: Progress| {
        if p.completed == p.total || p.completed % 50 == 0 {
            tracing::info!(stage = %p.stage, completed = p.completed, total = p.total, "Progress");
        }
    });
    let summary = ConnectedComponents::new(config)?
        .with_progress(Some(progress))
        .run(&store)?;

    let report = summary.report();
    tracing::info!(
        blocks = report.block_count,
        edges = report.edge_count,
        components = report.components_after_filter,
        dropped = summary.dropped_components(),
        "Pipeline finished"
    );
    for component in report.components.iter().take(5) {
        tracing::info!(
            id = component.id,
            volume = component.volume,
            centroid = ?component.centroid,
            "Component"
        );
    }

    let report_path = output_dir.join("synthetic_volume_report.json");
    save_to_file(&report, &report_path)?;
    tracing::info!(path = %report_path.display(), "Report written");
    Ok(())
}

/// Random axis-aligned ellipsoids with value 255 on a zero background.
fn random_blobs(rng: &mut StdRng, shape: [usize; 3], count: usize) -> Volume3<u64> {
    let mut volume = Volume3::new_filled(shape, 0u64);
    for _ in 0..count {
        let center = shape.map(|extent| rng.random_range(0..extent) as f64);
        let radii = [
            rng.random_range(1.0..9.0),
            rng.random_range(1.0..9.0),
            rng.random_range(1.0..6.0),
        ];

        let lo: [usize; 3] =
            std::array::from_fn(|axis| (center[axis] - radii[axis]).floor().max(0.0) as usize);
        let hi: [usize; 3] = std::array::from_fn(|axis| {
            ((center[axis] + radii[axis]).ceil() as usize + 1).min(shape[axis])
        });

        for z in lo[2]..hi[2] {
            for y in lo[1]..hi[1] {
                for x in lo[0]..hi[0] {
                    let d: f64 = [x, y, z]
                        .iter()
                        .enumerate()
                        .map(|(axis, &p)| ((p as f64 - center[axis]) / radii[axis]).powi(2))
                        .sum();
                    if d <= 1.0 {
                        volume[[x, y, z]] = 255;
                    }
                }
            }
        }
    }
    volume
}
