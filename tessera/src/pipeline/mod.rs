//! Blockwise connected components, end to end.
//!
//! # Stages
//!
//! 1. **Labeling** - every block is labeled independently and written to the
//!    provisional dataset with globally unique provisional IDs
//! 2. **Edge extraction** - every block compares its positive faces with its
//!    neighbors and reports must-merge ID pairs
//! 3. **Resolution** - the gathered edges build one union-find, which yields
//!    final IDs and per-component volumes (single-threaded)
//! 4. **Relabeling** - every block is rewritten with final, size-filtered IDs
//!
//! Stages 1, 2 and 4 run through an [`Executor`]. The barriers between stages
//! are the only synchronization points, and any block failure aborts the run.

mod result;

pub use result::{ComponentReport, RunReport, RunSummary};

use std::time::Instant;

use crate::boundary::{
    AnyForeground, EdgeEquivalence, SameEntityPair, extract_block_edges, merge_edge_sets,
};
use crate::config::Config;
use crate::error::{ConfigError, Error, Result, Stage};
use crate::executor::{Executor, ProgressCallback, ProgressTracker, RayonExecutor};
use crate::grid::{BlockDescriptor, BlockGrid};
use crate::labeling::{BlockLabeler, BlockLabels};
use crate::relabel::{RelabelCounts, relabel_block};
use crate::resolution::Resolution;
use crate::union_find::UnionFind;
use crate::volume::{DatasetAttributes, VolumeReader, VolumeWriter};


/// Runs connected-component labeling over datasets of a chunked store.
#[derive(Clone)]
pub struct ConnectedComponents {
    config: Config,
    progress: ProgressCallback,
}

impl std::fmt::Debug for ConnectedComponents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectedComponents")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl ConnectedComponents {
    /// Fails if the configuration is invalid.
    pub fn new(config: Config) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            progress: None,
        })
    }

    /// Reports each finished block of every per-block stage.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs on the rayon pool with `max_in_flight` blocks at a time.
    pub fn run<S>(&self, store: &S) -> Result<RunSummary>
    where
        S: VolumeReader + VolumeWriter + ?Sized,
    {
        self.run_with(store, &RayonExecutor::new(self.config.max_in_flight))
    }

    pub fn run_with<S, E>(&self, store: &S, executor: &E) -> Result<RunSummary>
    where
        S: VolumeReader + VolumeWriter + ?Sized,
        E: Executor,
    {
        let start = Instant::now();
        let config = &self.config;
        let provisional = config.provisional_dataset();

        let (grid, label_attributes) = self.plan(store)?;
        let labeler = BlockLabeler::new(config, &grid)?;
        let blocks = grid.blocks();
        tracing::info!(
            input = %config.input,
            output = %config.output,
            shape = ?grid.shape(),
            block_size = ?grid.block_size(),
            blocks = blocks.len(),
            id_stride = labeler.id_space().stride(),
            "Starting connected components"
        );

        for dataset in [provisional.as_str(), config.output.as_str()] {
            store
                .create_dataset(dataset, &label_attributes)
                .map_err(|source| Error::store(dataset, source))?;
        }

        // Labeling
        let stage_start = Instant::now();
        let tracker = ProgressTracker::new(&self.progress, Stage::Labeling, blocks.len());
        let labels: Vec<BlockLabels> = executor.try_map(&blocks, |block| {
            let labeled = labeler
                .label_block(store, block)
                .and_then(|labeled| {
                    store.write_block(&provisional, block, &labeled.labels)?;
                    Ok(labeled)
                })
                .map_err(|source| block_error(Stage::Labeling, block, source))?;
            tracing::debug!(
                block = block.grid_index,
                components = labeled.summary.components.len(),
                "Labeled block"
            );
            tracker.block_done();
            Ok::<_, Error>(labeled.summary)
        })?;
        let provisional_count: usize = labels.iter().map(|l| l.components.len()).sum();
        tracing::info!(
            provisional_ids = provisional_count,
            elapsed_ms = stage_start.elapsed().as_millis() as u64,
            "Labeled blocks"
        );

        // Edge extraction
        let stage_start = Instant::now();
        let same_pair;
        let predicate: &dyn EdgeEquivalence = if config.contacts.is_some() {
            same_pair = labels
                .iter()
                .flat_map(|l| l.pairs.iter().copied())
                .collect::<SameEntityPair>();
            &same_pair
        } else {
            &AnyForeground
        };
        let tracker = ProgressTracker::new(&self.progress, Stage::EdgeExtraction, blocks.len());
        let per_block = executor.try_map(&blocks, |block| {
            let edges = extract_block_edges(
                store,
                &provisional,
                &grid,
                block,
                config.connectivity,
                predicate,
            )
            .map_err(|source| block_error(Stage::EdgeExtraction, block, source))?;
            tracker.block_done();
            Ok::<_, Error>(edges)
        })?;
        let edges = merge_edge_sets(per_block);
        tracing::info!(
            edges = edges.len(),
            elapsed_ms = stage_start.elapsed().as_millis() as u64,
            "Extracted boundary edges"
        );

        // Resolution
        let stage_start = Instant::now();
        let union_find = UnionFind::from_edges(&edges);
        let union_find_nodes = union_find.len();
        let resolution = Resolution::resolve(union_find, &labels, config.min_volume.in_voxels());
        tracing::info!(
            union_find_nodes,
            components = resolution.component_count(),
            kept = resolution.kept_count(),
            min_volume = resolution.min_volume(),
            elapsed_ms = stage_start.elapsed().as_millis() as u64,
            "Resolved components"
        );

        // Relabeling
        let stage_start = Instant::now();
        let tracker = ProgressTracker::new(&self.progress, Stage::Relabeling, blocks.len());
        let counts = executor.try_map(&blocks, |block| {
            let counts = relabel_block(store, &provisional, &config.output, block, &resolution)
                .map_err(|source| block_error(Stage::Relabeling, block, source))?;
            tracker.block_done();
            Ok::<_, Error>(counts)
        })?;
        let counts = counts
            .into_iter()
            .fold(RelabelCounts::default(), |total, c| total + c);
        tracing::info!(
            voxels_written = counts.written,
            voxels_dropped = counts.dropped,
            elapsed_ms = stage_start.elapsed().as_millis() as u64,
            "Relabeled blocks"
        );

        let summary = RunSummary {
            block_count: blocks.len(),
            edge_count: edges.len(),
            union_find_nodes,
            components_before_filter: resolution.component_count(),
            components_after_filter: resolution.kept_count(),
            voxels_written: counts.written,
            voxels_dropped: counts.dropped,
            centroids: config.compute_centroids,
            resolution,
        };
        tracing::info!(
            components = summary.components_after_filter,
            dropped = summary.dropped_components(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Connected components finished"
        );
        Ok(summary)
    }

    /// Grid and output attributes, after checking every input dataset.
    fn plan<S>(&self, store: &S) -> Result<(BlockGrid, DatasetAttributes)>
    where
        S: VolumeReader + ?Sized,
    {
        let config = &self.config;
        let input = attributes(store, &config.input)?;
        let block_size = config.block_size.unwrap_or(input.block_size);
        let grid = BlockGrid::new(input.shape, block_size)?;

        if let Some(mask) = &config.mask {
            let actual = attributes(store, &mask.dataset)?.shape;
            let expected = mask.expected_shape(input.shape);
            if actual != expected {
                return Err(shape_mismatch(&mask.dataset, expected, actual));
            }
        }
        if let Some(contacts) = &config.contacts {
            let actual = attributes(store, &contacts.partner)?.shape;
            if actual != input.shape {
                return Err(shape_mismatch(&contacts.partner, input.shape, actual));
            }
        }

        Ok((grid, input.for_labels(block_size)))
    }
}

fn attributes<S: VolumeReader + ?Sized>(store: &S, dataset: &str) -> Result<DatasetAttributes> {
    store
        .attributes(dataset)
        .map_err(|source| Error::store(dataset, source))
}

fn shape_mismatch(dataset: &str, expected: [usize; 3], actual: [usize; 3]) -> Error {
    ConfigError::ShapeMismatch {
        dataset: dataset.to_string(),
        expected,
        actual,
    }
    .into()
}

fn block_error(stage: Stage, block: &BlockDescriptor, source: crate::error::StoreError) -> Error {
    tracing::error!(%block, %stage, error = %source, "Block failed");
    Error::Block {
        stage,
        block: *block,
        source,
    }
}
