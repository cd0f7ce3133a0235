//! Error types for the connected-component pipeline.

use std::io;

use thiserror::Error;

use crate::grid::{BlockDescriptor, Region};

/// Failures reported by a chunked volume store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Dataset '{0}' not found")]
    DatasetNotFound(String),

    #[error("Dataset '{0}' already exists with different attributes")]
    DatasetConflict(String),

    #[error("Region {region} is out of bounds for dataset '{dataset}' of shape {shape:?}")]
    OutOfBounds {
        dataset: String,
        region: Region,
        shape: [usize; 3],
    },

    #[error("Block data for dataset '{dataset}' has shape {actual:?}, expected {expected:?}")]
    BlockShapeMismatch {
        dataset: String,
        expected: [usize; 3],
        actual: [usize; 3],
    },

    #[error("I/O error on dataset '{dataset}': {source}")]
    Io {
        dataset: String,
        #[source]
        source: io::Error,
    },
}

/// Invalid run configuration. Always reported before any block is processed.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Volume shape must be positive on every axis, got {0:?}")]
    InvalidShape([usize; 3]),

    #[error("Block size must be positive on every axis, got {0:?}")]
    InvalidBlockSize([usize; 3]),

    #[error("Mask downsampling must be positive on every axis, got {0:?}")]
    InvalidDownsampling([usize; 3]),

    #[error("Minimum volume must be finite and non-negative, got {0}")]
    InvalidMinimumVolume(f64),

    #[error("Voxel resolution must be finite and positive, got {0:?}")]
    InvalidResolution([f64; 3]),

    #[error("max_in_flight must be > 0")]
    ZeroConcurrency,

    #[error("Dataset name must not be empty ({0})")]
    EmptyDatasetName(&'static str),

    #[error("Dataset '{0}' is used both as an input and as an output")]
    DatasetAliasing(String),

    #[error(
        "ID space exhausted: {block_count} blocks with up to {stride} components each do not fit in u64"
    )]
    IdSpaceExhausted { block_count: u64, stride: u64 },

    #[error("Dataset '{dataset}' has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        dataset: String,
        expected: [usize; 3],
        actual: [usize; 3],
    },
}

/// Pipeline stage a block failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Labeling,
    EdgeExtraction,
    Relabeling,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Labeling => "labeling",
            Stage::EdgeExtraction => "edge extraction",
            Stage::Relabeling => "relabeling",
        };
        f.write_str(name)
    }
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Dataset '{dataset}': {source}")]
    Store {
        dataset: String,
        #[source]
        source: StoreError,
    },

    #[error("{stage} failed for {block}: {source}")]
    Block {
        stage: Stage,
        block: BlockDescriptor,
        #[source]
        source: StoreError,
    },
}

impl Error {
    pub(crate) fn store(dataset: &str, source: StoreError) -> Self {
        Error::Store {
            dataset: dataset.to_string(),
            source,
        }
    }

    /// The block whose processing failed, if the failure was block-local.
    pub fn block(&self) -> Option<&BlockDescriptor> {
        match self {
            Error::Block { block, .. } => Some(block),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
