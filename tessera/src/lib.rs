//! Tessera - blockwise connected-component labeling of very large volumes.
//!
//! The volume is tiled into blocks that are labeled independently and in
//! parallel. Components straddling block faces are reconciled through a single
//! union-find over the IDs found on those faces, and a second parallel pass
//! writes final, size-filtered labels. The full volume is never held in
//! memory at once.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tessera::{Config, ConnectedComponents, MemoryStore, MinimumVolume};
//!
//! let store = MemoryStore::new();
//! // ... insert the "raw" dataset ...
//!
//! let mut config = Config::new("raw", "cells");
//! config.min_volume = MinimumVolume::Voxels(20);
//!
//! let summary = ConnectedComponents::new(config)?.run(&store)?;
//! println!("Found {} components", summary.components_after_filter);
//! ```

pub mod boundary;
pub mod config;
pub mod error;
pub mod executor;
pub mod grid;
pub mod labeling;
pub mod pipeline;
pub mod relabel;
pub mod resolution;
pub mod union_find;
pub mod volume;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Configuration and errors
// ============================================================================

pub use config::{
    Config, Connectivity, ContactConfig, DEFAULT_MAX_IN_FLIGHT, Foreground, MaskConfig,
    MinimumVolume,
};
pub use error::{ConfigError, Error, Result, Stage, StoreError};

// ============================================================================
// Volumes and storage
// ============================================================================

pub use grid::{BlockDescriptor, BlockGrid, Region};
pub use volume::{
    Compression, DataType, DatasetAttributes, MemoryStore, Volume3, VolumeReader, VolumeWriter,
};

// ============================================================================
// Pipeline
// ============================================================================

pub use boundary::{AnyForeground, EdgeEquivalence, MergeEdge, SameEntityPair};
pub use executor::{Executor, Progress, ProgressCallback, RayonExecutor, SequentialExecutor};
pub use labeling::{BlockLabeler, BlockLabels, ComponentRecord, EntityPair, IdSpace};
pub use pipeline::{ComponentReport, ConnectedComponents, RunReport, RunSummary};
pub use resolution::{ComponentStats, Resolution};
pub use union_find::UnionFind;
