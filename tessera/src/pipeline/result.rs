//! Outcome of a connected-components run.

use serde::Serialize;

use crate::resolution::{ComponentStats, Resolution};

/// Counts from every stage, plus the resolution itself.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub block_count: usize,
    /// Distinct merge edges across all block faces.
    pub edge_count: usize,
    pub union_find_nodes: usize,
    pub components_before_filter: usize,
    pub components_after_filter: usize,
    pub voxels_written: u64,
    /// Foreground voxels zeroed by the minimum-volume filter.
    pub voxels_dropped: u64,
    /// Whether coordinate sums were accumulated.
    pub centroids: bool,
    /// Provisional to final ID mapping and per-component statistics.
    pub resolution: Resolution,
}

impl RunSummary {
    pub fn dropped_components(&self) -> usize {
        self.components_before_filter - self.components_after_filter
    }

    /// Statistics of the components present in the output.
    pub fn components(&self) -> impl Iterator<Item = &ComponentStats> + '_ {
        self.resolution.kept_components()
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            block_count: self.block_count,
            edge_count: self.edge_count,
            union_find_nodes: self.union_find_nodes,
            components_before_filter: self.components_before_filter,
            components_after_filter: self.components_after_filter,
            min_volume: self.resolution.min_volume(),
            voxels_written: self.voxels_written,
            voxels_dropped: self.voxels_dropped,
            components: self
                .components()
                .map(|stats| ComponentReport {
                    id: stats.id,
                    volume: stats.volume,
                    centroid: stats.centroid().filter(|_| self.centroids),
                })
                .collect(),
        }
    }
}

/// Serializable form of [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub block_count: usize,
    pub edge_count: usize,
    pub union_find_nodes: usize,
    pub components_before_filter: usize,
    pub components_after_filter: usize,
    pub min_volume: u64,
    pub voxels_written: u64,
    pub voxels_dropped: u64,
    pub components: Vec<ComponentReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentReport {
    pub id: u64,
    pub volume: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<[f64; 3]>,
}
