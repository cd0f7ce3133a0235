//! Configuration for a connected-component run.
//!
//! [`Config`] is plain serde data so it can be kept in a YAML or JSON file
//! next to the datasets it describes.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ============================================================================
// Enums
// ============================================================================

/// Voxel neighborhood used to decide which foreground voxels touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// Face neighbors only.
    Six,
    /// Face and edge neighbors.
    Eighteen,
    /// Full 3x3x3 neighborhood.
    #[default]
    TwentySix,
}

/// Predicate turning input voxel values into foreground/background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Foreground {
    #[default]
    NonZero,
    /// Strictly greater than the threshold.
    Above(u64),
    Equals(u64),
}

impl Foreground {
    #[inline]
    pub fn test(self, value: u64) -> bool {
        match self {
            Foreground::NonZero => value != 0,
            Foreground::Above(threshold) => value > threshold,
            Foreground::Equals(target) => value == target,
        }
    }
}

/// Size below which a merged component is dropped from the output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MinimumVolume {
    Voxels(u64),
    /// A physical volume, converted with the voxel resolution.
    Physical { volume: f64, resolution: [f64; 3] },
}

impl Default for MinimumVolume {
    fn default() -> Self {
        MinimumVolume::Voxels(0)
    }
}

impl MinimumVolume {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let MinimumVolume::Physical { volume, resolution } = *self {
            if !volume.is_finite() || volume < 0.0 {
                return Err(ConfigError::InvalidMinimumVolume(volume));
            }
            if resolution.iter().any(|r| !r.is_finite() || *r <= 0.0) {
                return Err(ConfigError::InvalidResolution(resolution));
            }
        }
        Ok(())
    }

    /// Threshold in voxels; physical volumes round up.
    pub fn in_voxels(&self) -> u64 {
        match *self {
            MinimumVolume::Voxels(voxels) => voxels,
            MinimumVolume::Physical { volume, resolution } => {
                let voxel_volume = resolution[0] * resolution[1] * resolution[2];
                (volume / voxel_volume).ceil() as u64
            }
        }
    }
}

// ============================================================================
// Mask
// ============================================================================

/// A second dataset whose zero voxels force background.
///
/// The mask may be stored at a lower resolution; voxel `p` of the input maps
/// to mask voxel `p / downsampling`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskConfig {
    pub dataset: String,
    #[serde(default = "unit_downsampling")]
    pub downsampling: [usize; 3],
}

fn unit_downsampling() -> [usize; 3] {
    [1, 1, 1]
}

impl MaskConfig {
    pub fn new(dataset: impl Into<String>, downsampling: [usize; 3]) -> Self {
        Self {
            dataset: dataset.into(),
            downsampling,
        }
    }

    /// Shape the mask dataset must have to cover a volume of `shape`.
    pub fn expected_shape(&self, shape: [usize; 3]) -> [usize; 3] {
        [
            shape[0].div_ceil(self.downsampling[0]),
            shape[1].div_ceil(self.downsampling[1]),
            shape[2].div_ceil(self.downsampling[2]),
        ]
    }
}

// ============================================================================
// Contact sites
// ============================================================================

/// Labels contact sites between the input entities and a partner dataset
/// instead of plain foreground.
///
/// A voxel belongs to contact `(a, b)` when the input holds `a > 0` and the
/// partner holds `b > 0` there. Regions only connect within one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactConfig {
    pub partner: String,
    /// Both datasets label the same entity class, so `(a, b)` and `(b, a)`
    /// are the same contact.
    #[serde(default)]
    pub same_class: bool,
}

impl ContactConfig {
    pub fn new(partner: impl Into<String>, same_class: bool) -> Self {
        Self {
            partner: partner.into(),
            same_class,
        }
    }
}

// ============================================================================
// Config
// ============================================================================

/// Default bound on blocks processed at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -- Datasets --
    pub input: String,
    pub output: String,
    /// Holds provisional labels between the labeling and relabeling passes.
    /// Defaults to `"{output}_blockwise"`.
    pub provisional: Option<String>,
    pub mask: Option<MaskConfig>,
    /// When set, `foreground` is ignored and contact sites are labeled.
    pub contacts: Option<ContactConfig>,

    // -- Geometry --
    /// Overrides the input dataset's block size.
    pub block_size: Option<[usize; 3]>,
    /// Extra margin read around each block during labeling.
    pub halo: [usize; 3],

    // -- Labeling --
    pub foreground: Foreground,
    pub connectivity: Connectivity,

    // -- Filtering and statistics --
    pub min_volume: MinimumVolume,
    pub compute_centroids: bool,

    // -- Execution --
    pub max_in_flight: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            provisional: None,
            mask: None,
            contacts: None,
            block_size: None,
            halo: [0; 3],
            foreground: Foreground::default(),
            connectivity: Connectivity::default(),
            min_volume: MinimumVolume::default(),
            compute_centroids: false,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl Config {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn provisional_dataset(&self) -> String {
        self.provisional
            .clone()
            .unwrap_or_else(|| format!("{}_blockwise", self.output))
    }

    /// Checks everything that can be checked without touching the store.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.is_empty() {
            return Err(ConfigError::EmptyDatasetName("input"));
        }
        if self.output.is_empty() {
            return Err(ConfigError::EmptyDatasetName("output"));
        }
        let provisional = self.provisional_dataset();
        if provisional.is_empty() {
            return Err(ConfigError::EmptyDatasetName("provisional"));
        }

        let mut inputs = vec![self.input.as_str()];
        if let Some(mask) = &self.mask {
            if mask.dataset.is_empty() {
                return Err(ConfigError::EmptyDatasetName("mask"));
            }
            if mask.downsampling.contains(&0) {
                return Err(ConfigError::InvalidDownsampling(mask.downsampling));
            }
            inputs.push(mask.dataset.as_str());
        }
        if let Some(contacts) = &self.contacts {
            if contacts.partner.is_empty() {
                return Err(ConfigError::EmptyDatasetName("partner"));
            }
            inputs.push(contacts.partner.as_str());
        }
        for written in [self.output.as_str(), provisional.as_str()] {
            if inputs.contains(&written) {
                return Err(ConfigError::DatasetAliasing(written.to_string()));
            }
        }
        if self.output == provisional {
            return Err(ConfigError::DatasetAliasing(provisional));
        }

        if let Some(block_size) = self.block_size {
            if block_size.contains(&0) {
                return Err(ConfigError::InvalidBlockSize(block_size));
            }
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        self.min_volume.validate()
    }
}
