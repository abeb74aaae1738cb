//! Tunable configuration for the caches and the follower.
//!
//! Every field has a default, so a host can load a partial JSON document
//! and only override what it cares about.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_OBSTACLE_CAPACITY, DEFAULT_POOL_CAPACITY, DEFAULT_RETENTION_FRAMES,
    FLAT_FLOOR_TOLERANCE, FLOOR_PROBE_RADIUS, FLOOR_SEARCH_DOWN, FLOOR_SEARCH_UP, TORSO_OFFSET,
};
use crate::path::PathFollowerParams;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path:?}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid configuration JSON.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings shared by every walkability cache a manager creates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkabilityConfig {
    /// Maximum obstacles a cache keeps before refusing to cache a region.
    pub obstacle_capacity: usize,
    /// Maximum caches the manager pool hands out at once.
    pub pool_capacity: usize,
    /// Frames a cache may go unqueried before it is evicted.
    pub retention_frames: u64,
    /// Margin added around requested regions to amortise nearby queries.
    pub cache_margin: Vec3,
    /// Horizontal radius of floor probes.
    pub floor_probe_radius: f32,
    /// Height above the probe point where floor searches begin.
    pub floor_search_up: f32,
    /// Depth below the probe point where floor searches end.
    pub floor_search_down: f32,
    /// Height of the torso sweep base above the floor.
    pub torso_offset: f32,
    /// Maximum floor delta between samples still considered flat.
    pub flat_floor_tolerance: f32,
}

impl Default for WalkabilityConfig {
    fn default() -> Self {
        Self {
            obstacle_capacity: DEFAULT_OBSTACLE_CAPACITY,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            retention_frames: DEFAULT_RETENTION_FRAMES,
            cache_margin: Vec3::new(2.0, 2.0, 1.0),
            floor_probe_radius: FLOOR_PROBE_RADIUS,
            floor_search_up: FLOOR_SEARCH_UP,
            floor_search_down: FLOOR_SEARCH_DOWN,
            torso_offset: TORSO_OFFSET,
            flat_floor_tolerance: FLAT_FLOOR_TOLERANCE,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Walkability cache settings.
    pub walkability: WalkabilityConfig,
    /// Default path follower parameters.
    pub follower: PathFollowerParams,
}

impl NavigationConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] when the JSON is malformed or has
    /// fields of the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when its contents are invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = path.as_ref();
        let text = fs::read_to_string(file).map_err(|source| ConfigError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}
