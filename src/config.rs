//! # World Configuration
//!
//! The immutable settings a world is started with. A `WorldConfig` is built once
//! (defaults, JSON file or JSON string), validated, and then handed by value to the
//! terrain generator and the streamer. Nothing reads configuration from globals.
//!
//! ```json
//! {
//!     "chunk_size": 16,
//!     "render_radius": 5,
//!     "world_seed": 12345,
//!     "terrain": { "noise_scale": 0.1, "height_multiplier": 8.0, "base_height": 4 }
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world_state::voxels::chunk::DEFAULT_CHUNK_DIMENSION;

/// Largest supported chunk edge length.
pub const MAX_CHUNK_DIMENSION: usize = 256;

/// Errors raised while reading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid JSON for `WorldConfig`.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// A value is outside the range the voxel core supports.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Shape parameters for the height-field terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Spatial frequency of the noise field.
    pub noise_scale: f64,
    /// Vertical amplitude applied to the noise value.
    pub height_multiplier: f64,
    /// Floor offset added to every column.
    pub base_height: i32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            noise_scale: 0.1,
            height_multiplier: 8.0,
            base_height: 4,
        }
    }
}

/// Settings fixed at world start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length of a chunk in voxels.
    pub chunk_size: usize,
    /// Radius, in chunks, of the active area around the observer.
    pub render_radius: i32,
    /// Seed every terrain column is derived from.
    pub world_seed: u64,
    /// Number of background workers. `None` uses the available parallelism.
    pub worker_threads: Option<usize>,
    /// Directory the entry point stores chunk blobs in.
    pub save_directory: PathBuf,
    /// Terrain shape parameters.
    pub terrain: TerrainConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            chunk_size: DEFAULT_CHUNK_DIMENSION,
            render_radius: 5,
            world_seed: 12345,
            worker_threads: None,
            save_directory: PathBuf::from("world_save/chunks"),
            terrain: TerrainConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Reads and validates a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: WorldConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the voxel core relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_DIMENSION {
            return Err(ConfigError::Invalid(format!(
                "chunk_size must be in 1..={MAX_CHUNK_DIMENSION}, got {}",
                self.chunk_size
            )));
        }
        if self.render_radius < 0 {
            return Err(ConfigError::Invalid(format!(
                "render_radius must not be negative, got {}",
                self.render_radius
            )));
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::Invalid(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        if !self.terrain.noise_scale.is_finite() || self.terrain.noise_scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "terrain.noise_scale must be finite and positive, got {}",
                self.terrain.noise_scale
            )));
        }
        if !self.terrain.height_multiplier.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "terrain.height_multiplier must be finite, got {}",
                self.terrain.height_multiplier
            )));
        }
        if self.terrain.base_height < 0 || self.terrain.base_height as usize >= self.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "terrain.base_height must be in 0..{}, got {}",
                self.chunk_size, self.terrain.base_height
            )));
        }
        Ok(())
    }

    /// Worker count after resolving the `None` default.
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_world() {
        let config = WorldConfig::default();
        assert_eq!(config.chunk_size, 16);
        assert_eq!(config.render_radius, 5);
        assert_eq!(config.terrain.noise_scale, 0.1);
        assert_eq!(config.terrain.height_multiplier, 8.0);
        assert_eq!(config.terrain.base_height, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config =
            WorldConfig::from_json_str(r#"{ "render_radius": 2, "terrain": { "base_height": 6 } }"#)
                .unwrap();
        assert_eq!(config.render_radius, 2);
        assert_eq!(config.chunk_size, 16);
        assert_eq!(config.terrain.base_height, 6);
        assert_eq!(config.terrain.noise_scale, 0.1);
    }

    #[test]
    fn test_rejects_base_height_outside_chunk() {
        let result = WorldConfig::from_json_str(r#"{ "chunk_size": 8, "terrain": { "base_height": 8 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_chunk_size_and_zero_workers() {
        let mut config = WorldConfig {
            chunk_size: 0,
            ..WorldConfig::default()
        };
        assert!(config.validate().is_err());

        config.chunk_size = 16;
        config.worker_threads = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_terrain_parameters() {
        for (noise_scale, height_multiplier) in [
            (f64::INFINITY, 8.0),
            (f64::NAN, 8.0),
            (0.1, f64::NAN),
            (0.1, f64::NEG_INFINITY),
        ] {
            let config = WorldConfig {
                terrain: TerrainConfig {
                    noise_scale,
                    height_multiplier,
                    base_height: 4,
                },
                ..WorldConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "accepted noise_scale {noise_scale}, height_multiplier {height_multiplier}"
            );
        }

        let steep = WorldConfig {
            terrain: TerrainConfig {
                height_multiplier: 1e12,
                ..TerrainConfig::default()
            },
            ..WorldConfig::default()
        };
        assert!(steep.validate().is_ok());
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        let result = WorldConfig::from_json_str("{ chunk_size: }");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
