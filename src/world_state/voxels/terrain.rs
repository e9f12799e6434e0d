//! # Terrain Module
//!
//! Deterministic height-field terrain. Each column's height comes from 2D Perlin
//! noise sampled in world space, shifted by a world-level offset derived from the
//! seed, so neighbouring chunks line up and the same seed always rebuilds the same
//! world.
//!
//! ## Layering
//!
//! For a column of height `h` every cell `y ∈ [0, h]` is filled: the top cells
//! with `y ≥ h - 2` become soil only when they also lie above `base_height`;
//! everything else is stone. A column whose height equals `base_height` is
//! therefore solid stone up to its surface.

use cgmath::Vector2;
use noise::{NoiseFn, Perlin};

use crate::config::TerrainConfig;
use crate::world_state::voxels::block::block_type::BlockType;
use crate::world_state::voxels::chunk::{ChunkPosition, VoxelGrid};

/// Half-width of the range each component of the noise offset is drawn from.
pub const NOISE_OFFSET_RANGE: f64 = 1000.0;

/// Produces chunk grids from a seed and terrain parameters.
///
/// The generator holds no mutable state, so one instance is shared by all
/// worker threads behind an `Arc`.
pub struct TerrainGenerator {
    config: TerrainConfig,
    chunk_size: usize,
    offset: Vector2<f64>,
    perlin: Perlin,
}

impl TerrainGenerator {
    /// Creates a generator for chunks of edge length `chunk_size`.
    pub fn new(config: TerrainConfig, seed: u64, chunk_size: usize) -> Self {
        TerrainGenerator {
            config,
            chunk_size,
            offset: Self::noise_offset(seed),
            perlin: Perlin::new(0),
        }
    }

    /// World-level noise offset for a seed. Independent of chunk position.
    pub fn noise_offset(seed: u64) -> Vector2<f64> {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut component = || (rng.f64() * 2.0 - 1.0) * NOISE_OFFSET_RANGE;
        let x = component();
        let y = component();
        Vector2::new(x, y)
    }

    /// The offset this generator samples noise with.
    pub fn offset(&self) -> Vector2<f64> {
        self.offset
    }

    /// Edge length of the chunks this generator produces.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Noise value in `[0, 1)` for a world column.
    pub fn sample(&self, world_x: i64, world_z: i64) -> f64 {
        let nx = (world_x as f64 + self.offset.x) * self.config.noise_scale;
        let nz = (world_z as f64 + self.offset.y) * self.config.noise_scale;
        let value = (self.perlin.get([nx, nz]) + 1.0) * 0.5;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }

    /// Surface height of a world column, clamped into the chunk.
    pub fn column_height(&self, world_x: i64, world_z: i64) -> i32 {
        let noise_value = self.sample(world_x, world_z);
        Self::height_from_noise(&self.config, noise_value, self.chunk_size)
    }

    /// `clamp(base + round(noise · multiplier), 0, S - 1)`, rounding halves to even.
    pub fn height_from_noise(config: &TerrainConfig, noise_value: f64, chunk_size: usize) -> i32 {
        // Summed and clamped in f64: a large multiplier would overflow i32.
        let variation = (noise_value * config.height_multiplier).round_ties_even();
        let height = config.base_height as f64 + variation;
        height.clamp(0.0, (chunk_size - 1) as f64) as i32
    }

    /// Block type for cell `y` of a column with surface `height`.
    pub fn layer_block(y: i32, height: i32, base_height: i32) -> BlockType {
        if y >= height - 2 && y > base_height {
            BlockType::DIRT
        } else {
            BlockType::STONE
        }
    }

    /// Generates the grid for a chunk.
    pub fn generate(&self, position: ChunkPosition) -> VoxelGrid {
        let size = self.chunk_size;
        let mut grid = VoxelGrid::new(size);

        for x in 0..size {
            for z in 0..size {
                let world_x = position.x as i64 * size as i64 + x as i64;
                let world_z = position.y as i64 * size as i64 + z as i64;
                let height = self.column_height(world_x, world_z);

                for y in 0..=height {
                    let block = Self::layer_block(y, height, self.config.base_height);
                    grid.set_in_bounds(x, y as usize, z, block.code());
                }
            }
        }

        grid
    }
}
