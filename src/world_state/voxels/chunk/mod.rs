//! # Chunk Module
//!
//! This module provides the `Chunk` entity, which pairs a chunk's `VoxelGrid` with
//! its position in the horizontal chunk grid, and the coordinate helpers that map
//! world-space positions onto chunks.
//!
//! ## Coordinates
//!
//! Chunks tile the world horizontally only. A chunk at `(cx, cz)` spans world
//! `x ∈ [cx·S, cx·S + S)`, `z ∈ [cz·S, cz·S + S)` and the full world height
//! `y ∈ [0, S)`. Conversion from world space uses floor division so negative
//! coordinates map onto the chunk to their west/south.

use cgmath::{Point2, Point3};

use crate::error::VoxelError;
use crate::world_state::voxels::block::BlockTypeSize;

pub mod voxel_grid;

pub use voxel_grid::VoxelGrid;

/// The default dimension (width, height, depth) of a chunk in blocks.
pub const DEFAULT_CHUNK_DIMENSION: usize = 16;

/// Position of a chunk in chunk coordinates: `x` is `cx`, `y` is `cz`.
pub type ChunkPosition = Point2<i32>;

/// Key naming a chunk in a persistence medium, e.g. `"-3_7"`.
pub fn chunk_key(position: ChunkPosition) -> String {
    format!("{}_{}", position.x, position.y)
}

/// Chunk containing the world-space point `(x, _, z)`.
pub fn chunk_position_of(world_position: Point3<f32>, chunk_size: usize) -> ChunkPosition {
    world_to_chunk_coords(world_position, chunk_size).0
}

/// Splits a world-space point into its chunk and the voxel inside that chunk.
///
/// The point is floored onto the voxel lattice first; chunk and local coordinates
/// are then split off in integer arithmetic, so the local voxel is always inside
/// `[0, S)` horizontally.
pub fn world_to_chunk_coords(
    world_position: Point3<f32>,
    chunk_size: usize,
) -> (ChunkPosition, Point3<i32>) {
    let size = chunk_size as i32;
    let voxel_x = world_position.x.floor() as i32;
    let voxel_z = world_position.z.floor() as i32;
    let chunk_position = Point2::new(voxel_x.div_euclid(size), voxel_z.div_euclid(size));
    let local = Point3::new(
        voxel_x.rem_euclid(size),
        world_position.y.floor() as i32,
        voxel_z.rem_euclid(size),
    );
    (chunk_position, local)
}

/// World-space origin `(cx·S, 0, cz·S)` of a chunk.
pub fn chunk_origin(position: ChunkPosition, chunk_size: usize) -> Point3<i32> {
    let size = chunk_size as i32;
    Point3::new(position.x * size, 0, position.y * size)
}

/// Euclidean distance between two chunk positions, in chunks.
pub fn chunk_distance(a: ChunkPosition, b: ChunkPosition) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dz = (a.y - b.y) as f64;
    (dx * dx + dz * dz).sqrt()
}

/// A materialized chunk: its grid, its position, and whether its mesh is current.
///
/// The grid is owned exclusively by the chunk. All writes go through
/// `set_block`/`fill`, which mark the mesh stale so the owner knows to resynthesize.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: ChunkPosition,
    grid: VoxelGrid,
    mesh_stale: bool,
}

impl Chunk {
    /// Wraps a freshly produced grid. The mesh starts stale.
    pub fn new(position: ChunkPosition, grid: VoxelGrid) -> Self {
        Chunk {
            position,
            grid,
            mesh_stale: true,
        }
    }

    /// Read access to the grid.
    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    /// Reads a chunk-local cell; empty outside the cube.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockTypeSize {
        self.grid.get(x, y, z)
    }

    /// Writes a chunk-local cell and marks the mesh stale.
    pub fn set_block(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        block: BlockTypeSize,
    ) -> Result<(), VoxelError> {
        self.grid.set(x, y, z, block)?;
        self.mesh_stale = true;
        Ok(())
    }

    /// Sets every cell and marks the mesh stale.
    pub fn fill(&mut self, block: BlockTypeSize) {
        self.grid.fill(block);
        self.mesh_stale = true;
    }

    /// Whether the grid changed since the mesh was last synthesized.
    pub fn is_mesh_stale(&self) -> bool {
        self.mesh_stale
    }

    /// Records that a mesh matching the current grid has been synthesized.
    pub fn mark_meshed(&mut self) {
        self.mesh_stale = false;
    }

    /// Releases the chunk, handing back its grid.
    pub fn into_grid(self) -> VoxelGrid {
        self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world_state::voxels::block::block_type::BlockType;

    #[test]
    fn test_chunk_position_of_positive_and_negative() {
        assert_eq!(chunk_position_of(Point3::new(0.0, 3.0, 0.0), 16), Point2::new(0, 0));
        assert_eq!(chunk_position_of(Point3::new(15.9, 3.0, 16.0), 16), Point2::new(0, 1));
        assert_eq!(chunk_position_of(Point3::new(-0.1, 3.0, -16.0), 16), Point2::new(-1, -1));
        assert_eq!(chunk_position_of(Point3::new(-16.1, 3.0, 40.0), 16), Point2::new(-2, 2));
    }

    #[test]
    fn test_world_to_chunk_coords_negative() {
        let (chunk, local) = world_to_chunk_coords(Point3::new(-1.5, 4.2, -17.0), 16);
        assert_eq!(chunk, Point2::new(-1, -2));
        assert_eq!(local, Point3::new(14, 4, 15));
    }

    #[test]
    fn test_world_to_chunk_coords_on_boundary() {
        let (chunk, local) = world_to_chunk_coords(Point3::new(32.0, 0.0, 16.0), 16);
        assert_eq!(chunk, Point2::new(2, 1));
        assert_eq!(local, Point3::new(0, 0, 0));
    }

    #[test]
    fn test_world_to_chunk_coords_just_below_boundary() {
        for (x, z) in [(-1e-7, 5.0), (-16.000001, -1e-6), (31.99999, -32.00001)] {
            let (chunk, local) = world_to_chunk_coords(Point3::new(x, 3.0, z), 16);
            assert!((0..16).contains(&local.x) && (0..16).contains(&local.z), "{local:?}");
            assert_eq!(chunk, chunk_position_of(Point3::new(x, 3.0, z), 16));
        }

        let (chunk, local) = world_to_chunk_coords(Point3::new(-1e-7, 3.0, 5.0), 16);
        assert_eq!(chunk, Point2::new(-1, 0));
        assert_eq!(local, Point3::new(15, 3, 5));
    }

    #[test]
    fn test_chunk_key_format() {
        assert_eq!(chunk_key(Point2::new(-3, 7)), "-3_7");
    }

    #[test]
    fn test_chunk_origin() {
        assert_eq!(chunk_origin(Point2::new(-2, 3), 16), Point3::new(-32, 0, 48));
    }

    #[test]
    fn test_set_block_marks_mesh_stale() {
        let mut chunk = Chunk::new(Point2::new(0, 0), VoxelGrid::new(4));
        chunk.mark_meshed();
        assert!(!chunk.is_mesh_stale());

        chunk.set_block(1, 1, 1, BlockType::STONE.code()).unwrap();
        assert!(chunk.is_mesh_stale());
        assert_eq!(chunk.get_block(1, 1, 1), BlockType::STONE.code());
    }

    #[test]
    fn test_rejected_set_block_keeps_mesh_current() {
        let mut chunk = Chunk::new(Point2::new(0, 0), VoxelGrid::new(4));
        chunk.mark_meshed();
        assert!(chunk.set_block(0, 9, 0, BlockType::STONE.code()).is_err());
        assert!(!chunk.is_mesh_stale());
    }
}
