//! # Meshing Module
//!
//! Converts chunk grids into surface geometry by face culling: every solid cell
//! emits one quad per side whose neighbour is empty. Neighbours outside the chunk
//! read as empty, so chunk borders are always closed and a chunk's mesh never
//! depends on the chunks around it.

use log::debug;
use web_time::Instant;

use crate::world_state::voxels::block::{block_side::BlockSide, is_solid};
use crate::world_state::voxels::chunk::{Chunk, VoxelGrid};

pub mod mesh;

pub use mesh::{Face, MeshError, SurfaceMesh};

/// Builds the surface mesh of a grid.
///
/// Cells are visited in `x`, then `y`, then `z` order and sides in `BlockSide::all()`
/// order, so the same grid always yields the same buffers.
pub fn synthesize(grid: &VoxelGrid) -> SurfaceMesh {
    let size = grid.size() as i32;
    let mut mesh = SurfaceMesh::new();

    for x in 0..size {
        for y in 0..size {
            for z in 0..size {
                let block = grid.get(x, y, z);
                if !is_solid(block) {
                    continue;
                }
                for side in BlockSide::all() {
                    let offset = side.neighbor_offset();
                    if is_solid(grid.get(x + offset.x, y + offset.y, z + offset.z)) {
                        continue;
                    }
                    mesh.add_face(&Face::new(x, y, z, block, side));
                }
            }
        }
    }

    mesh
}

/// Builds a chunk's mesh and marks the chunk as meshed.
pub fn synthesize_chunk(chunk: &mut Chunk) -> SurfaceMesh {
    let start = Instant::now();
    let mesh = synthesize(chunk.grid());
    chunk.mark_meshed();
    debug!(
        "Meshed chunk ({}, {}) into {} faces in {:?}",
        chunk.position.x,
        chunk.position.y,
        mesh.face_count(),
        start.elapsed()
    );
    mesh
}
