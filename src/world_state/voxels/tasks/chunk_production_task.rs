//! # Chunk Production Task
//!
//! This module defines the `ChunkProductionTask`, which materializes a chunk that
//! just entered the active set. A saved blob always wins over terrain generation,
//! so edits survive a round trip through storage.

use std::sync::Arc;

use log::{debug, error, warn};
use web_time::{Duration, Instant};

use crate::error::VoxelError;
use crate::world_state::rendering::meshing::{self, SurfaceMesh};
use crate::world_state::task_management::task::{Task, TaskResult};
use crate::world_state::voxels::chunk::{chunk_key, Chunk, ChunkPosition, VoxelGrid};
use crate::world_state::voxels::storage::ChunkStore;
use crate::world_state::voxels::terrain::TerrainGenerator;
use crate::world_state::StreamingContext;

/// Where a produced grid came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionSource {
    /// Read back from the chunk store.
    Loaded,
    /// Built by the terrain generator.
    Generated,
}

/// A task that produces the grid and mesh for one chunk.
///
/// This task is responsible for:
/// 1. Loading the chunk's grid from the store, or generating it if none was saved
/// 2. Synthesizing the chunk's surface mesh
pub struct ChunkProductionTask {
    position: ChunkPosition,
    generator: Arc<TerrainGenerator>,
    store: Arc<dyn ChunkStore>,
}

impl ChunkProductionTask {
    /// Creates a new chunk production task.
    ///
    /// # Arguments
    /// * `position` - The chunk to produce; the caller must already hold its registry claim
    /// * `generator` - Terrain generator used when nothing is stored
    /// * `store` - Store consulted first
    pub fn new(
        position: ChunkPosition,
        generator: Arc<TerrainGenerator>,
        store: Arc<dyn ChunkStore>,
    ) -> Self {
        ChunkProductionTask {
            position,
            generator,
            store,
        }
    }

    fn produce(&self) -> Result<(VoxelGrid, ProductionSource), VoxelError> {
        match self.store.load(self.position)? {
            Some(grid) => Ok((grid, ProductionSource::Loaded)),
            None => Ok((
                self.generator.generate(self.position),
                ProductionSource::Generated,
            )),
        }
    }
}

impl Task for ChunkProductionTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let start = Instant::now();
        let outcome = self.produce().map(|(grid, source)| {
            let mesh = meshing::synthesize(&grid);
            ProducedChunk { grid, mesh, source }
        });

        Box::new(ChunkProductionTaskResult {
            position: self.position,
            outcome,
            elapsed: start.elapsed(),
        })
    }

    fn abandon(&self, reason: String) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkProductionTaskResult {
            position: self.position,
            outcome: Err(VoxelError::TaskPanicked {
                key: chunk_key(self.position),
                reason,
            }),
            elapsed: Duration::ZERO,
        })
    }
}

/// A grid together with the mesh built from it.
pub struct ProducedChunk {
    /// The chunk's cells.
    pub grid: VoxelGrid,
    /// Surface mesh of `grid`.
    pub mesh: SurfaceMesh,
    /// Where `grid` came from.
    pub source: ProductionSource,
}

/// The result of a chunk production task.
pub struct ChunkProductionTaskResult {
    position: ChunkPosition,
    outcome: Result<ProducedChunk, VoxelError>,
    elapsed: Duration,
}

impl TaskResult for ChunkProductionTaskResult {
    /// Installs the produced chunk in the registry and publishes its mesh.
    ///
    /// A chunk that left the active set while it was being produced is still
    /// activated and published, then handed straight to eviction. A failed
    /// production marks the coordinate Failed while it is still wanted; nothing
    /// is generated in place of a blob that could not be read.
    fn handle_result(self: Box<Self>, context: &mut StreamingContext) -> Vec<Box<dyn Task + Send>> {
        let position = self.position;
        let key = chunk_key(position);

        let produced = match self.outcome {
            Ok(produced) => produced,
            Err(e) => {
                error!("Failed to produce chunk {}: {}", key, e);
                if context.is_desired(position) {
                    context.world_mut().fail(position, e.to_string());
                } else {
                    context.world_mut().release_claim(position);
                }
                return Vec::new();
            }
        };

        let mut chunk = Chunk::new(position, produced.grid);
        chunk.mark_meshed();
        if !context.world_mut().activate(chunk) {
            warn!("Dropping production result for chunk {}: no longer producing", key);
            return Vec::new();
        }
        context.render_sink().publish_mesh(position, produced.mesh);
        debug!(
            "Produced chunk {} ({:?}) in {:?}",
            key, produced.source, self.elapsed
        );

        if context.is_desired(position) {
            return Vec::new();
        }
        context.start_eviction(position).into_iter().collect()
    }
}
