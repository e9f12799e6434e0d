//! # Chunk Eviction Task
//!
//! This module defines the `ChunkEvictionTask`, which writes a chunk that left the
//! active set to storage. The chunk itself stays in the registry as Saving until
//! the write is confirmed.

use std::sync::Arc;

use log::{debug, error};
use web_time::{Duration, Instant};

use crate::error::VoxelError;
use crate::world_state::task_management::task::{Task, TaskResult};
use crate::world_state::voxels::chunk::{chunk_key, ChunkPosition, VoxelGrid};
use crate::world_state::voxels::storage::ChunkStore;
use crate::world_state::StreamingContext;

/// A task that persists a snapshot of one chunk's grid.
pub struct ChunkEvictionTask {
    position: ChunkPosition,
    snapshot: VoxelGrid,
    store: Arc<dyn ChunkStore>,
}

impl ChunkEvictionTask {
    /// Creates a new chunk eviction task.
    ///
    /// # Arguments
    /// * `position` - The chunk being evicted; its slot must already be Saving
    /// * `snapshot` - A copy of the chunk's grid taken when saving began
    /// * `store` - Where to write the snapshot
    pub fn new(position: ChunkPosition, snapshot: VoxelGrid, store: Arc<dyn ChunkStore>) -> Self {
        ChunkEvictionTask {
            position,
            snapshot,
            store,
        }
    }
}

impl Task for ChunkEvictionTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let start = Instant::now();
        let outcome = self.store.save(self.position, &self.snapshot);
        Box::new(ChunkEvictionTaskResult {
            position: self.position,
            outcome,
            elapsed: start.elapsed(),
        })
    }

    fn abandon(&self, reason: String) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkEvictionTaskResult {
            position: self.position,
            outcome: Err(VoxelError::TaskPanicked {
                key: chunk_key(self.position),
                reason,
            }),
            elapsed: Duration::ZERO,
        })
    }
}

/// The result of a chunk eviction task.
pub struct ChunkEvictionTaskResult {
    position: ChunkPosition,
    outcome: Result<(), VoxelError>,
    elapsed: Duration,
}

impl TaskResult for ChunkEvictionTaskResult {
    /// Completes the eviction on the foreground.
    ///
    /// - Saved and still unwanted: the chunk is removed and its mesh dropped.
    /// - Saved but wanted again: the chunk goes back to Active; the stored copy is current.
    /// - Save failed: the chunk goes back to Active so its data is not lost. The next
    ///   tick tries again if it is still unwanted.
    fn handle_result(self: Box<Self>, context: &mut StreamingContext) -> Vec<Box<dyn Task + Send>> {
        let position = self.position;
        let key = chunk_key(position);

        if let Err(e) = self.outcome {
            error!("Failed to save chunk {}; keeping it in memory: {}", key, e);
            context.world_mut().revert_saving(position);
            return Vec::new();
        }

        if context.is_desired(position) {
            context.world_mut().revert_saving(position);
            debug!("Saved chunk {} in {:?}; it is wanted again", key, self.elapsed);
        } else if context.world_mut().finish_saving(position).is_some() {
            context.render_sink().remove_mesh(position);
            debug!("Saved and unloaded chunk {} in {:?}", key, self.elapsed);
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;
    use crate::world_state::rendering::{RecordingRenderSink, RenderEvent};
    use crate::world_state::voxels::block::block_type::BlockType;
    use crate::world_state::voxels::chunk::Chunk;
    use crate::world_state::voxels::storage::MemoryChunkStore;
    use crate::world_state::voxels::terrain::TerrainGenerator;
    use crate::world_state::voxels::world::ChunkState;
    use cgmath::Point2;

    /// A context holding one Active chunk with a single stone block.
    fn context_with_active(
        store: MemoryChunkStore,
        sink: RecordingRenderSink,
        position: ChunkPosition,
    ) -> StreamingContext {
        let mut context = StreamingContext::new(
            Arc::new(TerrainGenerator::new(TerrainConfig::default(), 5, 16)),
            Arc::new(store),
            Box::new(sink),
        );
        let mut grid = VoxelGrid::new(16);
        grid.set(1, 2, 3, BlockType::STONE.code()).unwrap();
        assert!(context.world_mut().claim(position));
        assert!(context.world_mut().activate(Chunk::new(position, grid)));
        context
    }

    #[test]
    fn test_saving_chunk_wanted_again_returns_to_active_without_reproduction() {
        let store = MemoryChunkStore::new(16);
        let sink = RecordingRenderSink::new();
        let position = Point2::new(4, 4);
        let mut context = context_with_active(store.clone(), sink.clone(), position);

        context.set_desired(Vec::<ChunkPosition>::new());
        let task = context.start_eviction(position).unwrap();
        assert_eq!(context.world().state(position), Some(ChunkState::Saving));

        context.set_desired([position]);
        assert!(context.start_production(position).is_none());

        assert!(task.process().handle_result(&mut context).is_empty());
        assert_eq!(context.world().state(position), Some(ChunkState::Active));
        assert_eq!(
            context.world().chunk(position).unwrap().get_block(1, 2, 3),
            BlockType::STONE.code()
        );
        assert!(store.contains(position).unwrap());
        assert_eq!(sink.publish_count(position), 0);
        assert!(!sink.events().contains(&RenderEvent::Removed(position)));
    }

    #[test]
    fn test_saved_unwanted_chunk_is_removed() {
        let store = MemoryChunkStore::new(16);
        let sink = RecordingRenderSink::new();
        let position = Point2::new(-1, 0);
        let mut context = context_with_active(store.clone(), sink.clone(), position);

        let task = context.start_eviction(position).unwrap();
        task.process().handle_result(&mut context);

        assert_eq!(context.world().state(position), None);
        assert_eq!(sink.events(), vec![RenderEvent::Removed(position)]);
        let saved = store.load(position).unwrap().unwrap();
        assert_eq!(saved.get(1, 2, 3), BlockType::STONE.code());
    }

    #[test]
    fn test_abandoned_save_keeps_the_chunk() {
        let store = MemoryChunkStore::new(16);
        let sink = RecordingRenderSink::new();
        let position = Point2::new(0, 7);
        let mut context = context_with_active(store.clone(), sink.clone(), position);

        let task = context.start_eviction(position).unwrap();
        task.abandon("disk vanished".to_string())
            .handle_result(&mut context);

        assert_eq!(context.world().state(position), Some(ChunkState::Active));
        assert!(store.is_empty());
        assert!(sink.events().is_empty());
    }
}
