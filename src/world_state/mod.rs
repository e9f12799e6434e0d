//! # World State Module
//!
//! The streaming core of the voxel world.
//!
//! ## Key Components
//!
//! * `WorldStreamer` - Keeps the chunks around an observer in memory
//! * `StreamingContext` - The foreground state task results are applied to
//! * `rendering` - Meshing, texture atlas lookup and the render hand-off
//! * `task_management` - Worker threads for chunk production and eviction
//! * `voxels` - Voxel data, terrain generation, storage and the chunk registry
//!
//! ## Streaming
//!
//! The streamer only does work when the observer crosses into another chunk. It then
//! computes the set of chunk coordinates within `render_radius`, claims and produces
//! the missing ones nearest-first, and evicts active chunks that fell out of range.
//! All registry changes happen on the thread that owns the streamer; workers only
//! ever see the inputs of their own task.

use std::collections::HashSet;
use std::sync::Arc;

use cgmath::{Point2, Point3};
use log::{error, info, warn};
use web_time::Instant;

use crate::config::{ConfigError, WorldConfig};
use crate::error::VoxelError;
use rendering::{meshing, RenderSink};
use task_management::{task::Task, TaskManager};
use voxels::block::{BlockTypeSize, EMPTY_BLOCK};
use voxels::chunk::{chunk_distance, chunk_key, chunk_position_of, world_to_chunk_coords, ChunkPosition};
use voxels::storage::ChunkStore;
use voxels::tasks::{ChunkEvictionTask, ChunkProductionTask};
use voxels::terrain::TerrainGenerator;
use voxels::world::{ChunkState, World, WorldStats};

pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Foreground streaming state.
///
/// Owns the chunk registry, the current desired set and the render sink, plus
/// handles to the generator and store that new tasks are built from. Task results
/// receive it in `TaskResult::handle_result`.
pub struct StreamingContext {
    world: World,
    desired: HashSet<ChunkPosition>,
    render_sink: Box<dyn RenderSink>,
    generator: Arc<TerrainGenerator>,
    store: Arc<dyn ChunkStore>,
}

impl StreamingContext {
    /// Creates a context with an empty registry and an empty desired set.
    pub fn new(
        generator: Arc<TerrainGenerator>,
        store: Arc<dyn ChunkStore>,
        render_sink: Box<dyn RenderSink>,
    ) -> Self {
        StreamingContext {
            world: World::new(),
            desired: HashSet::new(),
            render_sink,
            generator,
            store,
        }
    }

    /// The chunk registry.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the chunk registry.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Replaces the active set that task results are judged against.
    pub(crate) fn set_desired<I: IntoIterator<Item = ChunkPosition>>(&mut self, positions: I) {
        self.desired = positions.into_iter().collect();
    }

    /// Whether a coordinate is in the active set of the latest tick.
    pub fn is_desired(&self, position: ChunkPosition) -> bool {
        self.desired.contains(&position)
    }

    /// Where produced meshes go.
    pub fn render_sink(&mut self) -> &mut dyn RenderSink {
        self.render_sink.as_mut()
    }

    /// Claims an absent coordinate and builds the task that produces it.
    ///
    /// Returns `None` if the coordinate is already in the registry in any state.
    pub fn start_production(&mut self, position: ChunkPosition) -> Option<Box<dyn Task + Send>> {
        if !self.world.claim(position) {
            return None;
        }
        Some(Box::new(ChunkProductionTask::new(
            position,
            self.generator.clone(),
            self.store.clone(),
        )))
    }

    /// Moves an Active chunk to Saving and builds the task that persists it.
    ///
    /// Returns `None` unless the chunk is Active.
    pub fn start_eviction(&mut self, position: ChunkPosition) -> Option<Box<dyn Task + Send>> {
        let snapshot = self.world.begin_saving(position)?;
        Some(Box::new(ChunkEvictionTask::new(
            position,
            snapshot,
            self.store.clone(),
        )))
    }
}

/// Registry and task-queue counts, for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamerStats {
    /// Registry slot counts.
    pub world: WorldStats,
    /// Tasks waiting for a free worker.
    pub queued_tasks: usize,
    /// Tasks running on workers.
    pub tasks_in_flight: usize,
}

/// Streams chunks in and out of memory around a moving observer.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cgmath::Point3;
/// use voxel_world::config::WorldConfig;
/// use voxel_world::world_state::WorldStreamer;
/// use voxel_world::world_state::rendering::RecordingRenderSink;
/// use voxel_world::world_state::voxels::storage::MemoryChunkStore;
///
/// let config = WorldConfig {
///     render_radius: 1,
///     ..WorldConfig::default()
/// };
/// let store = Arc::new(MemoryChunkStore::new(config.chunk_size));
/// let sink = RecordingRenderSink::new();
/// let mut streamer = WorldStreamer::new(config, store, Box::new(sink.clone())).unwrap();
///
/// streamer.update_observer(Point3::new(8.0, 10.0, 8.0));
/// streamer.wait_until_idle();
/// assert_eq!(streamer.active_positions().len(), 5);
/// assert_eq!(sink.len(), 5);
/// ```
pub struct WorldStreamer {
    config: WorldConfig,
    context: StreamingContext,
    task_manager: TaskManager,
    observer_chunk: Option<ChunkPosition>,
}

impl WorldStreamer {
    /// Creates a streamer with an empty registry.
    ///
    /// # Arguments
    /// * `config` - World parameters; validated here and fixed for the streamer's lifetime
    /// * `store` - Where chunks are loaded from and saved to
    /// * `render_sink` - Receives every mesh the streamer produces
    ///
    /// # Errors
    /// `ConfigError::Invalid` if the configuration fails validation.
    pub fn new(
        config: WorldConfig,
        store: Arc<dyn ChunkStore>,
        render_sink: Box<dyn RenderSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let generator = Arc::new(TerrainGenerator::new(
            config.terrain.clone(),
            config.world_seed,
            config.chunk_size,
        ));
        let task_manager = TaskManager::new(config.resolved_worker_threads());

        info!(
            "World streamer ready: chunk size {}, render radius {}, seed {}",
            config.chunk_size, config.render_radius, config.world_seed
        );

        Ok(WorldStreamer {
            context: StreamingContext::new(generator, store, render_sink),
            config,
            task_manager,
            observer_chunk: None,
        })
    }

    /// The validated configuration the streamer was started with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The chunk registry.
    pub fn world(&self) -> &World {
        self.context.world()
    }

    /// Chunk the observer was in at the latest tick.
    pub fn observer_chunk(&self) -> Option<ChunkPosition> {
        self.observer_chunk
    }

    /// Coordinates within `radius` of `center`, nearest first.
    ///
    /// Distance is Euclidean in chunk units; ties are broken by coordinate so the
    /// order is stable.
    pub fn desired_positions(center: ChunkPosition, radius: i32) -> Vec<ChunkPosition> {
        let radius_squared = radius as i64 * radius as i64;
        let mut positions = Vec::new();
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                if (dx as i64 * dx as i64) + (dz as i64 * dz as i64) <= radius_squared {
                    positions.push(Point2::new(center.x + dx, center.y + dz));
                }
            }
        }
        positions.sort_by(|a, b| {
            chunk_distance(*a, center)
                .total_cmp(&chunk_distance(*b, center))
                .then_with(|| (a.x, a.y).cmp(&(b.x, b.y)))
        });
        positions
    }

    /// Reports the observer's position.
    ///
    /// Runs a streaming tick on the first call and whenever the observer's chunk
    /// changes; otherwise does nothing. Results of the work a tick starts are applied
    /// by `process_tasks`.
    ///
    /// # Returns
    /// Whether a tick ran.
    pub fn update_observer(&mut self, world_position: Point3<f32>) -> bool {
        let observer_chunk = chunk_position_of(world_position, self.config.chunk_size);
        if self.observer_chunk == Some(observer_chunk) {
            return false;
        }
        self.observer_chunk = Some(observer_chunk);
        self.tick(observer_chunk);
        true
    }

    fn tick(&mut self, center: ChunkPosition) {
        let start = Instant::now();
        let desired = Self::desired_positions(center, self.config.render_radius);
        self.context.set_desired(desired.iter().copied());

        let mut produced = 0;
        for &position in &desired {
            if let Some(task) = self.context.start_production(position) {
                self.task_manager.publish_task(task);
                produced += 1;
            }
        }

        let unwanted: Vec<(ChunkPosition, ChunkState)> = self
            .context
            .world
            .positions()
            .filter(|position| !self.context.is_desired(*position))
            .filter_map(|position| Some((position, self.context.world.state(position)?)))
            .collect();

        let mut evicted = 0;
        for (position, state) in unwanted {
            match state {
                ChunkState::Active => {
                    if let Some(task) = self.context.start_eviction(position) {
                        self.task_manager.publish_task(task);
                        evicted += 1;
                    }
                }
                ChunkState::Failed => {
                    self.context.world.clear_failed(position);
                }
                // Finish first; their results see the new desired set.
                ChunkState::Producing | ChunkState::Saving => {}
            }
        }

        info!(
            "Observer entered chunk {}: {} desired, {} to produce, {} to evict ({:?})",
            chunk_key(center),
            desired.len(),
            produced,
            evicted,
            start.elapsed()
        );
    }

    /// Applies finished task results and hands queued tasks to free workers.
    ///
    /// Call once per frame.
    pub fn process_tasks(&mut self) {
        self.task_manager
            .process_completed_tasks(&mut self.context);
        self.task_manager.process_queued_tasks();
    }

    /// Blocks until every queued and in-flight task has finished and been applied.
    pub fn wait_until_idle(&mut self) {
        self.task_manager.wait_until_idle(&mut self.context);
    }

    /// Sets the block at a world position.
    ///
    /// The edit is applied only if the containing chunk is Active; otherwise it is
    /// logged and dropped. An applied edit resynthesizes the chunk and publishes the
    /// new mesh before returning.
    ///
    /// # Errors
    /// `VoxelError::OutOfRange` if the position's height is outside the chunk.
    pub fn set_block_world(
        &mut self,
        world_position: Point3<f32>,
        block: BlockTypeSize,
    ) -> Result<(), VoxelError> {
        let (position, local) = world_to_chunk_coords(world_position, self.config.chunk_size);
        let state = self.context.world.state(position);
        if state != Some(ChunkState::Active) {
            warn!(
                "Dropping edit at {:?}: chunk {} is {:?}",
                world_position,
                chunk_key(position),
                state
            );
            return Ok(());
        }
        let Some(chunk) = self.context.world.active_chunk_mut(position) else {
            return Ok(());
        };

        chunk.set_block(local.x, local.y, local.z, block)?;
        let mesh = meshing::synthesize_chunk(chunk);
        self.context.render_sink.publish_mesh(position, mesh);
        Ok(())
    }

    /// Reads the block at a world position; empty if its chunk is not in memory.
    pub fn get_block_world(&self, world_position: Point3<f32>) -> BlockTypeSize {
        let (position, local) = world_to_chunk_coords(world_position, self.config.chunk_size);
        self.context
            .world
            .chunk(position)
            .map_or(EMPTY_BLOCK, |chunk| chunk.get_block(local.x, local.y, local.z))
    }

    /// Lifecycle state of a coordinate; `None` means absent.
    pub fn chunk_state(&self, position: ChunkPosition) -> Option<ChunkState> {
        self.context.world.state(position)
    }

    /// Coordinates whose chunks are Active.
    pub fn active_positions(&self) -> Vec<ChunkPosition> {
        self.context.world.positions_in(ChunkState::Active)
    }

    /// Current registry and task-queue counts.
    pub fn stats(&self) -> StreamerStats {
        StreamerStats {
            world: self.context.world.stats(),
            queued_tasks: self.task_manager.num_queued(),
            tasks_in_flight: self.task_manager.num_in_flight(),
        }
    }

    /// Writes every Active chunk to storage without evicting it.
    ///
    /// Every chunk is attempted even if some fail.
    ///
    /// # Returns
    /// The number of chunks saved, or the first error encountered.
    pub fn save_all(&self) -> Result<usize, VoxelError> {
        let start = Instant::now();
        let mut saved = 0;
        let mut first_error = None;

        for position in self.active_positions() {
            let Some(chunk) = self.context.world.chunk(position) else {
                continue;
            };
            match self.context.store.save(position, chunk.grid()) {
                Ok(()) => saved += 1,
                Err(e) => {
                    error!("Failed to save chunk {}: {}", chunk_key(position), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        info!("Saved {} chunks in {:?}", saved, start.elapsed());
        match first_error {
            Some(e) => Err(e),
            None => Ok(saved),
        }
    }
}
