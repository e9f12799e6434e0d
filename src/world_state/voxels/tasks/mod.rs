//! # Voxel Task System
//!
//! Background work for streaming chunks in and out of the world. Both tasks own
//! everything they touch, and both apply their results to the registry on the
//! foreground.
//!
//! - `ChunkProductionTask`: load a chunk from storage or generate it, then mesh it
//! - `ChunkEvictionTask`: persist a snapshot of a chunk that left the active set

pub mod chunk_eviction_task;
pub mod chunk_production_task;

pub use chunk_eviction_task::ChunkEvictionTask;
pub use chunk_production_task::ChunkProductionTask;
