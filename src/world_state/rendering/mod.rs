//! Rendering hand-off for the voxel world.
//!
//! The world produces geometry; drawing it belongs to whatever backend the host
//! application uses. This module holds the pieces between the two: the mesher,
//! the texture atlas lookup, the upload vertex format and the `RenderSink` trait
//! through which finished meshes leave the world.

use std::collections::HashMap;

use crate::core::MtResource;
use crate::world_state::voxels::chunk::ChunkPosition;

pub mod atlas;
pub mod meshing;
mod vertex;

// Re-export commonly used types
pub use meshing::{MeshError, SurfaceMesh};
pub use vertex::Vertex;

/// Receives chunk meshes from the world.
///
/// `publish_mesh` is called exactly once per successful (re)synthesis of a chunk
/// and always on the thread that owns the `WorldStreamer`. A newer mesh for the
/// same position replaces the older one.
pub trait RenderSink {
    /// Installs or replaces the mesh for a chunk.
    fn publish_mesh(&mut self, position: ChunkPosition, mesh: SurfaceMesh);

    /// Drops the mesh for a chunk that left the world.
    fn remove_mesh(&mut self, position: ChunkPosition);
}

/// A render event, in the order the sink received it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEvent {
    /// `publish_mesh` was called for the chunk.
    Published(ChunkPosition),
    /// `remove_mesh` was called for the chunk.
    Removed(ChunkPosition),
}

#[derive(Default)]
struct Recording {
    meshes: HashMap<ChunkPosition, SurfaceMesh>,
    events: Vec<RenderEvent>,
}

/// A `RenderSink` that keeps the latest mesh per chunk and a log of every call.
///
/// Clones share the same recording, so a caller can keep one handle while the
/// streamer owns another.
#[derive(Clone, Default)]
pub struct RecordingRenderSink {
    recording: MtResource<Recording>,
}

impl RecordingRenderSink {
    /// Creates a sink with an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current mesh for a chunk, if one is installed.
    pub fn mesh(&self, position: ChunkPosition) -> Option<SurfaceMesh> {
        self.recording.get().meshes.get(&position).cloned()
    }

    /// Positions that currently have a mesh installed.
    pub fn positions(&self) -> Vec<ChunkPosition> {
        self.recording.get().meshes.keys().copied().collect()
    }

    /// Number of installed meshes.
    pub fn len(&self) -> usize {
        self.recording.get().meshes.len()
    }

    /// Whether no mesh is installed.
    pub fn is_empty(&self) -> bool {
        self.recording.get().meshes.is_empty()
    }

    /// Every call received so far.
    pub fn events(&self) -> Vec<RenderEvent> {
        self.recording.get().events.clone()
    }

    /// Number of `publish_mesh` calls received for a chunk.
    pub fn publish_count(&self, position: ChunkPosition) -> usize {
        self.recording
            .get()
            .events
            .iter()
            .filter(|&&event| event == RenderEvent::Published(position))
            .count()
    }
}

impl RenderSink for RecordingRenderSink {
    fn publish_mesh(&mut self, position: ChunkPosition, mesh: SurfaceMesh) {
        let mut recording = self.recording.get_mut();
        recording.meshes.insert(position, mesh);
        recording.events.push(RenderEvent::Published(position));
    }

    fn remove_mesh(&mut self, position: ChunkPosition) {
        let mut recording = self.recording.get_mut();
        recording.meshes.remove(&position);
        recording.events.push(RenderEvent::Removed(position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point2;

    #[test]
    fn test_recording_sink_shares_state_between_clones() {
        let observer = RecordingRenderSink::new();
        let mut sink = observer.clone();
        let position = Point2::new(1, -1);

        sink.publish_mesh(position, SurfaceMesh::new());
        sink.publish_mesh(position, SurfaceMesh::new());
        assert_eq!(observer.len(), 1);
        assert_eq!(observer.publish_count(position), 2);

        sink.remove_mesh(position);
        assert!(observer.is_empty());
        assert_eq!(
            observer.events(),
            vec![
                RenderEvent::Published(position),
                RenderEvent::Published(position),
                RenderEvent::Removed(position),
            ]
        );
    }
}
