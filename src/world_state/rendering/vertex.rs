//! Vertex data structures for voxel rendering.
//!
//! This module defines the interleaved vertex format a render backend uploads for
//! chunk meshes.

/// A vertex of a chunk mesh.
///
/// Represents a single corner of a face with its position, flat normal and atlas
/// coordinates. The layout is plain `f32` data so a whole mesh can be handed to a
/// GPU buffer as bytes.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes)
/// - Normal: [f32; 3] (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
///
/// Total size: 32 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in chunk space
    pub position: [f32; 3],
    /// Outward unit normal of the owning face
    pub normal: [f32; 3],
    /// UV texture coordinates within the atlas (normalized 0.0-1.0)
    pub tex_coords: [f32; 2],
}

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `position` - The position of the vertex in chunk space
    /// * `normal` - The normal of the face the vertex belongs to
    /// * `tex_coords` - Atlas coordinates of the vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Vertex {
            position,
            normal,
            tex_coords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }
}
