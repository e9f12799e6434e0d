//! Mesh data structures and operations for voxel rendering.
//!
//! A `SurfaceMesh` is the plain geometry of one chunk: positions, triangle indices
//! and texture coordinates, in the layout a render backend uploads directly. It is
//! rebuilt from scratch whenever its chunk changes and never patched in place.

use cgmath::{InnerSpace, Vector3};
use thiserror::Error;

use super::face::Face;
use crate::world_state::rendering::{atlas, Vertex};

/// Number of vertices emitted per face.
pub const VERTICES_PER_FACE: usize = 4;

/// Number of triangle indices emitted per face.
pub const INDICES_PER_FACE: usize = 6;

/// A broken mesh invariant, reported by `SurfaceMesh::validate`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    /// The index list does not split into whole triangles.
    #[error("triangle index count {0} is not a multiple of 3")]
    PartialTriangle(usize),

    /// A triangle refers to a vertex that does not exist.
    #[error("triangle index {index} out of bounds for {vertices} vertices")]
    IndexOutOfBounds {
        /// The offending index.
        index: u32,
        /// Number of vertices in the mesh.
        vertices: usize,
    },

    /// Vertices and texture coordinates are not paired one to one.
    #[error("{uvs} texture coordinates for {vertices} vertices")]
    UvCountMismatch {
        /// Number of texture coordinates.
        uvs: usize,
        /// Number of vertices.
        vertices: usize,
    },
}

/// The surface geometry of a single chunk.
///
/// Vertex positions are relative to the chunk origin. Triangles are a flat list of
/// indices into `vertices`, three per triangle. `uvs` holds one texture coordinate
/// per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    /// Vertex positions in chunk space
    pub vertices: Vec<[f32; 3]>,
    /// Triangle indices, three per triangle
    pub triangles: Vec<u32>,
    /// Texture coordinates, one per vertex
    pub uvs: Vec<[f32; 2]>,
}

impl SurfaceMesh {
    /// Creates a new, empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one quad face.
    ///
    /// The face's corners become four new vertices, paired in order with the
    /// atlas coordinates of its block type, and two triangles are appended using
    /// the indices from `generate_face_indices`.
    pub fn add_face(&mut self, face: &Face) {
        let num_faces_generated = self.face_count() as u32;
        self.vertices.extend_from_slice(&face.positions());
        self.uvs.extend_from_slice(&atlas::uvs_for(face.block_type));
        self.triangles
            .extend_from_slice(&Self::generate_face_indices(num_faces_generated));
    }

    /// Generates index data for a face, adjusted by the number of previously generated faces.
    ///
    /// # Arguments
    /// * `num_faces_generated` - The number of faces that have been generated so far
    ///
    /// # Returns
    /// Six indices forming the triangles `0-1-2` and `0-2-3` of the face's quad.
    pub fn generate_face_indices(num_faces_generated: u32) -> [u32; INDICES_PER_FACE] {
        let base = num_faces_generated * VERTICES_PER_FACE as u32;
        [base, base + 1, base + 2, base, base + 2, base + 3]
    }

    /// Number of quad faces in the mesh.
    pub fn face_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_FACE
    }

    /// Whether the mesh has no geometry at all.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Checks the structural invariants a render backend relies on.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.triangles.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle(self.triangles.len()));
        }
        if let Some(&index) = self
            .triangles
            .iter()
            .find(|&&index| index as usize >= self.vertices.len())
        {
            return Err(MeshError::IndexOutOfBounds {
                index,
                vertices: self.vertices.len(),
            });
        }
        if self.uvs.len() != self.vertices.len() {
            return Err(MeshError::UvCountMismatch {
                uvs: self.uvs.len(),
                vertices: self.vertices.len(),
            });
        }
        Ok(())
    }

    /// Flat per-vertex normals recomputed from triangle winding.
    ///
    /// Each vertex takes the normal of the last triangle that references it. Faces
    /// never share vertices, so this is the normal of the vertex's own quad.
    pub fn normals(&self) -> Vec<[f32; 3]> {
        let mut normals = vec![[0.0; 3]; self.vertices.len()];
        for triangle in self.triangles.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let (Some(&v0), Some(&v1), Some(&v2)) =
                (self.vertices.get(a), self.vertices.get(b), self.vertices.get(c))
            else {
                continue;
            };
            let (v0, v1, v2) = (Vector3::from(v0), Vector3::from(v1), Vector3::from(v2));
            let cross = (v1 - v0).cross(v2 - v0);
            if cross.magnitude2() == 0.0 {
                continue;
            }
            let normal: [f32; 3] = cross.normalize().into();
            for index in [a, b, c] {
                normals[index] = normal;
            }
        }
        normals
    }

    /// Interleaves positions, normals and texture coordinates into upload-ready vertices.
    pub fn interleaved(&self) -> Vec<Vertex> {
        self.vertices
            .iter()
            .zip(self.normals())
            .zip(self.uvs.iter())
            .map(|((&position, normal), &tex_coords)| Vertex::new(position, normal, tex_coords))
            .collect()
    }

    /// The interleaved vertex buffer as raw bytes.
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.interleaved()).to_vec()
    }

    /// The triangle index buffer as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world_state::voxels::block::block_side::BlockSide;

    #[test]
    fn test_face_indices_offset_by_faces_generated() {
        assert_eq!(SurfaceMesh::generate_face_indices(0), [0, 1, 2, 0, 2, 3]);
        assert_eq!(SurfaceMesh::generate_face_indices(2), [8, 9, 10, 8, 10, 11]);
    }

    #[test]
    fn test_add_face_keeps_invariants() {
        let mut mesh = SurfaceMesh::new();
        mesh.add_face(&Face::new(0, 0, 0, 1, BlockSide::TOP));
        mesh.add_face(&Face::new(0, 0, 0, 2, BlockSide::BOTTOM));
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.triangles.len(), 12);
        assert_eq!(mesh.validate(), Ok(()));
    }

    #[test]
    fn test_validate_reports_broken_meshes() {
        let mut mesh = SurfaceMesh::new();
        mesh.add_face(&Face::new(0, 0, 0, 1, BlockSide::TOP));

        let mut partial = mesh.clone();
        partial.triangles.pop();
        assert_eq!(partial.validate(), Err(MeshError::PartialTriangle(5)));

        let mut out_of_bounds = mesh.clone();
        out_of_bounds.triangles[4] = 4;
        assert_eq!(
            out_of_bounds.validate(),
            Err(MeshError::IndexOutOfBounds { index: 4, vertices: 4 })
        );

        let mut missing_uv = mesh;
        missing_uv.uvs.pop();
        assert_eq!(
            missing_uv.validate(),
            Err(MeshError::UvCountMismatch { uvs: 3, vertices: 4 })
        );
    }

    #[test]
    fn test_normals_follow_face_side() {
        let mut mesh = SurfaceMesh::new();
        for side in BlockSide::all() {
            mesh.add_face(&Face::new(0, 0, 0, 1, side));
        }
        let normals = mesh.normals();
        for (face_index, side) in BlockSide::all().into_iter().enumerate() {
            for corner in 0..VERTICES_PER_FACE {
                assert_eq!(normals[face_index * VERTICES_PER_FACE + corner], side.normal());
            }
        }
    }

    #[test]
    fn test_vertex_bytes_cover_every_vertex() {
        let mut mesh = SurfaceMesh::new();
        mesh.add_face(&Face::new(1, 2, 3, 3, BlockSide::RIGHT));
        let bytes = mesh.vertex_bytes();
        assert_eq!(bytes.len(), 4 * std::mem::size_of::<Vertex>());
        assert_eq!(mesh.index_bytes().len(), 6 * 4);

        let first: Vertex = bytemuck::pod_read_unaligned(&bytes[..std::mem::size_of::<Vertex>()]);
        assert_eq!(first.position, [1.0, 2.0, 4.0]);
        assert_eq!(first.normal, [0.0, 0.0, 1.0]);
    }
}
