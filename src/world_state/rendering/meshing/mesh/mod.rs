//! Mesh data structures for voxel rendering.
//!
//! # Architecture
//! - [`SurfaceMesh`]: positions, triangle indices and texture coordinates of one chunk
//! - [`Face`]: a single exposed face of a voxel with its corners and block type

mod face;
mod mesh;

pub use face::Face;
pub use mesh::*;
