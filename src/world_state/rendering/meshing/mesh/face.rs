use cgmath::Point3;

use crate::world_state::voxels::block::{block_side::BlockSide, BlockTypeSize};

/// Represents a single quad face of a voxel in the mesh.
///
/// A face is defined by four corner points, listed in the order the texture atlas
/// pairs them with (bottom-left, top-left, top-right, bottom-right as seen from
/// outside the cell). Connecting them `0-1-2`, `0-2-3` winds both triangles so
/// their normal points away from the cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// The four corners of the face in chunk coordinates
    pub corners: [Point3<i32>; 4],
    /// The block type code, used for texture mapping
    pub block_type: BlockTypeSize,
    /// Which side of the block this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates a new face for a voxel at the given coordinates.
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - The coordinates of the voxel in chunk space
    /// * `block_type` - The type of the block, used for texture mapping
    /// * `block_side` - Which side of the block this face represents
    ///
    /// # Returns
    /// A new `Face` with its corners laid out for the given side.
    pub fn new(x: i32, y: i32, z: i32, block_type: BlockTypeSize, block_side: BlockSide) -> Self {
        let corners = match block_side {
            BlockSide::FRONT => [
                Point3::new(x, y, z + 1),
                Point3::new(x, y + 1, z + 1),
                Point3::new(x, y + 1, z),
                Point3::new(x, y, z),
            ],

            BlockSide::BACK => [
                Point3::new(x + 1, y, z),
                Point3::new(x + 1, y + 1, z),
                Point3::new(x + 1, y + 1, z + 1),
                Point3::new(x + 1, y, z + 1),
            ],

            BlockSide::BOTTOM => [
                Point3::new(x, y, z),
                Point3::new(x + 1, y, z),
                Point3::new(x + 1, y, z + 1),
                Point3::new(x, y, z + 1),
            ],

            BlockSide::TOP => [
                Point3::new(x, y + 1, z),
                Point3::new(x, y + 1, z + 1),
                Point3::new(x + 1, y + 1, z + 1),
                Point3::new(x + 1, y + 1, z),
            ],

            BlockSide::LEFT => [
                Point3::new(x + 1, y, z),
                Point3::new(x, y, z),
                Point3::new(x, y + 1, z),
                Point3::new(x + 1, y + 1, z),
            ],

            BlockSide::RIGHT => [
                Point3::new(x, y, z + 1),
                Point3::new(x + 1, y, z + 1),
                Point3::new(x + 1, y + 1, z + 1),
                Point3::new(x, y + 1, z + 1),
            ],
        };

        Face {
            corners,
            block_type,
            block_side,
        }
    }

    /// Corner positions as vertex data.
    pub fn positions(&self) -> [[f32; 3]; 4] {
        self.corners
            .map(|corner| [corner.x as f32, corner.y as f32, corner.z as f32])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn winding_normal(face: &Face) -> Vector3<f32> {
        let [v0, v1, v2, _] = face.positions().map(Vector3::from);
        (v1 - v0).cross(v2 - v0).normalize()
    }

    #[test]
    fn test_every_side_winds_outward() {
        for side in BlockSide::all() {
            let face = Face::new(2, 3, 4, 1, side);
            assert_eq!(winding_normal(&face), Vector3::from(side.normal()), "{side:?}");
        }
    }

    #[test]
    fn test_corners_lie_on_the_side_plane() {
        for side in BlockSide::all() {
            let face = Face::new(0, 0, 0, 1, side);
            let offset = side.neighbor_offset();
            for corner in face.corners {
                // A face on the positive side of an axis sits at 1, on the negative side at 0.
                if offset.x != 0 {
                    assert_eq!(corner.x, offset.x.max(0));
                }
                if offset.y != 0 {
                    assert_eq!(corner.y, offset.y.max(0));
                }
                if offset.z != 0 {
                    assert_eq!(corner.z, offset.z.max(0));
                }
            }
        }
    }
}
