//! # Texture Atlas Module
//!
//! Maps block types onto tiles of a square texture atlas. The atlas is
//! `ATLAS_SIZE × ATLAS_SIZE` equally sized tiles; tile `(0, 0)` is the bottom-left
//! one.

use phf::phf_map;

use crate::world_state::voxels::block::BlockTypeSize;

/// Number of tiles along each edge of the atlas.
pub const ATLAS_SIZE: u8 = 4;

/// Edge length of one tile in normalized texture coordinates.
pub const TILE_SIZE: f32 = 1.0 / ATLAS_SIZE as f32;

/// Maps each block type code to the `(column, row)` of its atlas tile.
///
/// Codes without an entry (air included) have no texture.
static BLOCK_TYPE_TO_TILE: phf::Map<u8, (u8, u8)> = phf_map! {
    1u8 => (0, 0), // STONE
    2u8 => (1, 0), // DIRT
    3u8 => (2, 0), // GRASS
};

/// Atlas tile of a block type, if it has one.
pub fn tile_for(block_type: BlockTypeSize) -> Option<(u8, u8)> {
    BLOCK_TYPE_TO_TILE.get(&block_type).copied()
}

/// Texture coordinates of a block type's tile.
///
/// Corners are returned bottom-left, top-left, top-right, bottom-right. Unknown
/// block types map to the all-zero quad rather than failing.
pub fn uvs_for(block_type: BlockTypeSize) -> [[f32; 2]; 4] {
    let Some((column, row)) = tile_for(block_type) else {
        return [[0.0; 2]; 4];
    };
    let u = column as f32 * TILE_SIZE;
    let v = row as f32 * TILE_SIZE;
    [
        [u, v],
        [u, v + TILE_SIZE],
        [u + TILE_SIZE, v + TILE_SIZE],
        [u + TILE_SIZE, v],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world_state::voxels::block::block_type::BlockType;

    #[test]
    fn test_known_tiles() {
        assert_eq!(tile_for(BlockType::STONE.code()), Some((0, 0)));
        assert_eq!(tile_for(BlockType::DIRT.code()), Some((1, 0)));
        assert_eq!(tile_for(BlockType::GRASS.code()), Some((2, 0)));
    }

    #[test]
    fn test_dirt_quad() {
        assert_eq!(
            uvs_for(BlockType::DIRT.code()),
            [[0.25, 0.0], [0.25, 0.25], [0.5, 0.25], [0.5, 0.0]]
        );
    }

    #[test]
    fn test_unknown_and_air_degrade_to_zero_quad() {
        assert_eq!(uvs_for(0), [[0.0; 2]; 4]);
        assert_eq!(uvs_for(200), [[0.0; 2]; 4]);
    }

    #[test]
    fn test_quads_stay_inside_the_atlas() {
        for code in 0..=u8::MAX {
            for [u, v] in uvs_for(code) {
                assert!((0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v));
            }
        }
    }
}
