//! # Block Type Module
//!
//! Names for the block codes the core itself produces or maps to textures.
//! Grids store raw codes, so a grid may hold codes without a name here; only
//! the strict conversion below rejects them.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::error::VoxelError;

use super::BlockTypeSize;

/// Enumerates the named block types.
///
/// The discriminants are the on-disk codes, so the order must never change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum BlockType {
    /// Empty space. Never rendered and never occupies a face.
    AIR = 0,

    /// Bedrock-like filler below the surface layer.
    STONE = 1,

    /// The soil layer laid on top of stone by terrain generation.
    DIRT = 2,

    /// A grass-topped block placed by edits.
    GRASS = 3,
}

impl BlockType {
    /// Converts a stored code into a named block type.
    ///
    /// # Errors
    /// `VoxelError::UnknownBlockType` if the code has no name.
    pub fn try_from_code(code: BlockTypeSize) -> Result<Self, VoxelError> {
        <BlockType as FromPrimitive>::from_u8(code).ok_or(VoxelError::UnknownBlockType(code))
    }

    /// The code stored in a grid for this block type.
    pub fn code(self) -> BlockTypeSize {
        self as BlockTypeSize
    }
}

impl From<BlockType> for BlockTypeSize {
    fn from(block_type: BlockType) -> Self {
        block_type.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_names() {
        for block_type in [BlockType::AIR, BlockType::STONE, BlockType::DIRT, BlockType::GRASS] {
            assert_eq!(BlockType::try_from_code(block_type.code()).unwrap(), block_type);
        }
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        assert!(matches!(
            BlockType::try_from_code(200),
            Err(VoxelError::UnknownBlockType(200))
        ));
    }
}
