//! # Block Module
//!
//! Block codes and block faces. A voxel cell stores a single `BlockTypeSize`
//! code; code 0 is reserved for air and is never rendered.

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory and on disk.
pub type BlockTypeSize = u8;

/// The code every empty (air) cell holds, and the value out-of-range reads return.
pub const EMPTY_BLOCK: BlockTypeSize = 0;

/// Whether a block code occupies space (anything but air).
#[inline]
pub fn is_solid(block: BlockTypeSize) -> bool {
    block != EMPTY_BLOCK
}
