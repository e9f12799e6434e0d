//! # Voxel Grid Module
//!
//! Dense storage for the cells of one chunk.
//!
//! ## Layout
//!
//! A grid of edge length `S` stores `S³` block codes in a single vector, addressed
//! by `index(x, y, z) = x + y·S + z·S²`. The same byte sequence is the chunk's
//! persistent representation, so the layout must never change.
//!
//! ## Boundary Convention
//!
//! Reads outside `[0, S)` on any axis return `EMPTY_BLOCK` instead of failing. The
//! mesher depends on this to treat everything beyond the chunk edge as air.
//! Writes outside the cube are rejected with `VoxelError::OutOfRange`.

use crate::error::VoxelError;
use crate::world_state::voxels::block::{is_solid, BlockTypeSize, EMPTY_BLOCK};

/// A cube of block codes for a single chunk.
#[derive(Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    /// Edge length of the cube in cells.
    size: usize,
    /// `size³` block codes in `x + y·S + z·S²` order.
    cells: Vec<BlockTypeSize>,
}

impl VoxelGrid {
    /// Creates a grid of edge length `size` with every cell empty.
    pub fn new(size: usize) -> Self {
        VoxelGrid {
            size,
            cells: vec![EMPTY_BLOCK; size * size * size],
        }
    }

    /// Rebuilds a grid from its raw cell bytes.
    ///
    /// Returns `None` unless `bytes` holds exactly `size³` codes.
    pub fn from_bytes(size: usize, bytes: Vec<BlockTypeSize>) -> Option<Self> {
        if bytes.len() != size * size * size {
            return None;
        }
        Some(VoxelGrid { size, cells: bytes })
    }

    /// The raw cell codes in storage order.
    pub fn as_bytes(&self) -> &[BlockTypeSize] {
        &self.cells
    }

    /// Edge length of the cube.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of cells (`size³`).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether every cell is air.
    pub fn is_all_air(&self) -> bool {
        self.cells.iter().all(|&cell| !is_solid(cell))
    }

    /// Number of non-empty cells.
    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| is_solid(cell)).count()
    }

    /// Linear index of an in-bounds cell, or `None` if any coordinate is outside the cube.
    #[inline]
    pub fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let size = self.size as i32;
        if x < 0 || x >= size || y < 0 || y >= size || z < 0 || z >= size {
            return None;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        Some(x + y * self.size + z * self.size * self.size)
    }

    /// Reads a cell, returning `EMPTY_BLOCK` for coordinates outside the cube.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockTypeSize {
        match self.index(x, y, z) {
            Some(index) => self.cells[index],
            None => EMPTY_BLOCK,
        }
    }

    /// Overwrites a cell.
    ///
    /// # Errors
    /// `VoxelError::OutOfRange` if any coordinate is outside the cube; the grid is
    /// left unchanged.
    pub fn set(&mut self, x: i32, y: i32, z: i32, block: BlockTypeSize) -> Result<(), VoxelError> {
        let index = self.index(x, y, z).ok_or(VoxelError::OutOfRange {
            x,
            y,
            z,
            size: self.size,
        })?;
        self.cells[index] = block;
        Ok(())
    }

    /// Overwrites a cell the caller knows is inside the cube.
    #[inline]
    pub(crate) fn set_in_bounds(&mut self, x: usize, y: usize, z: usize, block: BlockTypeSize) {
        debug_assert!(x < self.size && y < self.size && z < self.size);
        self.cells[x + y * self.size + z * self.size * self.size] = block;
    }

    /// Sets every cell to `block`. `fill(EMPTY_BLOCK)` clears the grid.
    pub fn fill(&mut self, block: BlockTypeSize) {
        self.cells.fill(block);
    }
}

impl std::fmt::Debug for VoxelGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoxelGrid")
            .field("size", &self.size)
            .field("solid_cells", &self.solid_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world_state::voxels::block::block_type::BlockType;

    #[test]
    fn test_new_grid_is_empty_with_cubic_length() {
        let grid = VoxelGrid::new(16);
        assert_eq!(grid.len(), 16 * 16 * 16);
        assert!(grid.is_all_air());
    }

    #[test]
    fn test_index_follows_x_then_y_then_z() {
        let grid = VoxelGrid::new(16);
        assert_eq!(grid.index(0, 0, 0), Some(0));
        assert_eq!(grid.index(1, 0, 0), Some(1));
        assert_eq!(grid.index(0, 1, 0), Some(16));
        assert_eq!(grid.index(0, 0, 1), Some(256));
        assert_eq!(grid.index(15, 15, 15), Some(4095));
    }

    #[test]
    fn test_out_of_range_reads_are_empty() {
        let mut grid = VoxelGrid::new(4);
        grid.fill(BlockType::STONE.code());
        for (x, y, z) in [(-1, 0, 0), (4, 0, 0), (0, -1, 0), (0, 4, 0), (0, 0, -1), (0, 0, 4), (i32::MIN, i32::MAX, 0)] {
            assert_eq!(grid.get(x, y, z), EMPTY_BLOCK);
        }
        assert_eq!(grid.get(3, 3, 3), BlockType::STONE.code());
    }

    #[test]
    fn test_out_of_range_write_is_rejected_and_grid_unchanged() {
        let mut grid = VoxelGrid::new(4);
        let before = grid.clone();
        let result = grid.set(0, 4, 0, BlockType::DIRT.code());
        assert!(matches!(result, Err(VoxelError::OutOfRange { y: 4, size: 4, .. })));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_set_then_get() {
        let mut grid = VoxelGrid::new(8);
        grid.set(1, 2, 3, BlockType::GRASS.code()).unwrap();
        assert_eq!(grid.get(1, 2, 3), BlockType::GRASS.code());
        assert_eq!(grid.as_bytes()[1 + 2 * 8 + 3 * 64], BlockType::GRASS.code());
        assert_eq!(grid.solid_count(), 1);
    }

    #[test]
    fn test_set_in_bounds_uses_storage_order() {
        let mut grid = VoxelGrid::new(4);
        grid.set_in_bounds(3, 1, 2, BlockType::STONE.code());
        assert_eq!(grid.get(3, 1, 2), BlockType::STONE.code());
        assert_eq!(grid.as_bytes()[3 + 4 + 2 * 16], BlockType::STONE.code());
        assert!(!grid.is_all_air());
    }

    #[test]
    fn test_fill_and_clear() {
        let mut grid = VoxelGrid::new(3);
        grid.fill(BlockType::STONE.code());
        assert_eq!(grid.solid_count(), 27);
        grid.fill(EMPTY_BLOCK);
        assert!(grid.is_all_air());
    }

    #[test]
    fn test_from_bytes_requires_exact_length() {
        assert!(VoxelGrid::from_bytes(2, vec![0; 8]).is_some());
        assert!(VoxelGrid::from_bytes(2, vec![0; 7]).is_none());
        assert!(VoxelGrid::from_bytes(2, vec![0; 9]).is_none());
    }
}
