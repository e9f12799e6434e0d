//! # Chunk Storage Module
//!
//! Persistence for chunk grids. A stored chunk is exactly its raw cell bytes,
//! `S³` of them, with no header and no compression, keyed by `"{cx}_{cz}"`.
//! Loading validates the length and reports anything else as corrupt.
//!
//! Two stores are provided:
//! - `FileChunkStore`: one `"{cx}_{cz}.chunk"` file per chunk under a root directory
//! - `MemoryChunkStore`: an in-process map, for tests and throwaway worlds

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use crate::core::MtResource;
use crate::error::VoxelError;
use crate::world_state::voxels::chunk::{chunk_key, ChunkPosition, VoxelGrid};

/// A durable key-value store of chunk grids.
///
/// Implementations are shared between the foreground and worker threads, so all
/// methods take `&self`.
pub trait ChunkStore: Send + Sync {
    /// Writes a grid, replacing any blob already stored for `position`.
    fn save(&self, position: ChunkPosition, grid: &VoxelGrid) -> Result<(), VoxelError>;

    /// Reads the grid for `position`; `Ok(None)` if nothing was ever saved there.
    fn load(&self, position: ChunkPosition) -> Result<Option<VoxelGrid>, VoxelError>;

    /// Whether a blob exists for `position`.
    fn contains(&self, position: ChunkPosition) -> Result<bool, VoxelError>;
}

/// Validates a raw blob and turns it into a grid.
pub fn decode_grid(
    position: ChunkPosition,
    chunk_size: usize,
    bytes: Vec<u8>,
) -> Result<VoxelGrid, VoxelError> {
    let expected = chunk_size * chunk_size * chunk_size;
    let actual = bytes.len();
    VoxelGrid::from_bytes(chunk_size, bytes).ok_or_else(|| VoxelError::CorruptData {
        key: chunk_key(position),
        expected,
        actual,
    })
}

/// Chunk store backed by a directory of `.chunk` files.
///
/// The root directory must exist; creating it is the caller's job
/// (`FileChunkStore::create` does it for convenience).
pub struct FileChunkStore {
    root: PathBuf,
    chunk_size: usize,
}

impl FileChunkStore {
    /// File extension of chunk blobs.
    pub const EXTENSION: &'static str = "chunk";

    /// Opens a store rooted at an existing directory.
    pub fn new<P: Into<PathBuf>>(root: P, chunk_size: usize) -> Self {
        FileChunkStore {
            root: root.into(),
            chunk_size,
        }
    }

    /// Creates the root directory (and parents) if needed, then opens the store.
    pub fn create<P: Into<PathBuf>>(root: P, chunk_size: usize) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self::new(root, chunk_size))
    }

    /// Directory blobs are stored in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the blob for a chunk.
    pub fn path_for(&self, position: ChunkPosition) -> PathBuf {
        self.root
            .join(format!("{}.{}", chunk_key(position), Self::EXTENSION))
    }

    fn io_error(position: ChunkPosition, source: std::io::Error) -> VoxelError {
        VoxelError::Io {
            key: chunk_key(position),
            source,
        }
    }
}

impl ChunkStore for FileChunkStore {
    fn save(&self, position: ChunkPosition, grid: &VoxelGrid) -> Result<(), VoxelError> {
        let path = self.path_for(position);
        // Write aside and rename so a failed write never truncates the previous blob.
        let staging = path.with_extension("chunk.tmp");
        fs::write(&staging, grid.as_bytes()).map_err(|e| Self::io_error(position, e))?;
        fs::rename(&staging, &path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            Self::io_error(position, e)
        })?;
        debug!("Saved chunk {} to {:?}", chunk_key(position), path);
        Ok(())
    }

    fn load(&self, position: ChunkPosition) -> Result<Option<VoxelGrid>, VoxelError> {
        let path = self.path_for(position);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(position, e)),
        };
        decode_grid(position, self.chunk_size, bytes).map(Some)
    }

    fn contains(&self, position: ChunkPosition) -> Result<bool, VoxelError> {
        self.path_for(position)
            .try_exists()
            .map_err(|e| Self::io_error(position, e))
    }
}

/// Chunk store held in memory and shared between clones.
#[derive(Clone)]
pub struct MemoryChunkStore {
    blobs: MtResource<HashMap<String, Vec<u8>>>,
    chunk_size: usize,
}

impl MemoryChunkStore {
    /// Creates an empty store for chunks of edge length `chunk_size`.
    pub fn new(chunk_size: usize) -> Self {
        MemoryChunkStore {
            blobs: MtResource::new(HashMap::new()),
            chunk_size,
        }
    }

    /// Stores raw bytes under a chunk's key, bypassing validation.
    pub fn insert_raw(&self, position: ChunkPosition, bytes: Vec<u8>) {
        self.blobs.get_mut().insert(chunk_key(position), bytes);
    }

    /// Raw bytes stored for a chunk.
    pub fn raw(&self, position: ChunkPosition) -> Option<Vec<u8>> {
        self.blobs.get().get(&chunk_key(position)).cloned()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.get().len()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.get().is_empty()
    }
}

impl ChunkStore for MemoryChunkStore {
    fn save(&self, position: ChunkPosition, grid: &VoxelGrid) -> Result<(), VoxelError> {
        self.insert_raw(position, grid.as_bytes().to_vec());
        Ok(())
    }

    fn load(&self, position: ChunkPosition) -> Result<Option<VoxelGrid>, VoxelError> {
        match self.raw(position) {
            Some(bytes) => decode_grid(position, self.chunk_size, bytes).map(Some),
            None => Ok(None),
        }
    }

    fn contains(&self, position: ChunkPosition) -> Result<bool, VoxelError> {
        Ok(self.blobs.get().contains_key(&chunk_key(position)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world_state::voxels::block::block_type::BlockType;
    use cgmath::Point2;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("voxel-world-store-{:016x}", fastrand::u64(..)))
    }

    fn sample_grid() -> VoxelGrid {
        let mut grid = VoxelGrid::new(16);
        grid.set(0, 0, 0, BlockType::STONE.code()).unwrap();
        grid.set(15, 15, 15, BlockType::GRASS.code()).unwrap();
        grid.set(3, 7, 11, 250).unwrap();
        grid
    }

    #[test]
    fn test_file_store_round_trip() {
        let root = temp_root();
        let store = FileChunkStore::create(&root, 16).unwrap();
        let position = Point2::new(-4, 9);
        let grid = sample_grid();

        store.save(position, &grid).unwrap();
        let bytes = fs::read(store.path_for(position)).unwrap();
        assert_eq!(bytes.len(), 4096);
        assert_eq!(store.load(position).unwrap(), Some(grid));
        assert!(store.path_for(position).ends_with("-4_9.chunk"));

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_file_store_saving_twice_equals_saving_once() {
        let root = temp_root();
        let store = FileChunkStore::create(&root, 16).unwrap();
        let position = Point2::new(0, 0);
        let grid = sample_grid();

        store.save(position, &grid).unwrap();
        store.save(position, &grid).unwrap();
        assert_eq!(store.load(position).unwrap(), Some(grid));

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_file_store_overwrites_previous_blob() {
        let root = temp_root();
        let store = FileChunkStore::create(&root, 16).unwrap();
        let position = Point2::new(1, 1);

        store.save(position, &sample_grid()).unwrap();
        let empty = VoxelGrid::new(16);
        store.save(position, &empty).unwrap();
        assert_eq!(store.load(position).unwrap(), Some(empty));

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_file_store_missing_chunk_is_none() {
        let root = temp_root();
        let store = FileChunkStore::create(&root, 16).unwrap();
        assert!(store.load(Point2::new(5, 5)).unwrap().is_none());
        assert!(!store.contains(Point2::new(5, 5)).unwrap());

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_file_store_rejects_wrong_length() {
        let root = temp_root();
        let store = FileChunkStore::create(&root, 16).unwrap();
        let position = Point2::new(2, -2);
        fs::write(store.path_for(position), vec![1u8; 100]).unwrap();

        let result = store.load(position);
        assert!(matches!(
            result,
            Err(VoxelError::CorruptData { expected: 4096, actual: 100, .. })
        ));

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_file_store_save_into_missing_directory_is_io_error() {
        let store = FileChunkStore::new(temp_root().join("missing"), 16);
        let result = store.save(Point2::new(0, 0), &VoxelGrid::new(16));
        assert!(matches!(result, Err(VoxelError::Io { .. })));
    }

    #[test]
    fn test_memory_store_round_trip_and_corruption() {
        let store = MemoryChunkStore::new(16);
        let position = Point2::new(7, -1);
        store.save(position, &sample_grid()).unwrap();
        assert_eq!(store.load(position).unwrap(), Some(sample_grid()));
        assert!(store.contains(position).unwrap());

        store.insert_raw(position, vec![0; 4095]);
        assert!(matches!(
            store.load(position),
            Err(VoxelError::CorruptData { expected: 4096, actual: 4095, .. })
        ));
    }
}
