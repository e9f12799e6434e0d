//! # Error Types
//!
//! Failures surfaced by the voxel core. Voxel and atlas errors stay local to the
//! call that produced them; persistence errors travel back to the streamer, which
//! logs them and leaves the affected chunk's state in place.

use thiserror::Error;

/// Errors produced by voxel storage, persistence and block lookups.
#[derive(Error, Debug)]
pub enum VoxelError {
    /// A mutating voxel call addressed a cell outside the chunk cube.
    #[error("voxel ({x}, {y}, {z}) is outside a chunk of size {size}")]
    OutOfRange {
        /// Requested x, chunk-local.
        x: i32,
        /// Requested y.
        y: i32,
        /// Requested z, chunk-local.
        z: i32,
        /// Edge length of the chunk.
        size: usize,
    },

    /// Reading or writing a chunk blob failed.
    #[error("i/o error on chunk blob {key}: {source}")]
    Io {
        /// Key of the chunk being read or written.
        key: String,
        /// The underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// A stored chunk blob does not hold exactly one cell per voxel.
    #[error("chunk blob {key} is corrupt: expected {expected} bytes, found {actual}")]
    CorruptData {
        /// Key of the chunk.
        key: String,
        /// `S³`.
        expected: usize,
        /// Length of the stored blob.
        actual: usize,
    },

    /// A worker panicked while handling a chunk.
    #[error("worker panicked on chunk {key}: {reason}")]
    TaskPanicked {
        /// Key of the chunk the task was working on.
        key: String,
        /// The panic message.
        reason: String,
    },

    /// A block code has no named block type.
    #[error("unknown block type code {0}")]
    UnknownBlockType(u8),
}

impl VoxelError {
    /// Whether this error came from the persistence medium.
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, VoxelError::Io { .. } | VoxelError::CorruptData { .. })
    }
}

/// Errors that stop the headless world driver.
#[derive(Error, Debug)]
pub enum WorldError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// A voxel or persistence call failed.
    #[error(transparent)]
    Voxel(#[from] VoxelError),

    /// The save directory could not be created.
    #[error("cannot prepare save directory: {0}")]
    SaveDirectory(#[from] std::io::Error),
}
