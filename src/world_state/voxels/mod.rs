//! # Voxel World Core
//!
//! This module contains the voxel data of the world and the machinery that fills,
//! stores and tracks it.
//!
//! ## Architecture
//!
//! * **Block**: block type codes and the six block sides
//! * **Chunk**: the dense voxel grid of one chunk and the chunk entity wrapping it
//! * **Terrain**: deterministic height-field generation from a world seed
//! * **Storage**: byte-exact persistence of chunk grids
//! * **World**: the registry of chunks currently in memory and their lifecycle state
//! * **Tasks**: background production and eviction of chunks
//!
//! ## Data Flow
//!
//! 1. The streamer claims a coordinate in the world registry
//! 2. A production task loads the chunk from storage or generates it, then meshes it
//! 3. The result is installed in the registry on the foreground and its mesh published
//! 4. When the chunk leaves the active set an eviction task saves it and it is removed

pub mod block;
pub mod chunk;
pub mod storage;
pub mod tasks;
pub mod terrain;
pub mod world;
