//! # World Module
//!
//! This module provides the `World` registry: the one place chunks live while they
//! are in memory, keyed by chunk coordinate.
//!
//! ## Slot Lifecycle
//!
//! Every coordinate in the registry holds exactly one `ChunkSlot`:
//!
//! ```text
//! (absent) --claim--> Producing --activate--> Active --begin_saving--> Saving --finish_saving--> (absent)
//!                         |                     ^                        |
//!                         +--fail--> Failed     +------revert_saving-----+
//! ```
//!
//! A coordinate is only ever in one slot, so it can never be produced twice at once
//! or saved while it is being produced. The registry is owned by the foreground
//! and never shared with workers; tasks receive snapshots instead.

use std::collections::HashMap;

use crate::world_state::voxels::chunk::{Chunk, ChunkPosition, VoxelGrid};

/// The lifecycle state of a coordinate, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Generation or load is in flight.
    Producing,
    /// The chunk is materialized and its mesh is current.
    Active,
    /// The chunk's grid is being written to storage.
    Saving,
    /// Production failed; the coordinate is held so it is not retried while desired.
    Failed,
}

/// A registry entry.
#[derive(Debug)]
pub enum ChunkSlot {
    /// A production task holds the claim on this coordinate.
    Producing,
    /// The materialized chunk; edits are accepted.
    Active(Chunk),
    /// The chunk stays readable while its snapshot is written.
    Saving(Chunk),
    /// Production failed; nothing is generated in place of the stored data.
    Failed {
        /// Why production failed.
        reason: String,
    },
}

impl ChunkSlot {
    /// The slot's state, without its data.
    pub fn state(&self) -> ChunkState {
        match self {
            ChunkSlot::Producing => ChunkState::Producing,
            ChunkSlot::Active(_) => ChunkState::Active,
            ChunkSlot::Saving(_) => ChunkState::Saving,
            ChunkSlot::Failed { .. } => ChunkState::Failed,
        }
    }
}

/// Number of registry slots in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Coordinates being generated or loaded.
    pub producing: usize,
    /// Materialized chunks.
    pub active: usize,
    /// Chunks being written out.
    pub saving: usize,
    /// Coordinates whose production failed.
    pub failed: usize,
}

impl WorldStats {
    /// Total number of coordinates in the registry.
    pub fn total(&self) -> usize {
        self.producing + self.active + self.saving + self.failed
    }
}

/// The active-chunk registry.
///
/// Transition methods only act when the slot is in the state they start from and
/// report whether they did anything, so a late or duplicated task result can never
/// move a coordinate backwards.
///
/// # Examples
///
/// ```
/// use cgmath::Point2;
/// use voxel_world::world_state::voxels::chunk::{Chunk, VoxelGrid};
/// use voxel_world::world_state::voxels::world::{ChunkState, World};
///
/// let mut world = World::new();
/// let position = Point2::new(0, 0);
///
/// assert!(world.claim(position));
/// assert!(!world.claim(position));
/// assert!(world.activate(Chunk::new(position, VoxelGrid::new(16))));
/// assert_eq!(world.state(position), Some(ChunkState::Active));
/// ```
#[derive(Debug, Default)]
pub struct World {
    slots: HashMap<ChunkPosition, ChunkSlot>,
}

impl World {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a coordinate; `None` means absent.
    pub fn state(&self, position: ChunkPosition) -> Option<ChunkState> {
        self.slots.get(&position).map(ChunkSlot::state)
    }

    /// Whether a coordinate is in the registry in any state.
    pub fn contains(&self, position: ChunkPosition) -> bool {
        self.slots.contains_key(&position)
    }

    /// Number of coordinates in the registry, in any state.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the registry holds no coordinate at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Every coordinate in the registry.
    pub fn positions(&self) -> impl Iterator<Item = ChunkPosition> + '_ {
        self.slots.keys().copied()
    }

    /// Coordinates currently in `state`.
    pub fn positions_in(&self, state: ChunkState) -> Vec<ChunkPosition> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.state() == state)
            .map(|(&position, _)| position)
            .collect()
    }

    /// The materialized chunk at a coordinate, whether Active or Saving.
    pub fn chunk(&self, position: ChunkPosition) -> Option<&Chunk> {
        match self.slots.get(&position)? {
            ChunkSlot::Active(chunk) | ChunkSlot::Saving(chunk) => Some(chunk),
            _ => None,
        }
    }

    /// Mutable access to an Active chunk. Saving chunks are not editable.
    pub fn active_chunk_mut(&mut self, position: ChunkPosition) -> Option<&mut Chunk> {
        match self.slots.get_mut(&position)? {
            ChunkSlot::Active(chunk) => Some(chunk),
            _ => None,
        }
    }

    /// Failure reason of a Failed coordinate.
    pub fn failure(&self, position: ChunkPosition) -> Option<&str> {
        match self.slots.get(&position)? {
            ChunkSlot::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Claims an absent coordinate for production.
    ///
    /// Returns `false` without changing anything if the coordinate is already present.
    pub fn claim(&mut self, position: ChunkPosition) -> bool {
        if self.slots.contains_key(&position) {
            return false;
        }
        self.slots.insert(position, ChunkSlot::Producing);
        true
    }

    /// Producing → Active.
    pub fn activate(&mut self, chunk: Chunk) -> bool {
        match self.slots.get_mut(&chunk.position) {
            Some(slot) if matches!(slot, ChunkSlot::Producing) => {
                *slot = ChunkSlot::Active(chunk);
                true
            }
            _ => false,
        }
    }

    /// Producing → absent, for a production that is no longer wanted.
    pub fn release_claim(&mut self, position: ChunkPosition) -> bool {
        if self.state(position) != Some(ChunkState::Producing) {
            return false;
        }
        self.slots.remove(&position).is_some()
    }

    /// Producing → Failed.
    pub fn fail(&mut self, position: ChunkPosition, reason: String) -> bool {
        match self.slots.get_mut(&position) {
            Some(slot) if matches!(slot, ChunkSlot::Producing) => {
                *slot = ChunkSlot::Failed { reason };
                true
            }
            _ => false,
        }
    }

    /// Active → Saving, returning a snapshot of the grid to persist.
    pub fn begin_saving(&mut self, position: ChunkPosition) -> Option<VoxelGrid> {
        let slot = self.slots.get_mut(&position)?;
        if !matches!(slot, ChunkSlot::Active(_)) {
            return None;
        }
        let ChunkSlot::Active(chunk) = std::mem::replace(slot, ChunkSlot::Producing) else {
            return None;
        };
        let snapshot = chunk.grid().clone();
        *slot = ChunkSlot::Saving(chunk);
        Some(snapshot)
    }

    /// Saving → Active, after a failed save or when the coordinate is wanted again.
    pub fn revert_saving(&mut self, position: ChunkPosition) -> bool {
        let Some(slot) = self.slots.get_mut(&position) else {
            return false;
        };
        if !matches!(slot, ChunkSlot::Saving(_)) {
            return false;
        }
        if let ChunkSlot::Saving(chunk) = std::mem::replace(slot, ChunkSlot::Producing) {
            *slot = ChunkSlot::Active(chunk);
        }
        true
    }

    /// Saving → absent, handing back the evicted chunk.
    pub fn finish_saving(&mut self, position: ChunkPosition) -> Option<Chunk> {
        if !matches!(self.slots.get(&position), Some(ChunkSlot::Saving(_))) {
            return None;
        }
        match self.slots.remove(&position)? {
            ChunkSlot::Saving(chunk) => Some(chunk),
            _ => None,
        }
    }

    /// Failed → absent.
    pub fn clear_failed(&mut self, position: ChunkPosition) -> bool {
        if self.state(position) != Some(ChunkState::Failed) {
            return false;
        }
        self.slots.remove(&position).is_some()
    }

    /// Count of slots per state.
    pub fn stats(&self) -> WorldStats {
        self.slots
            .values()
            .fold(WorldStats::default(), |mut stats, slot| {
                match slot.state() {
                    ChunkState::Producing => stats.producing += 1,
                    ChunkState::Active => stats.active += 1,
                    ChunkState::Saving => stats.saving += 1,
                    ChunkState::Failed => stats.failed += 1,
                }
                stats
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point2;

    fn chunk_at(x: i32, z: i32) -> Chunk {
        Chunk::new(Point2::new(x, z), VoxelGrid::new(4))
    }

    #[test]
    fn test_claim_is_exclusive() {
        let mut world = World::new();
        let position = Point2::new(1, 2);
        assert!(world.claim(position));
        assert!(!world.claim(position));
        assert_eq!(world.state(position), Some(ChunkState::Producing));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut world = World::new();
        let position = Point2::new(0, 0);

        world.claim(position);
        assert!(world.activate(chunk_at(0, 0)));
        assert!(world.active_chunk_mut(position).is_some());

        let snapshot = world.begin_saving(position).unwrap();
        assert_eq!(snapshot.size(), 4);
        assert_eq!(world.state(position), Some(ChunkState::Saving));
        assert!(world.chunk(position).is_some());
        assert!(world.active_chunk_mut(position).is_none());

        assert!(world.finish_saving(position).is_some());
        assert_eq!(world.state(position), None);
    }

    #[test]
    fn test_failed_save_reverts_to_active() {
        let mut world = World::new();
        let position = Point2::new(3, 3);
        world.claim(position);
        world.activate(chunk_at(3, 3));
        world.begin_saving(position);

        assert!(world.revert_saving(position));
        assert_eq!(world.state(position), Some(ChunkState::Active));
    }

    #[test]
    fn test_transitions_from_wrong_state_are_ignored() {
        let mut world = World::new();
        let position = Point2::new(0, 1);

        assert!(!world.activate(chunk_at(0, 1)));
        assert!(world.begin_saving(position).is_none());

        world.claim(position);
        assert!(world.begin_saving(position).is_none());
        assert!(world.finish_saving(position).is_none());
        assert!(!world.revert_saving(position));

        world.activate(chunk_at(0, 1));
        assert!(!world.activate(chunk_at(0, 1)));
        assert!(!world.fail(position, "late".to_string()));
        assert_eq!(world.state(position), Some(ChunkState::Active));
    }

    #[test]
    fn test_failed_slot_is_held_until_cleared() {
        let mut world = World::new();
        let position = Point2::new(-1, -1);
        world.claim(position);
        assert!(world.fail(position, "corrupt".to_string()));
        assert_eq!(world.failure(position), Some("corrupt"));
        assert!(!world.claim(position));

        assert!(world.clear_failed(position));
        assert!(world.claim(position));
    }

    #[test]
    fn test_release_claim_only_drops_producing_slots() {
        let mut world = World::new();
        let position = Point2::new(4, 4);
        assert!(!world.release_claim(position));
        world.claim(position);
        assert!(world.release_claim(position));
        assert!(world.is_empty());
    }

    #[test]
    fn test_stats_count_each_state() {
        let mut world = World::new();
        for x in 0..4 {
            world.claim(Point2::new(x, 0));
        }
        world.activate(chunk_at(1, 0));
        world.activate(chunk_at(2, 0));
        world.begin_saving(Point2::new(2, 0));
        world.fail(Point2::new(3, 0), "io".to_string());

        let stats = world.stats();
        assert_eq!(
            stats,
            WorldStats {
                producing: 1,
                active: 1,
                saving: 1,
                failed: 1
            }
        );
        assert_eq!(stats.total(), world.len());
        assert_eq!(world.positions_in(ChunkState::Active), vec![Point2::new(1, 0)]);
    }
}
