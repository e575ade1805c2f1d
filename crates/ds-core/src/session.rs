//! Per-dungeon-run driver: sampler, matcher and resolver on the tick path.
//!
//! Matches and resolved secrets are cached per room (keyed by the room's
//! north-west slot) for the lifetime of the run, together with the slots
//! the room covered when it was matched. A room whose footprint on the map
//! has changed since (more of it got drawn) is matched again. Unresolved
//! rooms are re-sampled and re-matched on every cadence tick until they
//! resolve, since more of the room becomes observable as the player explores.

use hashbrown::HashMap;
use log::{debug, trace};

use crate::config::{DungeonGeometry, SecretsConfig};
use crate::coords::GridCell;
use crate::loader::RoomLibrary;
use crate::map::{sample_tick, BlockSource, HostSnapshot, Observation, RoomSegment, SamplerState};
use crate::matcher::{match_room, MatchResult, ObservedRoom, RoomMatch};
use crate::palette;
use crate::secrets::{resolve, WorldSecret};
use crate::voxel::{GridDims, RoomVoxelGrid};

/// What one tick achieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing observed this tick; see [`SecretsSession::observation`]
    NotObserved,
    /// The map was read but the catalog is still loading
    CatalogNotReady,
    /// The player's slot is undiscovered or not a known room shape
    NoRoom,
    /// The room could not be matched yet
    Unresolved(MatchResult),
    /// The player's room is known
    Resolved(RoomMatch),
}

/// A matched room and the map slots it covered when matched
#[derive(Debug, Clone)]
struct CachedRoom {
    cells: Vec<GridCell>,
    room: RoomMatch,
    secrets: Vec<WorldSecret>,
}

/// State of one dungeon run
#[derive(Debug, Default)]
pub struct SecretsSession {
    sampler: SamplerState,
    rooms: HashMap<GridCell, CachedRoom>,
    current: Option<GridCell>,
}

impl SecretsSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sampler(&self) -> &SamplerState {
        &self.sampler
    }

    pub fn observation(&self) -> &Observation {
        &self.sampler.last
    }

    /// Forget everything about the current run.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Run one host tick. Never blocks.
    pub fn tick(
        &mut self,
        snapshot: &HostSnapshot<'_>,
        config: &SecretsConfig,
        library: Option<&RoomLibrary>,
    ) -> TickOutcome {
        let previous = self.sampler.instance;
        self.sampler = sample_tick(&self.sampler, snapshot, config);
        if self.sampler.instance != previous {
            self.rooms.clear();
            self.current = None;
        }

        let segment = match &self.sampler.last {
            Observation::Observed(footprint) => footprint.current_segment().cloned(),
            _ => return TickOutcome::NotObserved,
        };
        let Some(segment) = segment else {
            self.current = None;
            return TickOutcome::NoRoom;
        };
        let key = segment.min_cell();
        self.current = Some(key);

        match self.rooms.get(&key) {
            Some(cached) if cached.cells == segment.cells => {
                return TickOutcome::Resolved(cached.room.clone());
            }
            Some(cached) => {
                debug!(
                    "Room {} at {:?} changed from {} to {} slot(s), matching again",
                    cached.room.name,
                    key,
                    cached.cells.len(),
                    segment.cells.len()
                );
                self.rooms.remove(&key);
            }
            None => {}
        }
        let Some(library) = library else {
            return TickOutcome::CatalogNotReady;
        };
        let (Some(shape), Some(world)) = (segment.shape(), snapshot.world) else {
            return TickOutcome::NoRoom;
        };
        let Some(bucket) = library.catalog.bucket(&config.dungeon_type, shape.id()) else {
            trace!("No {} rooms for dungeon {}", shape, config.dungeon_type);
            return TickOutcome::Unresolved(MatchResult::NoCatalogMatch);
        };

        let Some(sample) = sample_room(&segment, &config.geometry, bucket.dims().height, world)
        else {
            return TickOutcome::Unresolved(MatchResult::InsufficientObservation);
        };
        let observed = ObservedRoom {
            dungeon: config.dungeon_type.clone(),
            shape: shape.id().to_string(),
            anchor: config.geometry.corner_of(key),
            sample,
        };
        let result = match_room(&observed, &library.catalog);
        let Some(room) = result.matched().cloned() else {
            trace!("Room at {:?} unresolved: {:?}", key, result);
            return TickOutcome::Unresolved(result);
        };

        let secrets = library
            .secrets
            .as_ref()
            .map(|table| resolve(&result, table))
            .unwrap_or_default();
        debug!(
            "Matched room {} ({}) at {:?} with {} secret(s)",
            room.name,
            room.orientation,
            room.anchor,
            secrets.len()
        );
        // A grown room may now cover slots cached under another corner.
        self.rooms
            .retain(|_, cached| !cached.cells.iter().any(|cell| segment.contains(*cell)));
        self.rooms.insert(
            key,
            CachedRoom {
                cells: segment.cells.clone(),
                room: room.clone(),
                secrets,
            },
        );
        TickOutcome::Resolved(room)
    }

    /// The room the player was last seen in, if matched
    pub fn current_room(&self) -> Option<&RoomMatch> {
        self.rooms.get(self.current.as_ref()?).map(|cached| &cached.room)
    }

    /// Secrets of the player's current room
    pub fn current_secrets(&self) -> &[WorldSecret] {
        self.current
            .and_then(|key| self.rooms.get(&key))
            .map(|cached| cached.secrets.as_slice())
            .unwrap_or(&[])
    }

    /// Every room matched during this run
    pub fn matched_rooms(&self) -> impl Iterator<Item = &RoomMatch> {
        self.rooms.values().map(|cached| &cached.room)
    }
}

/// Read a room's blocks from the world into a world-aligned sample.
///
/// Cells outside the room's own slots, unloaded blocks and blocks outside
/// the palette are left at 0. `None` for an invalid geometry or an empty box.
pub fn sample_room(
    segment: &RoomSegment,
    geometry: &DungeonGeometry,
    height: u16,
    world: &dyn BlockSource,
) -> Option<RoomVoxelGrid> {
    if !geometry.is_valid() {
        return None;
    }
    let min = segment.min_cell();
    let (columns, rows) = segment.extent();
    let dims = GridDims::new(
        geometry.span(columns) as u16,
        height,
        geometry.span(rows) as u16,
    );
    let anchor = geometry.corner_of(min);
    let stride = geometry.room_stride;

    RoomVoxelGrid::from_fn(dims, |x, y, z| {
        let (x, y, z) = (x as i32, y as i32, z as i32);
        let cell = GridCell::new(min.x + x / stride, min.y + z / stride);
        if !segment.contains(cell) {
            return palette::UNMAPPED;
        }
        world
            .block_at(anchor.offset(x, y, z))
            .filter(|code| palette::is_valid_code(*code))
            .unwrap_or(palette::UNMAPPED)
    })
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::BlockPos;
    use crate::map::MapRoomKind;

    struct Checker;

    impl BlockSource for Checker {
        fn block_at(&self, pos: BlockPos) -> Option<u8> {
            if pos.y > 1 {
                return None;
            }
            Some(if (pos.x + pos.z).rem_euclid(2) == 0 { 1 } else { 99 })
        }
    }

    #[test]
    fn test_sample_room_masks_foreign_slots() {
        let geometry = DungeonGeometry {
            origin_x: 0,
            origin_z: 0,
            room_stride: 5,
            room_size: 4,
            base_y: 0,
        };
        let segment = RoomSegment {
            kind: MapRoomKind::Normal,
            cells: vec![GridCell::new(0, 0), GridCell::new(1, 0), GridCell::new(0, 1)],
        };
        let sample = sample_room(&segment, &geometry, 3, &Checker).unwrap();
        assert_eq!(sample.dims(), GridDims::new(9, 3, 9));
        // Inside slot (0, 0)
        assert_eq!(sample.get(0, 0, 0), 1);
        // Invalid code from the world
        assert_eq!(sample.get(1, 0, 0), 0);
        // Unloaded layer
        assert_eq!(sample.get(0, 2, 0), 0);
        // Slot (1, 1) is not part of the L
        assert_eq!(sample.get(6, 0, 6), 0);
        assert_eq!(sample.get(6, 0, 0), 1);

        let flat = DungeonGeometry {
            room_stride: 0,
            ..geometry
        };
        assert!(sample_room(&segment, &flat, 3, &Checker).is_none());
    }
}
