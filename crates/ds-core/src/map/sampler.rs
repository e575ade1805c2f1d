//! Cadence-driven map sampling as a pure state transition.
//!
//! The host calls [`sample_tick`] from its tick loop with a snapshot of
//! what it currently knows. Anything that is not observable yet (no world,
//! no map in the slot, marks not drawn) is reported as
//! [`Observation::Unavailable`] and simply retried on the next cadence tick.

use log::trace;

use super::segment::{scan_rooms, MapCell, MapGrid, RoomSegment};
use super::surface::{find_entrance, measure_room_width, MapSurface};
use crate::config::SecretsConfig;
use crate::coords::{BlockPos, GridCell, MapPos};

/// Read access to the blocks around the player.
pub trait BlockSource {
    /// Palette code of the block at `pos`; `None` when that part of the
    /// world is not loaded.
    fn block_at(&self, pos: BlockPos) -> Option<u8>;
}

/// What the player holds in a hotbar slot
#[derive(Debug, Clone, Copy)]
pub enum HeldItem<'a> {
    /// A filled map; its state may not have arrived from the server yet
    FilledMap(Option<&'a MapSurface>),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerView {
    pub position: BlockPos,
}

/// Host state for one tick
#[derive(Clone, Copy)]
pub struct HostSnapshot<'a> {
    pub tick: u64,
    /// Identifies the current dungeon run; `None` outside dungeons
    pub dungeon_instance: Option<u64>,
    pub player: Option<PlayerView>,
    pub hotbar: &'a [Option<HeldItem<'a>>],
    pub world: Option<&'a dyn BlockSource>,
}

impl<'a> HostSnapshot<'a> {
    /// Snapshot with nothing observable
    pub fn empty(tick: u64) -> Self {
        Self {
            tick,
            dungeon_instance: None,
            player: None,
            hotbar: &[],
            world: None,
        }
    }
}

impl std::fmt::Debug for HostSnapshot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSnapshot")
            .field("tick", &self.tick)
            .field("dungeon_instance", &self.dungeon_instance)
            .field("player", &self.player)
            .field("hotbar", &self.hotbar)
            .field("world", &self.world.is_some())
            .finish()
    }
}

/// Why a tick did no work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    /// The configured room geometry cannot place rooms
    InvalidGeometry,
    NotInDungeon,
    OffCadence,
}

/// Why nothing could be observed this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    NoWorld,
    NoMap,
    MapNotLoaded,
    EntranceNotRendered,
    RoomWidthUnknown,
}

/// Everything read from the map on one cadence tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedFootprint {
    pub entrance: MapPos,
    pub room_width: u32,
    pub grid: MapGrid,
    pub cells: Vec<MapCell>,
    pub segments: Vec<RoomSegment>,
    /// Slot the player stands in
    pub player_cell: GridCell,
}

impl ObservedFootprint {
    /// The room the player is in, if its slot is discovered
    pub fn current_segment(&self) -> Option<&RoomSegment> {
        self.cells
            .iter()
            .find(|c| c.cell == self.player_cell)
            .map(|c| &self.segments[c.segment])
    }
}

/// Result of the latest tick
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Observation {
    #[default]
    Idle,
    Skipped(SkipReason),
    Unavailable(Unavailable),
    Observed(ObservedFootprint),
}

/// Sampler state carried between ticks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SamplerState {
    /// Dungeon run the calibration belongs to
    pub instance: Option<u64>,
    /// Cached once found, until a new run starts
    pub entrance: Option<MapPos>,
    /// Cached once found, until a new run starts
    pub room_width: Option<u32>,
    pub last: Observation,
}

/// Advance the sampler by one host tick.
pub fn sample_tick(
    state: &SamplerState,
    snapshot: &HostSnapshot<'_>,
    config: &SecretsConfig,
) -> SamplerState {
    let mut next = state.clone();

    if let Some(instance) = snapshot.dungeon_instance {
        if next.instance != Some(instance) {
            trace!("New dungeon instance {}, resetting map calibration", instance);
            next = SamplerState {
                instance: Some(instance),
                ..SamplerState::default()
            };
        }
    }

    next.last = observe(&mut next, snapshot, config);
    next
}

fn observe(
    state: &mut SamplerState,
    snapshot: &HostSnapshot<'_>,
    config: &SecretsConfig,
) -> Observation {
    if !config.secret_waypoints {
        return Observation::Skipped(SkipReason::Disabled);
    }
    if !config.geometry.is_valid() {
        return Observation::Skipped(SkipReason::InvalidGeometry);
    }
    if snapshot.dungeon_instance.is_none() {
        return Observation::Skipped(SkipReason::NotInDungeon);
    }
    if snapshot.tick % config.sample_interval_ticks.max(1) as u64 != 0 {
        return Observation::Skipped(SkipReason::OffCadence);
    }

    let Some(player) = snapshot.player.filter(|_| snapshot.world.is_some()) else {
        return Observation::Unavailable(Unavailable::NoWorld);
    };
    let map = match snapshot.hotbar.get(config.map_slot).copied().flatten() {
        Some(HeldItem::FilledMap(Some(map))) => map,
        Some(HeldItem::FilledMap(None)) => {
            return Observation::Unavailable(Unavailable::MapNotLoaded);
        }
        _ => return Observation::Unavailable(Unavailable::NoMap),
    };

    let entrance = match state.entrance {
        Some(pos) => pos,
        None => match find_entrance(map, &config.map) {
            Some(pos) => *state.entrance.insert(pos),
            None => {
                trace!("Entrance not rendered on the map yet");
                return Observation::Unavailable(Unavailable::EntranceNotRendered);
            }
        },
    };
    let room_width = match state.room_width {
        Some(width) => width,
        None => match measure_room_width(map, entrance, &config.map) {
            Some(width) => *state.room_width.insert(width),
            None => {
                trace!("Room width not measurable at {:?} yet", entrance);
                return Observation::Unavailable(Unavailable::RoomWidthUnknown);
            }
        },
    };

    let Some(player_cell) = config.geometry.cell_of(player.position) else {
        return Observation::Skipped(SkipReason::InvalidGeometry);
    };
    let grid = MapGrid::new(entrance, room_width, config.map.gap, map.size());
    let (cells, segments) = scan_rooms(map, &grid);
    Observation::Observed(ObservedFootprint {
        entrance,
        room_width,
        grid,
        cells,
        segments,
        player_cell,
    })
}
