//! Map Observation Sampler.
//!
//! Reads the overview map the player carries, calibrates the room grid
//! once per dungeon instance and reports which room slots are discovered
//! and which room the player stands in.

mod sampler;
mod segment;
mod surface;

pub use sampler::{
    sample_tick, BlockSource, HeldItem, HostSnapshot, Observation, ObservedFootprint,
    PlayerView, SamplerState, SkipReason, Unavailable,
};
pub use segment::{scan_rooms, MapCell, MapGrid, RoomSegment, RoomShape};
pub use surface::{find_entrance, measure_room_width, MapRoomKind, MapSurface};
