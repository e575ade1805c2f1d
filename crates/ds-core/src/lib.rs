//! ds-core: Room recognition and secret waypoints for dungeon runs
//!
//! Loads the catalog of known room layouts off the tick thread, samples the
//! player's overview map on a fixed cadence, matches the occupied room
//! against the catalog under all eight rotations/reflections and resolves
//! the room's secrets into world coordinates.
//!
//! The host drives everything through [`DungeonSecrets`]: call
//! [`DungeonSecrets::init`] once, then [`DungeonSecrets::on_tick`] from the
//! tick callback. Nothing on the tick path blocks; data that is not yet
//! available is simply retried on a later tick.

pub mod catalog;
pub mod codec;
pub mod config;
pub mod coords;
pub mod error;
pub mod loader;
pub mod map;
pub mod matcher;
pub mod metadata;
pub mod orientation;
pub mod palette;
pub mod secrets;
pub mod session;
pub mod voxel;

mod facade;

pub use catalog::{CatalogSource, DirCatalogSource, RoomCatalog, ShapeBucket};
pub use config::{DungeonGeometry, MapCalibration, SecretsConfig};
pub use coords::{BlockPos, GridCell, MapPos};
pub use error::CatalogError;
pub use facade::DungeonSecrets;
pub use loader::{CatalogLoader, LoadHandle, LoadReport, MetadataIds, RoomLibrary};
pub use map::{
    BlockSource, HeldItem, HostSnapshot, MapSurface, Observation, ObservedFootprint, PlayerView,
    SamplerState,
};
pub use matcher::{match_room, MatchResult, ObservedRoom, RoomMatch};
pub use metadata::{
    DirResourceProvider, ResourceGate, ResourceId, ResourceProvider, RoomMetadata, SecretCategory,
    SecretWaypointTable,
};
pub use orientation::{Orientation, Rotation};
pub use secrets::{resolve, WorldSecret};
pub use session::{SecretsSession, TickOutcome};
pub use voxel::{GridDims, RoomVoxelGrid};
