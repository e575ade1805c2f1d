//! Room Library Store: the decoded catalog of known room layouts.
//!
//! Layout is `dungeon type -> room shape -> room name -> voxel grid`. Every
//! level is a `BTreeMap`, so iteration is in lexicographic order; the
//! matcher relies on that for its tie-break.

mod source;

pub use source::{room_name_from_file, CatalogSource, DirCatalogSource, ROOM_FILE_SUFFIX};

use std::collections::BTreeMap;

use log::{debug, error, warn};

use crate::codec;
use crate::error::CatalogError;
use crate::voxel::{GridDims, RoomVoxelGrid};

/// Catalog partition, e.g. `catacombs`
pub type DungeonType = String;
/// Footprint class, e.g. `1x1`, `L-shape`
pub type RoomShapeId = String;
/// Room layout name, unique within the catalog
pub type RoomName = String;

/// One entry that failed to load, and why
#[derive(Debug)]
pub struct LoadFailure {
    pub path: String,
    pub error: CatalogError,
}

/// All rooms of one shape. Every grid shares the bucket's dimensions.
#[derive(Debug, Clone, Default)]
pub struct ShapeBucket {
    dims: GridDims,
    rooms: BTreeMap<RoomName, RoomVoxelGrid>,
}

impl ShapeBucket {
    /// Assemble a bucket, enforcing one grid size per bucket.
    ///
    /// Rooms are taken in name order; the first room fixes the dimensions
    /// and any room disagreeing with it is returned as a failure.
    pub fn from_rooms(
        shape: &str,
        rooms: impl IntoIterator<Item = (RoomName, RoomVoxelGrid)>,
    ) -> (Self, Vec<LoadFailure>) {
        let sorted: BTreeMap<RoomName, RoomVoxelGrid> = rooms.into_iter().collect();
        let mut bucket = ShapeBucket::default();
        let mut dropped = Vec::new();

        for (name, grid) in sorted {
            if bucket.rooms.is_empty() {
                bucket.dims = grid.dims();
            } else if grid.dims() != bucket.dims {
                warn!(
                    "Dropping room {} of shape {}: {} grid does not match bucket size {}",
                    name,
                    shape,
                    grid.dims(),
                    bucket.dims
                );
                dropped.push(LoadFailure {
                    path: format!("{shape}/{name}"),
                    error: CatalogError::malformed(
                        format!("{shape}/{name}"),
                        format!("grid is {} but shape {shape} uses {}", grid.dims(), bucket.dims),
                    ),
                });
                continue;
            }
            bucket.rooms.insert(name, grid);
        }
        (bucket, dropped)
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RoomVoxelGrid> {
        self.rooms.get(name)
    }

    /// Rooms in lexicographic name order
    pub fn rooms(&self) -> impl Iterator<Item = (&str, &RoomVoxelGrid)> {
        self.rooms.iter().map(|(name, grid)| (name.as_str(), grid))
    }
}

/// Shape buckets of one dungeon type
pub type DungeonRooms = BTreeMap<RoomShapeId, ShapeBucket>;

/// The complete catalog. Built once by the loader, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RoomCatalog {
    dungeons: BTreeMap<DungeonType, DungeonRooms>,
}

impl RoomCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_dungeon(&mut self, dungeon: DungeonType, rooms: DungeonRooms) {
        self.dungeons.insert(dungeon, rooms);
    }

    /// Add one bucket directly; used when assembling catalogs by hand.
    pub fn insert_bucket(&mut self, dungeon: &str, shape: &str, bucket: ShapeBucket) {
        self.dungeons
            .entry(dungeon.to_string())
            .or_default()
            .insert(shape.to_string(), bucket);
    }

    pub fn bucket(&self, dungeon: &str, shape: &str) -> Option<&ShapeBucket> {
        self.dungeons.get(dungeon)?.get(shape)
    }

    pub fn dungeon(&self, dungeon: &str) -> Option<&DungeonRooms> {
        self.dungeons.get(dungeon)
    }

    pub fn dungeons(&self) -> impl Iterator<Item = (&str, &DungeonRooms)> {
        self.dungeons.iter().map(|(name, rooms)| (name.as_str(), rooms))
    }

    pub fn dungeon_count(&self) -> usize {
        self.dungeons.len()
    }

    pub fn shape_count(&self) -> usize {
        self.dungeons.values().map(|d| d.len()).sum()
    }

    pub fn room_count(&self) -> usize {
        self.dungeons
            .values()
            .flat_map(|d| d.values())
            .map(ShapeBucket::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dungeons.is_empty()
    }
}

/// Read and decode a single room file.
///
/// Returns the room name and grid, or the failure to record. Never panics
/// and never aborts siblings.
pub fn load_room(
    source: &dyn CatalogSource,
    dungeon: &str,
    shape: &str,
    file: &str,
) -> Result<(RoomName, RoomVoxelGrid), LoadFailure> {
    let path = source.describe(&[dungeon, shape, file]);
    let result = room_name_from_file(file)
        .ok_or_else(|| {
            CatalogError::malformed(&path, format!("file name lacks the {ROOM_FILE_SUFFIX} suffix"))
        })
        .and_then(|name| {
            let bytes = source.read_room(dungeon, shape, file)?;
            let grid = codec::decode_room(&bytes, &path)?;
            Ok((name.to_string(), grid))
        });

    match result {
        Ok(room) => {
            debug!("Loaded dungeon secrets room {}", file);
            Ok(room)
        }
        Err(error) => {
            error!("Failed to load dungeon secrets room {}: {}", file, error);
            Err(LoadFailure { path, error })
        }
    }
}
