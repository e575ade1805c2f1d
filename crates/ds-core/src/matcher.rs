//! Room Shape Matcher.
//!
//! Compares an observed block sample against every room of the matching
//! shape bucket under all eight orientations. A candidate matches when
//! every cell defined (non-zero) in both the sample and the candidate
//! agrees, and at least one such cell exists. Rooms are tried in name
//! order and orientations in [`Orientation::ALL`] order; the first match
//! wins, so among identical layouts the lexicographically first name is
//! reported.

use log::trace;

use crate::catalog::RoomCatalog;
use crate::coords::BlockPos;
use crate::orientation::Orientation;
use crate::voxel::{GridDims, RoomVoxelGrid};

/// A room as seen in the world, ready to be matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedRoom {
    pub dungeon: String,
    pub shape: String,
    /// World position of sample cell `(0, 0, 0)`
    pub anchor: BlockPos,
    /// World-aligned sample; 0 marks unobserved cells
    pub sample: RoomVoxelGrid,
}

/// A resolved room placement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomMatch {
    pub dungeon: String,
    pub shape: String,
    pub name: String,
    /// How the catalog layout is placed in the world
    pub orientation: Orientation,
    pub anchor: BlockPos,
    /// Catalog grid size, needed to transform offsets
    pub dims: GridDims,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchResult {
    Matched(RoomMatch),
    /// Nothing was observed yet; try again later
    InsufficientObservation,
    /// No catalog room agrees with what was observed
    NoCatalogMatch,
}

impl MatchResult {
    pub fn matched(&self) -> Option<&RoomMatch> {
        match self {
            MatchResult::Matched(m) => Some(m),
            _ => None,
        }
    }
}

/// Match an observed room against the catalog.
pub fn match_room(observed: &ObservedRoom, catalog: &RoomCatalog) -> MatchResult {
    let defined: Vec<(i32, i32, i32, u8)> = observed.sample.defined_cells().collect();
    if defined.is_empty() {
        return MatchResult::InsufficientObservation;
    }
    let Some(bucket) = catalog.bucket(&observed.dungeon, &observed.shape) else {
        trace!("No catalog bucket {}/{}", observed.dungeon, observed.shape);
        return MatchResult::NoCatalogMatch;
    };

    let sample_dims = observed.sample.dims();
    for (name, grid) in bucket.rooms() {
        for orientation in Orientation::ALL {
            if fits(grid.dims(), sample_dims, orientation) && agrees(grid, &defined, orientation) {
                trace!("Matched room {} at {}", name, orientation);
                return MatchResult::Matched(RoomMatch {
                    dungeon: observed.dungeon.clone(),
                    shape: observed.shape.clone(),
                    name: name.to_string(),
                    orientation,
                    anchor: observed.anchor,
                    dims: grid.dims(),
                });
            }
        }
    }
    MatchResult::NoCatalogMatch
}

/// Whether the catalog grid, placed with `orientation`, covers the sample exactly.
fn fits(catalog: GridDims, sample: GridDims, orientation: Orientation) -> bool {
    let (width, depth) =
        orientation.world_footprint(catalog.width as i32, catalog.depth as i32);
    catalog.height == sample.height
        && width == sample.width as i32
        && depth == sample.depth as i32
}

fn agrees(grid: &RoomVoxelGrid, defined: &[(i32, i32, i32, u8)], orientation: Orientation) -> bool {
    let dims = grid.dims();
    let (width, depth) = (dims.width as i32, dims.depth as i32);
    let mut overlap = 0usize;
    for &(x, y, z, code) in defined {
        let (cx, cz) = orientation.to_catalog(x, z, width, depth);
        let expected = grid.get(cx, y, cz);
        if expected == 0 {
            continue;
        }
        if expected != code {
            return false;
        }
        overlap += 1;
    }
    overlap > 0
}

/// Place a catalog grid in the world: the sample a perfect observation
/// of that room with `orientation` would produce.
pub fn place_grid(grid: &RoomVoxelGrid, orientation: Orientation) -> RoomVoxelGrid {
    let dims = grid.dims();
    let (w, d) = (dims.width as i32, dims.depth as i32);
    let (world_w, world_d) = orientation.world_footprint(w, d);
    let world_dims = GridDims::new(world_w as u16, dims.height, world_d as u16);
    RoomVoxelGrid::from_fn(world_dims, |x, y, z| {
        let (cx, cz) = orientation.to_catalog(x as i32, z as i32, w, d);
        grid.get(cx, y as i32, cz)
    })
    .unwrap_or_else(|_| grid.clone())
}
