//! The eight rotations/reflections of a room about the vertical axis.
//!
//! Catalog grids are stored in a canonical orientation. An [`Orientation`]
//! describes how that canonical layout sits in the world: first mirror
//! across x (if `mirrored`), then rotate clockwise (seen from above, north
//! up) by `rotation`. Only the x/z plane is transformed; `y` is untouched.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Clockwise rotation about the y axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    #[strum(to_string = "0")]
    Deg0,
    #[strum(to_string = "90")]
    Deg90,
    #[strum(to_string = "180")]
    Deg180,
    #[strum(to_string = "270")]
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270];

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn inverse(self) -> Rotation {
        match self {
            Rotation::Deg0 => Rotation::Deg0,
            Rotation::Deg90 => Rotation::Deg270,
            Rotation::Deg180 => Rotation::Deg180,
            Rotation::Deg270 => Rotation::Deg90,
        }
    }

    /// Whether the rotation swaps the x and z extents
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Rotate `(x, z)` inside a `width` x `depth` footprint.
    fn apply(self, x: i32, z: i32, width: i32, depth: i32) -> (i32, i32) {
        match self {
            Rotation::Deg0 => (x, z),
            Rotation::Deg90 => (depth - 1 - z, x),
            Rotation::Deg180 => (width - 1 - x, depth - 1 - z),
            Rotation::Deg270 => (z, width - 1 - x),
        }
    }
}

/// Placement of a catalog room in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub rotation: Rotation,
    pub mirrored: bool,
}

impl Orientation {
    pub const IDENTITY: Orientation = Orientation::new(Rotation::Deg0, false);

    /// Search order used by the matcher: plain rotations first, then mirrored.
    pub const ALL: [Orientation; 8] = [
        Orientation::new(Rotation::Deg0, false),
        Orientation::new(Rotation::Deg90, false),
        Orientation::new(Rotation::Deg180, false),
        Orientation::new(Rotation::Deg270, false),
        Orientation::new(Rotation::Deg0, true),
        Orientation::new(Rotation::Deg90, true),
        Orientation::new(Rotation::Deg180, true),
        Orientation::new(Rotation::Deg270, true),
    ];

    pub const fn new(rotation: Rotation, mirrored: bool) -> Self {
        Self { rotation, mirrored }
    }

    /// Footprint `(width, depth)` in the world of a catalog footprint.
    pub fn world_footprint(self, width: i32, depth: i32) -> (i32, i32) {
        if self.rotation.swaps_axes() {
            (depth, width)
        } else {
            (width, depth)
        }
    }

    /// Map a catalog-local `(x, z)` to world-local coordinates.
    ///
    /// `width`/`depth` are the catalog grid's extents. Works for points
    /// outside the grid too (secret offsets may sit on the walls).
    pub fn to_world(self, x: i32, z: i32, width: i32, depth: i32) -> (i32, i32) {
        let x = if self.mirrored { width - 1 - x } else { x };
        self.rotation.apply(x, z, width, depth)
    }

    /// Map a world-local `(x, z)` back to catalog-local coordinates.
    pub fn to_catalog(self, x: i32, z: i32, width: i32, depth: i32) -> (i32, i32) {
        let (world_width, world_depth) = self.world_footprint(width, depth);
        let (cx, cz) = self.rotation.inverse().apply(x, z, world_width, world_depth);
        if self.mirrored {
            (width - 1 - cx, cz)
        } else {
            (cx, cz)
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.rotation)?;
        if self.mirrored {
            write!(f, " mirrored")?;
        }
        Ok(())
    }
}
