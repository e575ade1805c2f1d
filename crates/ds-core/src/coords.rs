//! Coordinate types for world blocks, map pixels and room grid cells.

use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Absolute block position in the world. `y` is vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl Add for BlockPos {
    type Output = BlockPos;

    fn add(self, rhs: BlockPos) -> BlockPos {
        self.offset(rhs.x, rhs.y, rhs.z)
    }
}

/// Pixel position on the overview map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MapPos {
    pub x: i32,
    pub y: i32,
}

impl MapPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Room slot on the dungeon grid. `(0, 0)` is the north-west slot.
///
/// Ordered row-major (`y` then `x`) so the smallest cell of a room is its
/// top-left slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Orthogonal neighbours: east, south, west, north.
    pub fn neighbors(self) -> [GridCell; 4] {
        [
            GridCell::new(self.x + 1, self.y),
            GridCell::new(self.x, self.y + 1),
            GridCell::new(self.x - 1, self.y),
            GridCell::new(self.x, self.y - 1),
        ]
    }
}

impl PartialOrd for GridCell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GridCell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}
