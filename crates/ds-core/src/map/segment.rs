//! Room slots on the map and their grouping into rooms.
//!
//! Once the slot width is known the map is a regular grid: slots of
//! `width` pixels separated by `gap` pixels. Two adjacent slots belong to
//! the same room when the gap between them is painted in the room's colour
//! along its top (or left) edge; doors only occupy the middle of a gap.

use std::collections::{BTreeMap, VecDeque};

use strum::{Display, EnumIter, IntoStaticStr};

use super::surface::{MapRoomKind, MapSurface};
use crate::coords::{GridCell, MapPos};

/// Footprint class of a room, keyed like the catalog's shape directories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum RoomShape {
    #[strum(serialize = "1x1")]
    OneByOne,
    #[strum(serialize = "1x2")]
    OneByTwo,
    #[strum(serialize = "1x3")]
    OneByThree,
    #[strum(serialize = "1x4")]
    OneByFour,
    #[strum(serialize = "2x2")]
    TwoByTwo,
    #[strum(serialize = "L-shape")]
    LShape,
}

impl RoomShape {
    /// Catalog shape id
    pub fn id(self) -> &'static str {
        self.into()
    }

    /// Infer the shape from slot count and bounding box.
    pub fn infer(cells: usize, extent: (i32, i32)) -> Option<Self> {
        let (long, short) = (extent.0.max(extent.1), extent.0.min(extent.1));
        match (cells, long, short) {
            (1, 1, 1) => Some(Self::OneByOne),
            (2, 2, 1) => Some(Self::OneByTwo),
            (3, 3, 1) => Some(Self::OneByThree),
            (3, 2, 2) => Some(Self::LShape),
            (4, 4, 1) => Some(Self::OneByFour),
            (4, 2, 2) => Some(Self::TwoByTwo),
            _ => None,
        }
    }
}

/// One discovered slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapCell {
    pub cell: GridCell,
    pub kind: MapRoomKind,
    /// Index into the footprint's segment list
    pub segment: usize,
}

/// Slots joined into one room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSegment {
    pub kind: MapRoomKind,
    /// Row-major sorted
    pub cells: Vec<GridCell>,
}

impl RoomSegment {
    pub fn contains(&self, cell: GridCell) -> bool {
        self.cells.binary_search(&cell).is_ok()
    }

    /// North-west corner slot of the bounding box
    pub fn min_cell(&self) -> GridCell {
        let x = self.cells.iter().map(|c| c.x).min().unwrap_or(0);
        let y = self.cells.iter().map(|c| c.y).min().unwrap_or(0);
        GridCell::new(x, y)
    }

    /// Bounding box size in slots, `(columns, rows)`
    pub fn extent(&self) -> (i32, i32) {
        let min = self.min_cell();
        let max_x = self.cells.iter().map(|c| c.x).max().unwrap_or(min.x);
        let max_y = self.cells.iter().map(|c| c.y).max().unwrap_or(min.y);
        (max_x - min.x + 1, max_y - min.y + 1)
    }

    pub fn shape(&self) -> Option<RoomShape> {
        RoomShape::infer(self.cells.len(), self.extent())
    }
}

/// Slot layout of the map, derived from the calibration marks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapGrid {
    /// Top-left pixel of slot (0, 0)
    pub origin: MapPos,
    pub room_width: u32,
    pub step: u32,
    pub columns: i32,
    pub rows: i32,
}

impl MapGrid {
    pub fn new(entrance: MapPos, room_width: u32, gap: u32, map_size: usize) -> Self {
        let step = room_width + gap;
        let origin = MapPos::new(
            entrance.x.rem_euclid(step as i32),
            entrance.y.rem_euclid(step as i32),
        );
        let fits = |start: i32| {
            let free = map_size as i32 - start - room_width as i32;
            if free < 0 { 0 } else { free / step as i32 + 1 }
        };
        Self {
            origin,
            room_width,
            step,
            columns: fits(origin.x),
            rows: fits(origin.y),
        }
    }

    /// Top-left pixel of a slot
    pub fn pixel_of(&self, cell: GridCell) -> MapPos {
        MapPos::new(
            self.origin.x + cell.x * self.step as i32,
            self.origin.y + cell.y * self.step as i32,
        )
    }

    fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.rows).flat_map(move |y| (0..self.columns).map(move |x| GridCell::new(x, y)))
    }

    /// Whether `a` and its east/south neighbour `b` share a room on the map
    fn joined(&self, map: &MapSurface, a: GridCell, b: GridCell, color: u8) -> bool {
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let p = self.pixel_of(first);
        let width = self.room_width as i32;
        let probe = if second.x > first.x {
            MapPos::new(p.x + width, p.y)
        } else {
            MapPos::new(p.x, p.y + width)
        };
        map.color(probe.x, probe.y) == Some(color)
    }
}

/// Find every discovered slot and group slots into rooms.
pub fn scan_rooms(map: &MapSurface, grid: &MapGrid) -> (Vec<MapCell>, Vec<RoomSegment>) {
    let mut discovered: BTreeMap<GridCell, (u8, MapRoomKind)> = BTreeMap::new();
    for cell in grid.cells() {
        let p = grid.pixel_of(cell);
        if let Some(color) = map.color(p.x, p.y) {
            if let Some(kind) = MapRoomKind::from_color(color) {
                discovered.insert(cell, (color, kind));
            }
        }
    }

    let mut assigned: BTreeMap<GridCell, usize> = BTreeMap::new();
    let mut segments = Vec::new();
    for (&start, &(color, kind)) in &discovered {
        if assigned.contains_key(&start) {
            continue;
        }
        let index = segments.len();
        let mut cells = Vec::new();
        let mut queue = VecDeque::from([start]);
        assigned.insert(start, index);
        while let Some(cell) = queue.pop_front() {
            cells.push(cell);
            for next in cell.neighbors() {
                if assigned.contains_key(&next) {
                    continue;
                }
                let same_color = discovered.get(&next).is_some_and(|(c, _)| *c == color);
                if same_color && grid.joined(map, cell, next, color) {
                    assigned.insert(next, index);
                    queue.push_back(next);
                }
            }
        }
        cells.sort();
        segments.push(RoomSegment { kind, cells });
    }

    let cells = discovered
        .iter()
        .map(|(cell, (_, kind))| MapCell {
            cell: *cell,
            kind: *kind,
            segment: assigned[cell],
        })
        .collect();
    (cells, segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 16;

    fn paint_room(map: &mut MapSurface, grid: &MapGrid, cells: &[(i32, i32)], color: u8) {
        for &(x, y) in cells {
            let p = grid.pixel_of(GridCell::new(x, y));
            map.fill_rect(p.x, p.y, W, W, color);
        }
        // Fill the gaps between slots of the same room.
        for &(x, y) in cells {
            let p = grid.pixel_of(GridCell::new(x, y));
            if cells.contains(&(x + 1, y)) {
                map.fill_rect(p.x + W as i32, p.y, 4, W, color);
            }
            if cells.contains(&(x, y + 1)) {
                map.fill_rect(p.x, p.y + W as i32, W, 4, color);
            }
        }
    }

    #[test]
    fn test_grid_layout() {
        let grid = MapGrid::new(MapPos::new(45, 5), W, 4, 128);
        assert_eq!(grid.origin, MapPos::new(5, 5));
        assert_eq!(grid.columns, 6);
        assert_eq!(grid.rows, 6);
        assert_eq!(grid.pixel_of(GridCell::new(2, 0)), MapPos::new(45, 5));
    }

    #[test]
    fn test_shape_inference() {
        assert_eq!(RoomShape::infer(1, (1, 1)), Some(RoomShape::OneByOne));
        assert_eq!(RoomShape::infer(2, (1, 2)), Some(RoomShape::OneByTwo));
        assert_eq!(RoomShape::infer(3, (3, 1)), Some(RoomShape::OneByThree));
        assert_eq!(RoomShape::infer(3, (2, 2)), Some(RoomShape::LShape));
        assert_eq!(RoomShape::infer(4, (1, 4)), Some(RoomShape::OneByFour));
        assert_eq!(RoomShape::infer(4, (2, 2)), Some(RoomShape::TwoByTwo));
        assert_eq!(RoomShape::infer(4, (3, 2)), None);
        assert_eq!(RoomShape::LShape.id(), "L-shape");
        assert_eq!(RoomShape::OneByTwo.to_string(), "1x2");
    }

    #[test]
    fn test_segments_follow_gaps() {
        let grid = MapGrid::new(MapPos::new(45, 5), W, 4, 128);
        let mut map = MapSurface::blank(128);
        paint_room(&mut map, &grid, &[(2, 0)], 30);
        paint_room(&mut map, &grid, &[(2, 1), (3, 1)], 63);
        // Same colour, adjacent, but a separate room: only a door joins them.
        paint_room(&mut map, &grid, &[(2, 2)], 63);
        paint_room(&mut map, &grid, &[(0, 3), (1, 3), (0, 4)], 63);

        let (cells, segments) = scan_rooms(&map, &grid);
        assert_eq!(cells.len(), 7);
        assert_eq!(segments.len(), 4);

        let shapes: Vec<_> = segments.iter().map(|s| s.shape()).collect();
        assert_eq!(
            shapes,
            vec![
                Some(RoomShape::OneByOne),
                Some(RoomShape::OneByTwo),
                Some(RoomShape::OneByOne),
                Some(RoomShape::LShape),
            ]
        );
        assert_eq!(segments[1].cells, vec![GridCell::new(2, 1), GridCell::new(3, 1)]);
        assert_eq!(segments[3].min_cell(), GridCell::new(0, 3));
        assert_eq!(segments[0].kind, MapRoomKind::Entrance);

        let l_cell = cells.iter().find(|c| c.cell == GridCell::new(0, 4)).unwrap();
        assert_eq!(l_cell.segment, 3);
    }
}
