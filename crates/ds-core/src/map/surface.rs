//! The overview map pixel buffer and its calibration marks.

use crate::config::MapCalibration;
use crate::coords::MapPos;

/// Square buffer of map colour ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSurface {
    size: usize,
    colors: Vec<u8>,
}

impl MapSurface {
    /// Wrap a row-major colour buffer; `None` if it is not `size * size`.
    pub fn new(size: usize, colors: Vec<u8>) -> Option<Self> {
        (colors.len() == size * size).then_some(Self { size, colors })
    }

    /// An all-zero (unexplored) surface
    pub fn blank(size: usize) -> Self {
        Self {
            size,
            colors: vec![0; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn color(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x as usize >= self.size || y as usize >= self.size {
            return None;
        }
        Some(self.colors[y as usize * self.size + x as usize])
    }

    /// Paint a rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: u8) {
        for py in y.max(0)..(y + height as i32).min(self.size as i32) {
            for px in x.max(0)..(x + width as i32).min(self.size as i32) {
                self.colors[py as usize * self.size + px as usize] = color;
            }
        }
    }
}

/// Room classification by map colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapRoomKind {
    Entrance,
    Normal,
    Puzzle,
    Trap,
    Miniboss,
    Fairy,
    Blood,
    /// Discovered but not yet opened
    Unopened,
}

impl MapRoomKind {
    pub fn from_color(color: u8) -> Option<Self> {
        match color {
            30 => Some(Self::Entrance),
            63 => Some(Self::Normal),
            66 => Some(Self::Puzzle),
            62 => Some(Self::Trap),
            74 => Some(Self::Miniboss),
            82 => Some(Self::Fairy),
            18 => Some(Self::Blood),
            85 => Some(Self::Unopened),
            _ => None,
        }
    }
}

/// Top-left pixel of the entrance room, scanning row by row.
pub fn find_entrance(map: &MapSurface, calibration: &MapCalibration) -> Option<MapPos> {
    let entrance = calibration.entrance_color;
    let size = map.size() as i32;
    for y in 0..size {
        for x in 0..size {
            if map.color(x, y) != Some(entrance) {
                continue;
            }
            if map.color(x - 1, y) != Some(entrance) && map.color(x, y - 1) != Some(entrance) {
                return Some(MapPos::new(x, y));
            }
        }
    }
    None
}

/// Pixel width of a room slot, measured along the entrance's top row.
///
/// `None` unless the run matches one of the configured widths; a partly
/// rendered map is retried later.
pub fn measure_room_width(
    map: &MapSurface,
    entrance: MapPos,
    calibration: &MapCalibration,
) -> Option<u32> {
    let color = map.color(entrance.x, entrance.y)?;
    let run = (entrance.x..map.size() as i32)
        .take_while(|x| map.color(*x, entrance.y) == Some(color))
        .count() as u32;
    calibration.room_widths.contains(&run).then_some(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_bounds() {
        let mut map = MapSurface::blank(8);
        map.fill_rect(6, 6, 4, 4, 63);
        assert_eq!(map.color(7, 7), Some(63));
        assert_eq!(map.color(5, 5), Some(0));
        assert_eq!(map.color(8, 0), None);
        assert!(MapSurface::new(8, vec![0; 10]).is_none());
    }

    #[test]
    fn test_find_entrance_and_width() {
        let calibration = MapCalibration::default();
        let mut map = MapSurface::blank(128);
        assert_eq!(find_entrance(&map, &calibration), None);

        map.fill_rect(45, 5, 16, 16, 30);
        let entrance = find_entrance(&map, &calibration).unwrap();
        assert_eq!(entrance, MapPos::new(45, 5));
        assert_eq!(measure_room_width(&map, entrance, &calibration), Some(16));
    }

    #[test]
    fn test_partial_entrance_has_no_width() {
        let calibration = MapCalibration::default();
        let mut map = MapSurface::blank(128);
        map.fill_rect(45, 5, 10, 16, 30);
        let entrance = find_entrance(&map, &calibration).unwrap();
        assert_eq!(measure_room_width(&map, entrance, &calibration), None);
    }

    #[test]
    fn test_room_kinds() {
        assert_eq!(MapRoomKind::from_color(63), Some(MapRoomKind::Normal));
        assert_eq!(MapRoomKind::from_color(18), Some(MapRoomKind::Blood));
        assert_eq!(MapRoomKind::from_color(0), None);
    }
}
