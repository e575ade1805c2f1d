//! Feature configuration.
//!
//! The toggles themselves belong to the host; this is the shape the core
//! reads them in. Stored as JSON, every field optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::coords::{BlockPos, GridCell};
use crate::error::CatalogError;
use crate::metadata::ResourceId;

/// Default file name inside the config directory
pub const CONFIG_FILE: &str = "dungeon-secrets.json";

/// Placement of the room grid in the world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonGeometry {
    /// World x of the west edge of grid column 0
    pub origin_x: i32,
    /// World z of the north edge of grid row 0
    pub origin_z: i32,
    /// Blocks between the starts of adjacent room slots
    pub room_stride: i32,
    /// Blocks a single-slot room spans
    pub room_size: i32,
    /// World y of voxel layer 0
    pub base_y: i32,
}

impl Default for DungeonGeometry {
    fn default() -> Self {
        Self {
            origin_x: -200,
            origin_z: -200,
            room_stride: 32,
            room_size: 31,
            base_y: 0,
        }
    }
}

impl DungeonGeometry {
    /// Positive slot sizes, and rooms no larger than their slots
    pub fn is_valid(&self) -> bool {
        self.room_stride > 0 && self.room_size > 0 && self.room_size <= self.room_stride
    }

    /// Grid slot containing a world position; `None` for a non-positive stride.
    pub fn cell_of(&self, pos: BlockPos) -> Option<GridCell> {
        if self.room_stride <= 0 {
            return None;
        }
        Some(GridCell::new(
            (pos.x - self.origin_x).div_euclid(self.room_stride),
            (pos.z - self.origin_z).div_euclid(self.room_stride),
        ))
    }

    /// North-west corner of a grid slot at `base_y`
    pub fn corner_of(&self, cell: GridCell) -> BlockPos {
        BlockPos::new(
            self.origin_x + cell.x * self.room_stride,
            self.base_y,
            self.origin_z + cell.y * self.room_stride,
        )
    }

    /// Block extent of a room spanning `cells` slots along one axis
    pub fn span(&self, cells: i32) -> i32 {
        (cells - 1) * self.room_stride + self.room_size
    }
}

/// How the overview map is drawn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapCalibration {
    /// Side length of the square map surface, in pixels
    pub size: usize,
    /// Map colour of the entrance room
    pub entrance_color: u8,
    /// Pixel widths a room slot may have
    pub room_widths: Vec<u32>,
    /// Pixels between adjacent room slots
    pub gap: u32,
}

impl Default for MapCalibration {
    fn default() -> Self {
        Self {
            size: 128,
            entrance_color: 30,
            room_widths: vec![16, 18],
            gap: 4,
        }
    }
}

/// All options read by the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Skip loading the catalog entirely; checked once at init
    pub no_load_secret_waypoints: bool,
    /// Sample and match while in a dungeon; checked every tick
    pub secret_waypoints: bool,
    /// Ticks between samples
    pub sample_interval_ticks: u32,
    /// Hotbar slot holding the overview map
    pub map_slot: usize,
    /// Catalog partition to match against
    pub dungeon_type: String,
    /// Resource namespace of the metadata documents
    pub namespace: String,
    pub rooms_resource: String,
    pub secrets_resource: String,
    pub geometry: DungeonGeometry,
    pub map: MapCalibration,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            no_load_secret_waypoints: false,
            secret_waypoints: true,
            sample_interval_ticks: 10,
            map_slot: 8,
            dungeon_type: "catacombs".to_string(),
            namespace: "skyblocker".to_string(),
            rooms_resource: "dungeons/dungeonrooms.json".to_string(),
            secrets_resource: "dungeons/secretlocations.json".to_string(),
            geometry: DungeonGeometry::default(),
            map: MapCalibration::default(),
        }
    }
}

impl SecretsConfig {
    /// `<config dir>/dungeon-secrets.json`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Load from a JSON file; a missing file yields the defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: SecretsConfig =
            serde_json::from_str(&content).map_err(|e| CatalogError::Config {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        config.validate(path)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| CatalogError::Config {
            path: path.as_ref().display().to_string(),
            reason: e.to_string(),
        })?;
        fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self, path: &Path) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::Config {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };
        if self.sample_interval_ticks == 0 {
            return Err(invalid("sample_interval_ticks must be positive"));
        }
        if !self.geometry.is_valid() {
            return Err(invalid(
                "room_stride and room_size must be positive, room_size at most room_stride",
            ));
        }
        if self.map.room_widths.is_empty() {
            return Err(invalid("map.room_widths cannot be empty"));
        }
        Ok(())
    }

    pub fn rooms_resource_id(&self) -> ResourceId {
        ResourceId::new(&self.namespace, &self.rooms_resource)
    }

    pub fn secrets_resource_id(&self) -> ResourceId {
        ResourceId::new(&self.namespace, &self.secrets_resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SecretsConfig::default();
        assert_eq!(config.sample_interval_ticks, 10);
        assert_eq!(config.map_slot, 8);
        assert_eq!(
            config.rooms_resource_id().to_string(),
            "skyblocker:dungeons/dungeonrooms.json"
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SecretsConfig =
            serde_json::from_str(r#"{ "secret_waypoints": false, "geometry": { "base_y": 68 } }"#)
                .unwrap();
        assert!(!config.secret_waypoints);
        assert_eq!(config.geometry.base_y, 68);
        assert_eq!(config.geometry.room_stride, 32);
        assert_eq!(config.map.entrance_color, 30);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = SecretsConfig::load_from_file(dir.path().join("nope.json")).unwrap();
        assert_eq!(config, SecretsConfig::default());
    }

    #[test]
    fn test_save_and_reject_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = SecretsConfig::default();
        config.dungeon_type = "master".to_string();
        config.save_to_file(&path).unwrap();
        assert_eq!(SecretsConfig::load_from_file(&path).unwrap(), config);

        config.sample_interval_ticks = 0;
        config.save_to_file(&path).unwrap();
        assert!(matches!(
            SecretsConfig::load_from_file(&path),
            Err(CatalogError::Config { .. })
        ));
    }

    #[test]
    fn test_geometry_cells() {
        let geo = DungeonGeometry::default();
        assert_eq!(geo.cell_of(BlockPos::new(-200, 70, -200)), Some(GridCell::new(0, 0)));
        assert_eq!(geo.cell_of(BlockPos::new(-137, 70, -169)), Some(GridCell::new(1, 0)));
        assert_eq!(geo.cell_of(BlockPos::new(-201, 70, -200)), Some(GridCell::new(-1, 0)));

        let flat = DungeonGeometry {
            room_stride: 0,
            ..DungeonGeometry::default()
        };
        assert!(!flat.is_valid());
        assert_eq!(flat.cell_of(BlockPos::new(0, 0, 0)), None);

        assert_eq!(geo.corner_of(GridCell::new(2, 1)), BlockPos::new(-136, 0, -168));
        assert_eq!(geo.span(1), 31);
        assert_eq!(geo.span(2), 63);
    }
}
