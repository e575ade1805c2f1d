//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ds_core::codec::encode_room;
use ds_core::{BlockPos, BlockSource, GridDims, RoomVoxelGrid};

pub const GRASS: u8 = 6;
pub const STONE: u8 = 1;

/// 4x4x4 grass with a stone block at `(mx, 0, mz)`
pub fn marked_room(mx: u16, mz: u16) -> RoomVoxelGrid {
    RoomVoxelGrid::from_fn(GridDims::new(4, 4, 4), |x, y, z| {
        if (x, y, z) == (mx, 0, mz) { STONE } else { GRASS }
    })
    .unwrap()
}

pub fn write_room(root: &Path, dungeon: &str, shape: &str, name: &str, grid: &RoomVoxelGrid) {
    let dir = root.join(dungeon).join(shape);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{name}.skeleton")), encode_room(grid).unwrap()).unwrap();
}

pub fn write_raw(root: &Path, dungeon: &str, shape: &str, file: &str, bytes: &[u8]) {
    let dir = root.join(dungeon).join(shape);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), bytes).unwrap();
}

pub const ROOMS_JSON: &str = r#"{
    "A": { "name": "Alpha", "type": "normal", "secrets": 1 },
    "B": { "name": "Bravo", "type": "normal", "secrets": 0 }
}"#;

pub const SECRETS_JSON: &str = r#"{
    "A": [ { "secretName": "1 - Item", "category": "item", "x": 2, "y": 0, "z": 1 } ]
}"#;

/// Write both metadata documents under `<root>/assets/skyblocker/dungeons`.
pub fn write_metadata(root: &Path, rooms: &str, secrets: &str) {
    let dir = root.join("assets").join("skyblocker").join("dungeons");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("dungeonrooms.json"), rooms).unwrap();
    fs::write(dir.join("secretlocations.json"), secrets).unwrap();
}

/// A sparse world of palette codes
#[derive(Default)]
pub struct TestWorld {
    blocks: HashMap<BlockPos, u8>,
}

impl TestWorld {
    /// Place `grid` (already in world orientation) with its origin at `anchor`.
    pub fn place(&mut self, anchor: BlockPos, grid: &RoomVoxelGrid) {
        for (x, y, z, code) in grid.defined_cells() {
            self.blocks.insert(anchor.offset(x, y, z), code);
        }
    }
}

impl BlockSource for TestWorld {
    fn block_at(&self, pos: BlockPos) -> Option<u8> {
        Some(self.blocks.get(&pos).copied().unwrap_or(0))
    }
}
