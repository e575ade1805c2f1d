mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::*;
use ds_core::map::PlayerView;
use ds_core::matcher::place_grid;
use ds_core::metadata::DirResourceProvider;
use ds_core::{
    BlockPos, DirCatalogSource, DungeonGeometry, DungeonSecrets, GridDims, HeldItem, HostSnapshot,
    MapSurface, Orientation, ResourceGate, RoomVoxelGrid, Rotation, SecretCategory, SecretsConfig,
    TickOutcome,
};

/// Rooms are 4 blocks wide on a 5-block stride, floors at y=64.
fn config() -> SecretsConfig {
    SecretsConfig {
        geometry: DungeonGeometry {
            origin_x: 0,
            origin_z: 0,
            room_stride: 5,
            room_size: 4,
            base_y: 64,
        },
        ..SecretsConfig::default()
    }
}

/// Entrance in slot (0, 0), a normal room in slot (1, 1).
fn dungeon_map() -> MapSurface {
    let mut map = MapSurface::blank(128);
    map.fill_rect(5, 5, 16, 16, 30);
    map.fill_rect(25, 25, 16, 16, 63);
    map
}

struct Fixture {
    secrets: DungeonSecrets,
    world: TestWorld,
    map: MapSurface,
    _catalog: tempfile::TempDir,
    _resources: tempfile::TempDir,
}

/// A facade whose catalog has finished loading
fn loaded_secrets(catalog: &Path, resources: &Path) -> DungeonSecrets {
    let gate = ResourceGate::with_provider(Arc::new(DirResourceProvider::new(resources)));
    let mut secrets = DungeonSecrets::new(
        config(),
        Arc::new(DirCatalogSource::new(catalog)),
        Arc::new(gate),
    );
    secrets.init();
    assert!(secrets.load_handle().unwrap().wait_timeout(Duration::from_secs(10)));
    assert!(secrets.is_catalog_ready());
    secrets
}

fn fixture(placed_as: Orientation) -> Fixture {
    let catalog = tempfile::tempdir().unwrap();
    let resources = tempfile::tempdir().unwrap();
    let room_a = marked_room(0, 0);
    write_room(catalog.path(), "catacombs", "1x1", "A", &room_a);
    write_room(catalog.path(), "catacombs", "1x1", "B", &marked_room(1, 0));
    write_metadata(resources.path(), ROOMS_JSON, SECRETS_JSON);

    let mut world = TestWorld::default();
    world.place(BlockPos::new(5, 64, 5), &place_grid(&room_a, placed_as));

    Fixture {
        secrets: loaded_secrets(catalog.path(), resources.path()),
        world,
        map: dungeon_map(),
        _catalog: catalog,
        _resources: resources,
    }
}

fn snapshot<'a>(
    tick: u64,
    hotbar: &'a [Option<HeldItem<'a>>],
    world: &'a TestWorld,
    position: BlockPos,
) -> HostSnapshot<'a> {
    HostSnapshot {
        tick,
        dungeon_instance: Some(7),
        player: Some(PlayerView { position }),
        hotbar,
        world: Some(world),
    }
}

fn hotbar(map: &MapSurface) -> Vec<Option<HeldItem<'_>>> {
    let mut hotbar = vec![None; 9];
    hotbar[8] = Some(HeldItem::FilledMap(Some(map)));
    hotbar
}

#[test]
fn test_resolves_rotated_room_secrets() {
    let mut fx = fixture(Orientation::new(Rotation::Deg90, false));
    let hotbar = hotbar(&fx.map);
    let inside = BlockPos::new(6, 65, 7);

    let outcome = fx.secrets.on_tick(&snapshot(10, &hotbar, &fx.world, inside));
    let TickOutcome::Resolved(room) = outcome else {
        panic!("expected a resolved room, got {outcome:?}");
    };
    assert_eq!(room.name, "A");
    assert_eq!(room.orientation, Orientation::new(Rotation::Deg90, false));
    assert_eq!(room.anchor, BlockPos::new(5, 64, 5));

    let secrets = fx.secrets.current_secrets();
    assert_eq!(secrets.len(), 1);
    assert_eq!(secrets[0].category, SecretCategory::Item);
    // (2, 0, 1) rotated 90° clockwise in a 4x4 room is (2, 0, 2).
    assert_eq!(secrets[0].pos, BlockPos::new(7, 64, 7));
}

#[test]
fn test_off_cadence_ticks_do_nothing() {
    let mut fx = fixture(Orientation::IDENTITY);
    let hotbar = hotbar(&fx.map);
    let inside = BlockPos::new(6, 65, 7);

    assert_eq!(
        fx.secrets.on_tick(&snapshot(11, &hotbar, &fx.world, inside)),
        TickOutcome::NotObserved
    );
    assert!(fx.secrets.current_secrets().is_empty());
    assert!(matches!(
        fx.secrets.on_tick(&snapshot(20, &hotbar, &fx.world, inside)),
        TickOutcome::Resolved(_)
    ));
}

#[test]
fn test_unexplored_room_is_retried() {
    let mut fx = fixture(Orientation::new(Rotation::Deg270, false));
    let hotbar = hotbar(&fx.map);
    let inside = BlockPos::new(6, 65, 7);
    let placed = std::mem::take(&mut fx.world);

    let empty = TestWorld::default();
    let outcome = fx.secrets.on_tick(&snapshot(10, &hotbar, &empty, inside));
    assert_eq!(
        outcome,
        TickOutcome::Unresolved(ds_core::MatchResult::InsufficientObservation)
    );

    let outcome = fx.secrets.on_tick(&snapshot(20, &hotbar, &placed, inside));
    let TickOutcome::Resolved(room) = outcome else {
        panic!("expected a resolved room, got {outcome:?}");
    };
    assert_eq!(room.orientation, Orientation::new(Rotation::Deg270, false));
}

#[test]
fn test_undiscovered_slot_is_no_room() {
    let mut fx = fixture(Orientation::IDENTITY);
    let hotbar = hotbar(&fx.map);
    // Slot (3, 3) is not drawn on the map.
    let outcome = fx.secrets.on_tick(&snapshot(10, &hotbar, &fx.world, BlockPos::new(16, 65, 16)));
    assert_eq!(outcome, TickOutcome::NoRoom);
}

#[test]
fn test_zero_stride_config_never_panics() {
    let mut fx = fixture(Orientation::IDENTITY);
    let hotbar = hotbar(&fx.map);
    let mut config = config();
    config.geometry.room_stride = 0;
    fx.secrets.set_config(config);

    let outcome = fx.secrets.on_tick(&snapshot(10, &hotbar, &fx.world, BlockPos::new(6, 65, 7)));
    assert_eq!(outcome, TickOutcome::NotObserved);
    assert!(fx.secrets.current_secrets().is_empty());
}

#[test]
fn test_new_run_clears_matches() {
    let mut fx = fixture(Orientation::IDENTITY);
    let hotbar = hotbar(&fx.map);
    let inside = BlockPos::new(6, 65, 7);
    assert!(matches!(
        fx.secrets.on_tick(&snapshot(10, &hotbar, &fx.world, inside)),
        TickOutcome::Resolved(_)
    ));
    assert_eq!(fx.secrets.session().matched_rooms().count(), 1);

    let mut next_run = snapshot(21, &hotbar, &fx.world, inside);
    next_run.dungeon_instance = Some(8);
    assert_eq!(fx.secrets.on_tick(&next_run), TickOutcome::NotObserved);
    assert_eq!(fx.secrets.session().matched_rooms().count(), 0);
    assert!(fx.secrets.current_secrets().is_empty());
}

#[test]
fn test_room_matched_again_when_footprint_grows() {
    let catalog = tempfile::tempdir().unwrap();
    let resources = tempfile::tempdir().unwrap();
    // The west half of "Long" looks exactly like "A".
    let long = RoomVoxelGrid::from_fn(GridDims::new(9, 4, 4), |x, y, z| {
        if (x, y, z) == (0, 0, 0) || (x, y, z) == (8, 0, 3) { STONE } else { GRASS }
    })
    .unwrap();
    write_room(catalog.path(), "catacombs", "1x1", "A", &marked_room(0, 0));
    write_room(catalog.path(), "catacombs", "1x2", "Long", &long);
    write_metadata(resources.path(), ROOMS_JSON, SECRETS_JSON);

    let mut world = TestWorld::default();
    world.place(BlockPos::new(5, 64, 5), &long);
    let mut secrets = loaded_secrets(catalog.path(), resources.path());
    let inside = BlockPos::new(6, 65, 7);

    let partial = dungeon_map();
    let hotbar_partial = hotbar(&partial);
    let outcome = secrets.on_tick(&snapshot(10, &hotbar_partial, &world, inside));
    let TickOutcome::Resolved(room) = outcome else {
        panic!("expected a resolved room, got {outcome:?}");
    };
    assert_eq!((room.shape.as_str(), room.name.as_str()), ("1x1", "A"));
    assert_eq!(secrets.current_secrets().len(), 1);

    // Slots (1, 1) and (2, 1) drawn as one room, gap included.
    let mut full = dungeon_map();
    full.fill_rect(25, 25, 36, 16, 63);
    let hotbar_full = hotbar(&full);
    let outcome = secrets.on_tick(&snapshot(20, &hotbar_full, &world, inside));
    let TickOutcome::Resolved(room) = outcome else {
        panic!("expected a resolved room, got {outcome:?}");
    };
    assert_eq!((room.shape.as_str(), room.name.as_str()), ("1x2", "Long"));
    assert_eq!(room.orientation, Orientation::IDENTITY);
    assert!(secrets.current_secrets().is_empty());
    assert_eq!(secrets.session().matched_rooms().count(), 1);

    // Standing in the east slot now finds the same cached room.
    let east = BlockPos::new(11, 65, 7);
    let outcome = secrets.on_tick(&snapshot(30, &hotbar_full, &world, east));
    assert_eq!(outcome, TickOutcome::Resolved(room));
}
