//! Async Catalog Loader.
//!
//! [`CatalogLoader::begin_load`] starts a single background load and hands
//! out a [`LoadHandle`]; later calls return the same handle. The load fans
//! out with rayon: one task per dungeon, per shape directory and per room
//! file. Each task returns its own result, the joins merge them, and the
//! metadata documents are read by a sibling thread joined at the top. No
//! task failure aborts the aggregate: it is logged, recorded in the
//! [`LoadReport`] and the entry is left out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info};
use parking_lot::{Condvar, Mutex};
use rayon::prelude::*;

use crate::catalog::{
    self, CatalogSource, DungeonRooms, LoadFailure, RoomCatalog, ShapeBucket,
};
use crate::config::SecretsConfig;
use crate::error::CatalogError;
use crate::metadata::{
    read_document, ResourceGate, ResourceId, RoomMetadata, SecretWaypointTable,
};

/// Everything the matcher and resolver read. Immutable once built.
#[derive(Debug, Default)]
pub struct RoomLibrary {
    pub catalog: RoomCatalog,
    /// `None` when the rooms document failed to load
    pub rooms: Option<RoomMetadata>,
    /// `None` when the secrets document failed to load; matched rooms then
    /// resolve to no secrets
    pub secrets: Option<SecretWaypointTable>,
}

/// Outcome of one load, including every contained failure
#[derive(Debug, Default)]
pub struct LoadReport {
    pub dungeons: usize,
    pub shapes: usize,
    pub rooms: usize,
    /// Per-file, per-directory and per-document failures
    pub failures: Vec<LoadFailure>,
    /// Set when the catalog root itself could not be enumerated
    pub fatal: Option<CatalogError>,
    pub elapsed: Duration,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.fatal.is_none()
    }
}

/// Identifiers of the two metadata documents
#[derive(Debug, Clone)]
pub struct MetadataIds {
    pub rooms: ResourceId,
    pub secrets: ResourceId,
}

impl MetadataIds {
    pub fn from_config(config: &SecretsConfig) -> Self {
        Self {
            rooms: config.rooms_resource_id(),
            secrets: config.secrets_resource_id(),
        }
    }
}

impl RoomLibrary {
    /// Load the whole library on the calling thread (rayon does the fan-out).
    ///
    /// Only a failure to enumerate the catalog root is returned as an error;
    /// everything smaller is contained and listed in the report.
    pub fn load(
        source: &dyn CatalogSource,
        resources: &ResourceGate,
        ids: &MetadataIds,
    ) -> Result<(RoomLibrary, LoadReport), CatalogError> {
        let started = Instant::now();
        // Listed before the metadata task starts: that task may wait in the
        // gate forever, and a fatal error must still be reported.
        let dungeons = source.dungeons()?;
        // The metadata task gets its own thread instead of occupying a
        // rayon worker while it waits.
        let ((catalog, mut failures), metadata) = thread::scope(|scope| {
            let metadata = scope.spawn(|| load_metadata(resources, ids));
            (load_dungeons(source, &dungeons), metadata.join())
        });
        let (rooms, secrets, metadata_failures) = metadata.unwrap_or_else(|_| {
            error!("Dungeon secrets metadata task panicked");
            (None, None, Vec::new())
        });
        failures.extend(metadata_failures);

        let report = LoadReport {
            dungeons: catalog.dungeon_count(),
            shapes: catalog.shape_count(),
            rooms: catalog.room_count(),
            failures,
            fatal: None,
            elapsed: started.elapsed(),
        };
        info!(
            "Loaded dungeon secrets for {} dungeon(s), {} room shapes, and {} rooms total in {:?} ({} failure(s))",
            report.dungeons,
            report.shapes,
            report.rooms,
            report.elapsed,
            report.failures.len()
        );
        Ok((RoomLibrary { catalog, rooms, secrets }, report))
    }
}

/// Decode the catalog tree. Fails only if the root cannot be listed.
pub fn load_catalog(
    source: &dyn CatalogSource,
) -> Result<(RoomCatalog, Vec<LoadFailure>), CatalogError> {
    let dungeons = source.dungeons()?;
    Ok(load_dungeons(source, &dungeons))
}

fn load_dungeons(
    source: &dyn CatalogSource,
    dungeons: &[String],
) -> (RoomCatalog, Vec<LoadFailure>) {
    let loaded: Vec<_> = dungeons
        .par_iter()
        .map(|dungeon| (dungeon, load_dungeon(source, dungeon)))
        .collect();

    let mut catalog = RoomCatalog::new();
    let mut failures = Vec::new();
    for (dungeon, result) in loaded {
        match result {
            Ok((rooms, dungeon_failures)) => {
                catalog.insert_dungeon(dungeon.clone(), rooms);
                failures.extend(dungeon_failures);
            }
            Err(failure) => failures.push(failure),
        }
    }
    (catalog, failures)
}

fn load_dungeon(
    source: &dyn CatalogSource,
    dungeon: &str,
) -> Result<(DungeonRooms, Vec<LoadFailure>), LoadFailure> {
    let shapes = source.room_shapes(dungeon).map_err(|error| {
        error!("Failed to load dungeon secrets for dungeon {}: {}", dungeon, error);
        LoadFailure {
            path: source.describe(&[dungeon]),
            error,
        }
    })?;

    let loaded: Vec<_> = shapes
        .par_iter()
        .map(|shape| (shape, load_shape(source, dungeon, shape)))
        .collect();

    let mut rooms = DungeonRooms::new();
    let mut failures = Vec::new();
    for (shape, (bucket, shape_failures)) in loaded {
        failures.extend(shape_failures);
        if let Some(bucket) = bucket {
            rooms.insert(shape.clone(), bucket);
        }
    }
    debug!(
        "Loaded dungeon secrets for dungeon {} with {} room shapes and {} rooms total",
        dungeon,
        rooms.len(),
        rooms.values().map(ShapeBucket::len).sum::<usize>()
    );
    Ok((rooms, failures))
}

fn load_shape(
    source: &dyn CatalogSource,
    dungeon: &str,
    shape: &str,
) -> (Option<ShapeBucket>, Vec<LoadFailure>) {
    let files = match source.room_files(dungeon, shape) {
        Ok(files) => files,
        Err(error) => {
            error!("Failed to load dungeon secrets room shape {}: {}", shape, error);
            let path = source.describe(&[dungeon, shape]);
            return (None, vec![LoadFailure { path, error }]);
        }
    };

    let (rooms, mut failures): (Vec<_>, Vec<_>) = files
        .par_iter()
        .map(|file| catalog::load_room(source, dungeon, shape, file))
        .partition_map(|result| match result {
            Ok(room) => rayon::iter::Either::Left(room),
            Err(failure) => rayon::iter::Either::Right(failure),
        });

    let (bucket, dropped) = ShapeBucket::from_rooms(shape, rooms);
    failures.extend(dropped);
    debug!(
        "Loaded dungeon secrets room shape {} with {} rooms",
        shape,
        bucket.len()
    );
    if bucket.is_empty() {
        (None, failures)
    } else {
        (Some(bucket), failures)
    }
}

/// Read both metadata documents once the host's resources are available.
///
/// Each document fails on its own; a failure leaves that document `None`.
fn load_metadata(
    resources: &ResourceGate,
    ids: &MetadataIds,
) -> (Option<RoomMetadata>, Option<SecretWaypointTable>, Vec<LoadFailure>) {
    let provider = resources.wait();
    let mut failures = Vec::new();

    let rooms = read_document(provider.as_ref(), &ids.rooms, RoomMetadata::from_reader)
        .map_err(|error| {
            error!("Failed to load dungeon secrets json {}: {}", ids.rooms, error);
            failures.push(LoadFailure {
                path: ids.rooms.to_string(),
                error,
            });
        })
        .ok();
    let secrets = read_document(provider.as_ref(), &ids.secrets, SecretWaypointTable::from_reader)
        .map_err(|error| {
            error!("Failed to load dungeon secrets json {}: {}", ids.secrets, error);
            failures.push(LoadFailure {
                path: ids.secrets.to_string(),
                error,
            });
        })
        .ok();

    if failures.is_empty() {
        debug!("Loaded dungeon secrets json");
    }
    (rooms, secrets, failures)
}

struct LoadShared {
    done: AtomicBool,
    library: OnceLock<Arc<RoomLibrary>>,
    report: OnceLock<LoadReport>,
    lock: Mutex<()>,
    finished: Condvar,
}

impl LoadShared {
    fn finish(&self, library: Option<RoomLibrary>, report: LoadReport) {
        if let Some(library) = library {
            let _ = self.library.set(Arc::new(library));
        }
        let _ = self.report.set(report);
        let _guard = self.lock.lock();
        self.done.store(true, Ordering::Release);
        self.finished.notify_all();
    }
}

/// Shared view of one catalog load
#[derive(Clone)]
pub struct LoadHandle {
    shared: Arc<LoadShared>,
}

impl std::fmt::Debug for LoadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadHandle")
            .field("complete", &self.is_complete())
            .finish()
    }
}

impl LoadHandle {
    fn new() -> Self {
        Self {
            shared: Arc::new(LoadShared {
                done: AtomicBool::new(false),
                library: OnceLock::new(),
                report: OnceLock::new(),
                lock: Mutex::new(()),
                finished: Condvar::new(),
            }),
        }
    }

    /// Whether the load has finished, successfully or not. Never blocks.
    pub fn is_complete(&self) -> bool {
        self.shared.done.load(Ordering::Acquire)
    }

    /// The loaded library, once complete and if the root was readable.
    pub fn library(&self) -> Option<Arc<RoomLibrary>> {
        if !self.is_complete() {
            return None;
        }
        self.shared.library.get().cloned()
    }

    pub fn report(&self) -> Option<&LoadReport> {
        if !self.is_complete() {
            return None;
        }
        self.shared.report.get()
    }

    /// Block up to `timeout` for completion. Not for the tick path.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.shared.lock.lock();
        while !self.is_complete() {
            if self.shared.finished.wait_until(&mut guard, deadline).timed_out() {
                return self.is_complete();
            }
        }
        true
    }

    /// Whether two handles observe the same load
    pub fn same_load(&self, other: &LoadHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

/// Starts the catalog load at most once
pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
    resources: Arc<ResourceGate>,
    ids: MetadataIds,
    handle: OnceLock<LoadHandle>,
}

impl CatalogLoader {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        resources: Arc<ResourceGate>,
        ids: MetadataIds,
    ) -> Self {
        Self {
            source,
            resources,
            ids,
            handle: OnceLock::new(),
        }
    }

    /// Start loading, or return the handle of the load already started.
    pub fn begin_load(&self) -> LoadHandle {
        self.handle.get_or_init(|| self.spawn()).clone()
    }

    /// Handle of the load, if one was started
    pub fn handle(&self) -> Option<&LoadHandle> {
        self.handle.get()
    }

    fn spawn(&self) -> LoadHandle {
        let handle = LoadHandle::new();
        let shared = Arc::clone(&handle.shared);
        let source = Arc::clone(&self.source);
        let resources = Arc::clone(&self.resources);
        let ids = self.ids.clone();

        thread::Builder::new()
            .name("catalog-loader".into())
            .spawn(move || {
                let started = Instant::now();
                match RoomLibrary::load(source.as_ref(), &resources, &ids) {
                    Ok((library, report)) => shared.finish(Some(library), report),
                    Err(fatal) => {
                        error!("Failed to load dungeon secrets: {}", fatal);
                        let report = LoadReport {
                            fatal: Some(fatal),
                            elapsed: started.elapsed(),
                            ..LoadReport::default()
                        };
                        shared.finish(None, report);
                    }
                }
            })
            .expect("Failed to spawn catalog loader thread");
        handle
    }
}

/// Whether the load behind `handle` has finished
pub fn is_complete(handle: &LoadHandle) -> bool {
    handle.is_complete()
}
