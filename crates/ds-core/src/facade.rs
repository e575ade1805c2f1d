//! Host-facing entry point.

use std::sync::Arc;

use log::info;

use crate::catalog::CatalogSource;
use crate::config::SecretsConfig;
use crate::loader::{CatalogLoader, LoadHandle, MetadataIds, RoomLibrary};
use crate::map::HostSnapshot;
use crate::metadata::ResourceGate;
use crate::secrets::WorldSecret;
use crate::session::{SecretsSession, TickOutcome};

/// Owns the catalog load and the current dungeon run.
///
/// Each instance is independent; tests create as many as they like.
pub struct DungeonSecrets {
    config: SecretsConfig,
    loader: CatalogLoader,
    handle: Option<LoadHandle>,
    session: SecretsSession,
}

impl DungeonSecrets {
    pub fn new(
        config: SecretsConfig,
        source: Arc<dyn CatalogSource>,
        resources: Arc<ResourceGate>,
    ) -> Self {
        let ids = MetadataIds::from_config(&config);
        Self {
            loader: CatalogLoader::new(source, resources, ids),
            config,
            handle: None,
            session: SecretsSession::new(),
        }
    }

    /// Start loading the catalog unless loading is disabled. Idempotent.
    pub fn init(&mut self) {
        if self.config.no_load_secret_waypoints {
            info!("Dungeon secret waypoint loading is disabled");
            return;
        }
        self.handle = Some(self.loader.begin_load());
    }

    /// Whether the catalog finished loading and can be matched against
    pub fn is_catalog_ready(&self) -> bool {
        self.library().is_some()
    }

    pub fn load_handle(&self) -> Option<&LoadHandle> {
        self.handle.as_ref()
    }

    pub fn library(&self) -> Option<Arc<RoomLibrary>> {
        self.handle.as_ref().and_then(LoadHandle::library)
    }

    pub fn config(&self) -> &SecretsConfig {
        &self.config
    }

    /// Replace the configuration; takes effect on the next tick.
    pub fn set_config(&mut self, config: SecretsConfig) {
        self.config = config;
    }

    /// Host tick callback. Never blocks.
    pub fn on_tick(&mut self, snapshot: &HostSnapshot<'_>) -> TickOutcome {
        let library = self.library();
        self.session.tick(snapshot, &self.config, library.as_deref())
    }

    pub fn session(&self) -> &SecretsSession {
        &self.session
    }

    /// Secrets of the room the player is in
    pub fn current_secrets(&self) -> &[WorldSecret] {
        self.session.current_secrets()
    }

    /// Drop per-run state, e.g. when the player leaves the dungeon.
    pub fn end_run(&mut self) {
        self.session.reset();
    }
}
