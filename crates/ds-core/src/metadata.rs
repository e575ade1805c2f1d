//! Room metadata and secret waypoint documents.
//!
//! Both documents are JSON objects keyed by room name:
//!
//! ```json
//! // dungeonrooms.json
//! { "Crypt": { "name": "Crypt", "type": "normal", "secrets": 2 } }
//! // secretlocations.json
//! { "Crypt": [ { "secretName": "1 - Chest", "category": "chest", "x": 2, "y": 0, "z": 1 } ] }
//! ```
//!
//! They are packaged resources addressed by a namespaced [`ResourceId`]
//! and read through whatever [`ResourceProvider`] the host installs into a
//! [`ResourceGate`] once its resource manager is up.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::coords::BlockPos;
use crate::error::CatalogError;

/// Namespaced resource identifier, written `namespace:path`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub namespace: String,
    pub path: String,
}

impl ResourceId {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ResourceId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((ns, path)) if !ns.is_empty() && !path.is_empty() => Ok(Self::new(ns, path)),
            _ => Err(CatalogError::ResourceUnavailable {
                resource: s.to_string(),
                reason: "expected namespace:path".to_string(),
            }),
        }
    }
}

/// Host resource manager
pub trait ResourceProvider: Send + Sync {
    fn open(&self, id: &ResourceId) -> std::io::Result<Box<dyn Read + Send>>;
}

/// Resources laid out as `<root>/assets/<namespace>/<path>`
#[derive(Debug, Clone)]
pub struct DirResourceProvider {
    root: PathBuf,
}

impl DirResourceProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, id: &ResourceId) -> PathBuf {
        self.root.join("assets").join(&id.namespace).join(&id.path)
    }
}

impl ResourceProvider for DirResourceProvider {
    fn open(&self, id: &ResourceId) -> std::io::Result<Box<dyn Read + Send>> {
        let file = File::open(self.path_of(id))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Hand-off point for a resource provider that becomes available late.
///
/// The metadata task blocks in [`ResourceGate::wait`] on the loader thread;
/// the tick path only ever calls the non-blocking [`ResourceGate::get`].
#[derive(Default)]
pub struct ResourceGate {
    provider: Mutex<Option<Arc<dyn ResourceProvider>>>,
    ready: Condvar,
}

impl ResourceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate that is already open
    pub fn with_provider(provider: Arc<dyn ResourceProvider>) -> Self {
        let gate = Self::new();
        gate.install(provider);
        gate
    }

    /// Install the provider and wake every waiter. Later installs replace it.
    pub fn install(&self, provider: Arc<dyn ResourceProvider>) {
        *self.provider.lock() = Some(provider);
        self.ready.notify_all();
    }

    pub fn get(&self) -> Option<Arc<dyn ResourceProvider>> {
        self.provider.lock().clone()
    }

    /// Block until a provider is installed.
    pub fn wait(&self) -> Arc<dyn ResourceProvider> {
        let mut guard = self.provider.lock();
        loop {
            if let Some(provider) = guard.as_ref() {
                return Arc::clone(provider);
            }
            self.ready.wait(&mut guard);
        }
    }
}

/// Descriptive fields of one room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// Display name
    pub name: String,
    /// Classification (normal, puzzle, trap, ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Number of secrets the room holds
    #[serde(default)]
    pub secrets: u32,
}

/// The "rooms" document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomMetadata {
    rooms: HashMap<String, RoomInfo>,
}

impl RoomMetadata {
    pub fn from_reader(reader: impl Read, resource: &str) -> Result<Self, CatalogError> {
        serde_json::from_reader(reader).map_err(|source| CatalogError::MetadataParse {
            resource: resource.to_string(),
            source,
        })
    }

    pub fn get(&self, room: &str) -> Option<&RoomInfo> {
        self.rooms.get(room)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// Kind of point of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SecretCategory {
    Entrance,
    Superboom,
    Chest,
    Item,
    Bat,
    #[serde(alias = "wither-essence", alias = "wither_essence")]
    Wither,
    Lever,
    Fairysoul,
    Stonk,
    Aotv,
    Pearl,
    #[serde(other)]
    Default,
}

/// A secret relative to the room's canonical (catalog) orientation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretLocation {
    #[serde(rename = "secretName", default)]
    pub name: String,
    pub category: SecretCategory,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl SecretLocation {
    pub fn offset(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }
}

/// The "secret locations" document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretWaypointTable {
    rooms: HashMap<String, Vec<SecretLocation>>,
}

impl SecretWaypointTable {
    pub fn from_reader(reader: impl Read, resource: &str) -> Result<Self, CatalogError> {
        serde_json::from_reader(reader).map_err(|source| CatalogError::MetadataParse {
            resource: resource.to_string(),
            source,
        })
    }

    /// Secrets of a room in document order, empty if the room is unknown.
    pub fn secrets(&self, room: &str) -> &[SecretLocation] {
        self.rooms.get(room).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, room: impl Into<String>, secrets: Vec<SecretLocation>) {
        self.rooms.insert(room.into(), secrets);
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// Read one metadata document through a provider.
pub fn read_document<T>(
    provider: &dyn ResourceProvider,
    id: &ResourceId,
    parse: impl FnOnce(Box<dyn Read + Send>, &str) -> Result<T, CatalogError>,
) -> Result<T, CatalogError> {
    let resource = id.to_string();
    let reader = provider
        .open(id)
        .map_err(|e| CatalogError::ResourceUnavailable {
            resource: resource.clone(),
            reason: e.to_string(),
        })?;
    parse(reader, &resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_resource_id_parse() {
        let id: ResourceId = "skyblocker:dungeons/dungeonrooms.json".parse().unwrap();
        assert_eq!(id.namespace, "skyblocker");
        assert_eq!(id.path, "dungeons/dungeonrooms.json");
        assert_eq!(id.to_string(), "skyblocker:dungeons/dungeonrooms.json");
        assert!("no-namespace".parse::<ResourceId>().is_err());
    }

    #[test]
    fn test_parse_rooms_document() {
        let json = r#"{ "Crypt": { "name": "Crypt", "type": "normal", "secrets": 2 },
                        "Quiz": { "name": "Quiz", "type": "puzzle" } }"#;
        let rooms = RoomMetadata::from_reader(json.as_bytes(), "rooms").unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms.get("Crypt").unwrap().secrets, 2);
        assert_eq!(rooms.get("Quiz").unwrap().kind, "puzzle");
    }

    #[test]
    fn test_parse_secret_document() {
        let json = r#"{ "A": [
            { "secretName": "1 - Chest", "category": "chest", "x": 2, "y": 0, "z": 1 },
            { "secretName": "2 - Essence", "category": "wither-essence", "x": 3, "y": 1, "z": 4 },
            { "secretName": "3 - ???", "category": "mystery", "x": 0, "y": 0, "z": 0 }
        ] }"#;
        let table = SecretWaypointTable::from_reader(json.as_bytes(), "secrets").unwrap();
        let secrets = table.secrets("A");
        assert_eq!(secrets.len(), 3);
        assert_eq!(secrets[0].category, SecretCategory::Chest);
        assert_eq!(secrets[0].offset(), BlockPos::new(2, 0, 1));
        assert_eq!(secrets[1].category, SecretCategory::Wither);
        assert_eq!(secrets[2].category, SecretCategory::Default);
        assert!(table.secrets("B").is_empty());
    }

    #[test]
    fn test_malformed_document() {
        let err = SecretWaypointTable::from_reader("[1, 2".as_bytes(), "secrets").unwrap_err();
        assert!(matches!(err, CatalogError::MetadataParse { ref resource, .. } if resource == "secrets"));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(SecretCategory::Item.to_string(), "item");
        assert_eq!(SecretCategory::Fairysoul.to_string(), "fairysoul");
    }

    struct NullProvider;

    impl ResourceProvider for NullProvider {
        fn open(&self, _id: &ResourceId) -> std::io::Result<Box<dyn Read + Send>> {
            Ok(Box::new(std::io::empty()))
        }
    }

    #[test]
    fn test_gate_wakes_waiter() {
        let gate = Arc::new(ResourceGate::new());
        assert!(gate.get().is_none());

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                gate.wait();
            })
        };
        thread::sleep(Duration::from_millis(20));
        gate.install(Arc::new(NullProvider));
        waiter.join().unwrap();
        assert!(gate.get().is_some());
    }
}
