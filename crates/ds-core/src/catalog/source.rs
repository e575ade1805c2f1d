//! Where room blobs come from.
//!
//! The catalog is laid out as `<dungeon>/<shape>/<room>.skeleton`. The
//! loader only talks to a [`CatalogSource`], so tests and the CLI can point
//! it at any directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CatalogError;

/// Suffix every room file carries; stripping it yields the room name.
pub const ROOM_FILE_SUFFIX: &str = ".skeleton";

/// Room name encoded in a room file name.
///
/// Returns `None` when the suffix is missing or nothing precedes it.
pub fn room_name_from_file(file: &str) -> Option<&str> {
    file.strip_suffix(ROOM_FILE_SUFFIX).filter(|name| !name.is_empty())
}

/// Read access to a catalog tree
pub trait CatalogSource: Send + Sync {
    /// Dungeon type directories
    fn dungeons(&self) -> Result<Vec<String>, CatalogError>;

    /// Room shape directories of one dungeon
    fn room_shapes(&self, dungeon: &str) -> Result<Vec<String>, CatalogError>;

    /// Room file names of one shape bucket
    fn room_files(&self, dungeon: &str, shape: &str) -> Result<Vec<String>, CatalogError>;

    /// Raw bytes of one room file
    fn read_room(&self, dungeon: &str, shape: &str, file: &str) -> Result<Vec<u8>, CatalogError>;

    /// Human readable location of an entry, for logs and errors
    fn describe(&self, parts: &[&str]) -> String {
        parts.join("/")
    }
}

/// Catalog stored as a directory tree on disk
#[derive(Debug, Clone)]
pub struct DirCatalogSource {
    root: PathBuf,
}

impl DirCatalogSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, parts: &[&str]) -> PathBuf {
        parts.iter().fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Sorted entry names of a directory, keeping only dirs or only files.
    fn list(&self, parts: &[&str], want_dirs: bool) -> Result<Vec<String>, CatalogError> {
        let dir = self.path_of(parts);
        let entries = fs::read_dir(&dir)
            .map_err(|e| CatalogError::enumeration(dir.display().to_string(), e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CatalogError::enumeration(dir.display().to_string(), e))?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir != want_dirs {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

impl CatalogSource for DirCatalogSource {
    fn dungeons(&self) -> Result<Vec<String>, CatalogError> {
        self.list(&[], true)
    }

    fn room_shapes(&self, dungeon: &str) -> Result<Vec<String>, CatalogError> {
        self.list(&[dungeon], true)
    }

    fn room_files(&self, dungeon: &str, shape: &str) -> Result<Vec<String>, CatalogError> {
        self.list(&[dungeon, shape], false)
    }

    fn read_room(&self, dungeon: &str, shape: &str, file: &str) -> Result<Vec<u8>, CatalogError> {
        let path = self.path_of(&[dungeon, shape, file]);
        fs::read(&path).map_err(|e| CatalogError::malformed(path.display().to_string(), e))
    }

    fn describe(&self, parts: &[&str]) -> String {
        self.path_of(parts).display().to_string()
    }
}
