//! Error taxonomy for catalog loading and metadata parsing.
//!
//! Every variant is contained at the smallest scope that produced it: a
//! malformed room drops that room, a broken metadata document drops that
//! document. Transient tick-path states (map not readable yet, room not
//! matched yet) are not errors and live in [`crate::map::Observation`] and
//! [`crate::matcher::MatchResult`].

use thiserror::Error;

/// Catalog and metadata errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to enumerate catalog at '{path}': {reason}")]
    CatalogLoad { reason: String, path: String },

    #[error("Malformed room data in '{path}': {reason}")]
    MalformedRoomData { path: String, reason: String },

    #[error("Failed to parse metadata document '{resource}': {source}")]
    MetadataParse {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Resource '{resource}' unavailable: {reason}")]
    ResourceUnavailable { resource: String, reason: String },

    #[error("Invalid configuration '{path}': {reason}")]
    Config { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl ToString) -> Self {
        CatalogError::MalformedRoomData {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn enumeration(path: impl Into<String>, reason: impl ToString) -> Self {
        CatalogError::CatalogLoad {
            reason: reason.to_string(),
            path: path.into(),
        }
    }

    /// Whether this error only cost a single room
    pub fn is_per_room(&self) -> bool {
        matches!(self, CatalogError::MalformedRoomData { .. })
    }
}
