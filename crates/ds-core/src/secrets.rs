//! Secret Resolver: catalog-relative secrets to world coordinates.

use serde::Serialize;

use crate::coords::BlockPos;
use crate::matcher::{MatchResult, RoomMatch};
use crate::metadata::{SecretCategory, SecretLocation, SecretWaypointTable};

/// A secret placed in the world
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WorldSecret {
    pub name: String,
    pub category: SecretCategory,
    pub pos: BlockPos,
}

/// Resolve the secrets of a matched room, in document order.
///
/// Unmatched results and rooms missing from the table yield nothing.
pub fn resolve(result: &MatchResult, table: &SecretWaypointTable) -> Vec<WorldSecret> {
    let Some(room) = result.matched() else {
        return Vec::new();
    };
    table
        .secrets(&room.name)
        .iter()
        .map(|secret| place(room, secret))
        .collect()
}

fn place(room: &RoomMatch, secret: &SecretLocation) -> WorldSecret {
    let (x, z) = room.orientation.to_world(
        secret.x,
        secret.z,
        room.dims.width as i32,
        room.dims.depth as i32,
    );
    WorldSecret {
        name: secret.name.clone(),
        category: secret.category,
        pos: room.anchor.offset(x, secret.y, z),
    }
}
