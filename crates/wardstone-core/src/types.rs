//! Strong type definitions for the Wardstone core.
//!
//! Identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A spatial coordinate: a world identifier plus an integer position.
///
/// A coordinate addresses at most one protectable resource, and therefore at
/// most one live [`Protection`](crate::Protection). Equality and hashing are
/// by field tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// The world this coordinate belongs to.
    pub world: String,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(world: impl Into<String>, x: i64, y: i64, z: i64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{},{}", self.world, self.x, self.y, self.z)
    }
}

/// A backend-assigned protection identifier.
///
/// Assigned on insert (SQLite rowid or memory counter); `0` marks a
/// protection that has not been persisted yet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ProtectionId(pub i64);

impl ProtectionId {
    /// Sentinel for a protection not yet written to a backend.
    pub const UNASSIGNED: Self = Self(0);

    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ProtectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
