//! Type-safe identifier wrapper around [`Uuid`].
//!
//! Team identifiers are assigned once at join time and never change for
//! the lifetime of a session. A reset invalidates every outstanding
//! [`TeamId`]; clients detect this through the identity revocation guard,
//! not through the ID itself.
//!
//! IDs use UUID v7 (time-ordered) so the roster's join order is also
//! encoded in the identifiers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for a team in the session roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TeamId(pub Uuid);

impl TeamId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TeamId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TeamId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TeamId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<TeamId> for Uuid {
    fn from(id: TeamId) -> Self {
        id.0
    }
}
