//! Basic type definitions for the chat server
//!
//! Provides newtype wrappers for type safety:
//! - `ConnectionId`: UUID-based identifier of one transport connection
//! - `IdCard`: stable participant identity that survives reconnects
//!
//! and the opaque identifier generator used for messages and rooms.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a globally unique opaque identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4. A new one is issued for every transport connection,
/// so it must never be used as a participant's long-lived identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable participant identity (the "id card" number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdCard(pub String);

impl IdCard {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IdCard {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for IdCard {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for IdCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
