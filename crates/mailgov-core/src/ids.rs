//! Strongly typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The remote directory's stable account identifier.
///
/// Opaque to mailgov; assigned by the directory when the mailbox is created
/// and immutable for the life of the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryId(String);

impl DirectoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string as the directory knows it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DirectoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DirectoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DirectoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of the operator who performed an action.
///
/// Resolved by the (out of scope) HTTP layer and passed into the core as an
/// optional parameter; `None` means "system".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(Uuid);

impl ActorId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for ActorId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_id_round_trips() {
        let id = DirectoryId::new("8c71b36f-3d2a-4f90-a1e4-2f1f0c9d7b21");
        assert_eq!(id.as_str(), "8c71b36f-3d2a-4f90-a1e4-2f1f0c9d7b21");
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn actor_ids_are_unique() {
        assert_ne!(ActorId::new(), ActorId::new());
    }
}
