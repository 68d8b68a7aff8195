//! Identity types for feedsync entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SyncError;

/// A server-assigned numeric entity identifier.
///
/// Ids are assigned by the server, never by clients. For feed-like
/// entities they increase monotonically, which is what lets the seen
/// watermark be a single integer.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Create a new EntityId with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this EntityId.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The id that precedes every real entity.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Check whether this id is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

/// A caller-supplied reference to an entity: either its id or an alias.
///
/// Aliases are human-readable names (for example a group slug). They are
/// stored normalized so that lookups are case-insensitive.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum EntityRef {
    /// Direct numeric id.
    Id(EntityId),
    /// Normalized human-readable alias.
    Alias(String),
}

impl EntityRef {
    /// Build an alias reference, normalizing the name.
    pub fn alias(name: &str) -> Self {
        Self::Alias(normalize_alias(name))
    }

    /// Return the id if this is a direct reference.
    pub fn as_id(&self) -> Option<EntityId> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Alias(_) => None,
        }
    }
}

impl From<EntityId> for EntityRef {
    fn from(id: EntityId) -> Self {
        Self::Id(id)
    }
}

impl From<u64> for EntityRef {
    fn from(id: u64) -> Self {
        Self::Id(EntityId::new(id))
    }
}

impl FromStr for EntityRef {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SyncError::InvalidId(s.to_string()));
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            let value = trimmed
                .parse::<u64>()
                .map_err(|_| SyncError::InvalidId(s.to_string()))?;
            return Ok(Self::Id(EntityId::new(value)));
        }
        Ok(Self::alias(trimmed))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Alias(name) => write!(f, "{}", name),
        }
    }
}

/// Normalize a human-readable name for alias lookup.
pub fn normalize_alias(name: &str) -> String {
    name.trim().to_lowercase()
}
