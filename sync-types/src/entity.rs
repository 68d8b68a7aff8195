//! Server-owned entity models.
//!
//! Entities are opaque records keyed by a server-assigned [`EntityId`].
//! Feed-like entities carry an ordered reply list whose elements are either
//! embedded entities (as received from the wire) or bare id references
//! (once normalized into a cache).

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::EntityId;

/// A record the client caches on behalf of the server.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Resource kind used when talking to the remote API (e.g. "groups").
    const RESOURCE: &'static str;

    /// Server-assigned identifier.
    fn id(&self) -> EntityId;

    /// Whether this copy carries the full detail payload.
    ///
    /// A cached complete copy satisfies `fetch_by_id` without a network call.
    fn is_complete(&self) -> bool {
        true
    }

    /// Human-readable name used for alias lookup, if any.
    fn alias(&self) -> Option<&str> {
        None
    }

    /// Mutable access to the child list, for entities that have one.
    fn replies_mut(&mut self) -> Option<&mut Vec<Reply<Self>>> {
        None
    }
}

/// One element of a reply list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply<E> {
    /// Reference to an entity that lives in the cache.
    Ref(EntityId),
    /// Entity embedded inline, as delivered by the server.
    Embedded(Box<E>),
}

impl<E: Entity> Reply<E> {
    /// Id of the referenced or embedded entity.
    pub fn id(&self) -> EntityId {
        match self {
            Self::Ref(id) => *id,
            Self::Embedded(entity) => entity.id(),
        }
    }

    /// Check whether this reply is already an id reference.
    pub fn is_ref(&self) -> bool {
        matches!(self, Self::Ref(_))
    }
}

/// A group the user can belong to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// URL-friendly alias, preferred over the name for lookups.
    #[serde(default)]
    pub slug: Option<String>,
    /// Long description (only present on full-detail payloads).
    #[serde(default)]
    pub description: Option<String>,
    /// Number of members.
    #[serde(default)]
    pub member_count: u32,
    /// Set by the server when the payload is the full-detail variant.
    #[serde(default)]
    pub full_detail: bool,
}

impl Entity for Group {
    const RESOURCE: &'static str = "groups";

    fn id(&self) -> EntityId {
        self.id
    }

    fn is_complete(&self) -> bool {
        self.full_detail
    }

    fn alias(&self) -> Option<&str> {
        self.slug.as_deref().or(Some(self.name.as_str()))
    }
}

/// An item in a group feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Item id (monotonically increasing per server).
    pub id: EntityId,
    /// Owning group.
    #[serde(default)]
    pub group_id: Option<EntityId>,
    /// Author display name.
    #[serde(default)]
    pub author: String,
    /// Body text.
    #[serde(default)]
    pub body: String,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub created_at: u64,
    /// Ordered replies, embedded or by id.
    #[serde(default)]
    pub replies: Vec<Reply<FeedItem>>,
}

impl FeedItem {
    /// Create a bare feed item with no replies.
    pub fn new(id: u64) -> Self {
        Self {
            id: EntityId::new(id),
            group_id: None,
            author: String::new(),
            body: String::new(),
            created_at: 0,
            replies: Vec::new(),
        }
    }

    /// Ids of all replies, in order.
    pub fn reply_ids(&self) -> Vec<EntityId> {
        self.replies.iter().map(Reply::id).collect()
    }
}

impl Entity for FeedItem {
    const RESOURCE: &'static str = "feed";

    fn id(&self) -> EntityId {
        self.id
    }

    fn replies_mut(&mut self) -> Option<&mut Vec<Reply<Self>>> {
        Some(&mut self.replies)
    }
}
