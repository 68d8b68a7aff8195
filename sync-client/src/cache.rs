//! Reactive entity cache.
//!
//! Each cached id owns a `watch` channel, so anyone holding a receiver sees
//! every replacement without refetching. A cache-wide revision counter lets
//! list views react to any change.

use dashmap::DashMap;
use feedsync_types::{Entity, EntityId};
use std::sync::Arc;
use tokio::sync::watch;

type Slot<E> = watch::Sender<Option<Arc<E>>>;

/// Observable `id → entity` map.
#[derive(Debug)]
pub struct EntityCache<E> {
    entries: DashMap<EntityId, Slot<E>>,
    revision: watch::Sender<u64>,
}

impl<E: Entity> EntityCache<E> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            revision: watch::Sender::new(0),
        }
    }

    /// Current value for `id`, if cached.
    pub fn get(&self, id: EntityId) -> Option<Arc<E>> {
        self.entries.get(&id).and_then(|slot| slot.borrow().clone())
    }

    /// Check whether `id` is cached.
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Replace the entry for the entity's own id.
    ///
    /// Returns the shared value now held by the cache.
    pub fn insert(&self, entity: E) -> Arc<E> {
        let id = entity.id();
        let value = Arc::new(entity);
        // Release the shard lock before notifying revision watchers.
        {
            let slot = self
                .entries
                .entry(id)
                .or_insert_with(|| watch::Sender::new(None));
            slot.send_replace(Some(Arc::clone(&value)));
        }
        self.bump();
        value
    }

    /// Subscribe to changes of `id`.
    ///
    /// Works for ids not cached yet; the receiver sees `None` until the
    /// first insert.
    pub fn subscribe(&self, id: EntityId) -> watch::Receiver<Option<Arc<E>>> {
        self.entries
            .entry(id)
            .or_insert_with(|| watch::Sender::new(None))
            .subscribe()
    }

    /// Subscribe to the cache-wide revision counter.
    pub fn watch_revision(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Drop the value for `id`. Subscribers see `None`.
    ///
    /// The slot itself is released once nobody is subscribed to it.
    pub fn remove(&self, id: EntityId) -> Option<Arc<E>> {
        let previous = self
            .entries
            .get(&id)
            .and_then(|slot| slot.send_replace(None));
        self.entries
            .remove_if(&id, |_, slot| slot.receiver_count() == 0);
        if previous.is_some() {
            self.bump();
        }
        previous
    }

    /// Drop every value. Existing subscriptions stay connected; slots
    /// nobody watches are released.
    pub fn clear(&self) {
        self.entries.retain(|_, slot| {
            slot.send_replace(None);
            slot.receiver_count() > 0
        });
        self.bump();
    }

    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|slot| slot.borrow().is_some())
            .count()
    }

    /// Check whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every cached value, in no particular order.
    pub fn values(&self) -> Vec<Arc<E>> {
        self.entries
            .iter()
            .filter_map(|slot| slot.borrow().clone())
            .collect()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl<E: Entity> Default for EntityCache<E> {
    fn default() -> Self {
        Self::new()
    }
}
