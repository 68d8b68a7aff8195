//! Generic resource store.
//!
//! A [`ResourceStore`] combines an [`EntityCache`] with two fetch ledgers
//! (one per id, one for the bulk listing) and a name index for alias
//! lookups. Every entity written into the cache is normalized first, so
//! cached reply lists only ever hold ids.
//!
//! [`ResourceStore::reset`] bumps a generation counter. Responses to
//! requests issued before the reset are discarded instead of cached.

use feedsync_core::{normalize, NameIndex};
use feedsync_types::{Entity, EntityId, EntityRef, Request, Verb};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

use crate::cache::EntityCache;
use crate::error::ClientError;
use crate::ledger::{FetchLedger, LedgerEntry};
use crate::timeout::DEFAULT_TIMEOUT;
use crate::transport::{fetch_payload, Transport};

/// Cache, ledger and alias index for one resource kind.
pub struct ResourceStore<E: Entity, T> {
    transport: Arc<T>,
    cache: EntityCache<E>,
    /// Settles with the id the entity was stored under.
    ledger: FetchLedger<EntityId, Option<EntityId>>,
    list_ledger: FetchLedger<()>,
    /// Also serializes cache writes against `reset`.
    names: Mutex<NameIndex>,
    /// Ids of the last listing, in server order.
    listing: Mutex<Vec<EntityId>>,
    generation: AtomicU64,
    timeout: Duration,
}

impl<E: Entity, T: Transport> ResourceStore<E, T> {
    /// Create an empty store using the default request timeout.
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_timeout(transport, DEFAULT_TIMEOUT)
    }

    /// Create an empty store with a custom request timeout.
    pub fn with_timeout(transport: Arc<T>, timeout: Duration) -> Self {
        Self {
            transport,
            cache: EntityCache::new(),
            ledger: FetchLedger::new(),
            list_ledger: FetchLedger::new(),
            names: Mutex::new(NameIndex::new()),
            listing: Mutex::new(Vec::new()),
            generation: AtomicU64::new(0),
            timeout,
        }
    }

    /// Cache-only read. Never touches the network.
    pub fn get(&self, id: EntityId) -> Option<Arc<E>> {
        self.cache.get(id)
    }

    /// Fetch one entity by id or alias.
    ///
    /// Returns `Ok(None)` when the alias cannot be resolved, the server
    /// answers "not applicable", or the store was reset while the request
    /// was in flight. Concurrent calls for the same id share one request;
    /// if the caller performing it is dropped, a waiting caller takes over.
    pub async fn fetch_by_id(
        &self,
        reference: impl Into<EntityRef>,
        force_refresh: bool,
    ) -> Result<Option<Arc<E>>, ClientError> {
        let id = match reference.into() {
            EntityRef::Id(id) => id,
            EntityRef::Alias(name) => match self.resolve_alias(&name).await? {
                Some(id) => id,
                None => {
                    tracing::debug!("No {} named {:?}", E::RESOURCE, name);
                    return Ok(None);
                }
            },
        };

        if !force_refresh {
            if let Some(cached) = self.cache.get(id) {
                if cached.is_complete() {
                    return Ok(Some(cached));
                }
            }
        }

        loop {
            match self.ledger.enter(id) {
                LedgerEntry::Follower(waiter) => match waiter.wait().await {
                    Err(ClientError::Abandoned) => {
                        tracing::debug!("Fetch of {} {} abandoned, retrying", E::RESOURCE, id);
                    }
                    // The server may answer under another id.
                    outcome => return Ok(outcome?.and_then(|stored| self.cache.get(stored))),
                },
                LedgerEntry::Leader(guard) => {
                    let result = self.fetch_remote(id).await;
                    guard.settle(
                        result
                            .as_ref()
                            .map(|stored| stored.as_ref().map(|e| e.id()))
                            .map_err(Clone::clone),
                    );
                    if let Err(e) = &result {
                        tracing::warn!("Fetching {} {} failed: {}", E::RESOURCE, id, e);
                    }
                    return result;
                }
            }
        }
    }

    /// Fetch the full listing and merge it into the cache and name index.
    ///
    /// Concurrent calls share one request.
    pub async fn fetch_list(&self) -> Result<Vec<Arc<E>>, ClientError> {
        loop {
            match self.list_ledger.enter(()) {
                LedgerEntry::Follower(waiter) => match waiter.wait().await {
                    Err(ClientError::Abandoned) => {
                        tracing::debug!("Listing {} abandoned, retrying", E::RESOURCE);
                    }
                    outcome => {
                        outcome?;
                        return Ok(self.listing().await);
                    }
                },
                LedgerEntry::Leader(guard) => {
                    let result = self.fetch_list_remote().await;
                    guard.settle(result.as_ref().map(|_| ()).map_err(Clone::clone));
                    if let Err(e) = &result {
                        tracing::warn!("Listing {} failed: {}", E::RESOURCE, e);
                    }
                    return result;
                }
            }
        }
    }

    /// Entities of the last successful listing, still cached, in server order.
    pub async fn listing(&self) -> Vec<Arc<E>> {
        let ids = self.listing.lock().await;
        ids.iter().filter_map(|id| self.cache.get(*id)).collect()
    }

    /// Write an entity returned by a mutation.
    pub async fn put(&self, entity: E) -> Arc<E> {
        let mut names = self.names.lock().await;
        let stored = self.insert_normalized(entity);
        names.insert(stored.as_ref());
        stored
    }

    /// Subscribe to changes of one entity.
    pub fn subscribe(&self, id: EntityId) -> watch::Receiver<Option<Arc<E>>> {
        self.cache.subscribe(id)
    }

    /// Subscribe to any change in this store.
    pub fn watch_revision(&self) -> watch::Receiver<u64> {
        self.cache.watch_revision()
    }

    /// Check whether a fetch for `id` is in flight.
    pub fn is_fetching(&self, id: EntityId) -> bool {
        self.ledger.is_pending(&id)
    }

    /// The underlying cache.
    pub fn cache(&self) -> &EntityCache<E> {
        &self.cache
    }

    /// Drop cached entities, the alias index and the listing.
    ///
    /// Requests already in flight complete, but their results are not
    /// cached.
    pub async fn reset(&self) {
        let mut names = self.names.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.clear();
        names.clear();
        self.listing.lock().await.clear();
    }

    async fn resolve_alias(&self, name: &str) -> Result<Option<EntityId>, ClientError> {
        if let Some(id) = self.names.lock().await.resolve(name) {
            return Ok(Some(id));
        }

        self.fetch_list().await?;
        Ok(self.names.lock().await.resolve(name))
    }

    async fn fetch_remote(&self, id: EntityId) -> Result<Option<Arc<E>>, ClientError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let request = Request::new(E::RESOURCE, Verb::Get).with_params(json!({ "id": id }));
        let Some(payload) = fetch_payload(&*self.transport, request, self.timeout).await?
        else {
            tracing::debug!("{} {} not applicable", E::RESOURCE, id);
            return Ok(None);
        };

        let entity: E = serde_json::from_value(payload)?;
        if entity.id() != id {
            tracing::debug!("{} {} stored under server id {}", E::RESOURCE, id, entity.id());
        }

        let mut names = self.names.lock().await;
        if self.is_stale(generation) {
            tracing::debug!("Discarding {} {} fetched before reset", E::RESOURCE, id);
            return Ok(None);
        }
        let stored = self.insert_normalized(entity);
        names.insert(stored.as_ref());
        Ok(Some(stored))
    }

    async fn fetch_list_remote(&self) -> Result<Vec<Arc<E>>, ClientError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let request = Request::new(E::RESOURCE, Verb::List);
        let entities: Vec<E> =
            match fetch_payload(&*self.transport, request, self.timeout).await? {
                Some(payload) => serde_json::from_value(payload)?,
                None => Vec::new(),
            };

        let mut names = self.names.lock().await;
        if self.is_stale(generation) {
            tracing::debug!("Discarding {} listing fetched before reset", E::RESOURCE);
            return Ok(Vec::new());
        }

        let mut stored = Vec::with_capacity(entities.len());
        for entity in entities {
            stored.push(self.insert_normalized(entity));
        }

        names.rebuild_from(stored.iter().map(Arc::as_ref));
        *self.listing.lock().await = stored.iter().map(|e| e.id()).collect();

        tracing::debug!("Listed {} {}", stored.len(), E::RESOURCE);
        Ok(stored)
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    /// Register nested replies, then the root itself.
    fn insert_normalized(&self, entity: E) -> Arc<E> {
        let normalized = normalize(entity);
        for nested in normalized.nested {
            self.cache.insert(nested);
        }
        self.cache.insert(normalized.root)
    }
}
