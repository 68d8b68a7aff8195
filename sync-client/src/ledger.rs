//! In-flight request ledger.
//!
//! The first caller to [`FetchLedger::enter`] a key becomes the leader and
//! performs the request. Callers arriving while the entry exists become
//! followers and wait for the leader's outcome instead of issuing their own
//! request. The entry is removed when the leader's guard drops, so a failed
//! or cancelled request never blocks a later retry.
//!
//! The leader settles with a small value (`V`) that tells followers where to
//! find the result, for example the id the entity was stored under.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::ClientError;

type Outcome<V> = Option<Result<V, ClientError>>;

/// Tracks outstanding requests by key.
pub struct FetchLedger<K, V = ()> {
    pending: Arc<DashMap<K, watch::Receiver<Outcome<V>>>>,
}

/// Result of entering the ledger.
pub enum LedgerEntry<K: Eq + Hash, V = ()> {
    /// This caller owns the request.
    Leader(LedgerGuard<K, V>),
    /// Another caller owns the request; wait for it.
    Follower(LedgerWaiter<V>),
}

/// Held by the caller performing the request.
///
/// Dropping the guard removes the ledger entry. Followers of a guard that
/// drops without [`settle`](LedgerGuard::settle) see [`ClientError::Abandoned`].
pub struct LedgerGuard<K: Eq + Hash, V = ()> {
    key: K,
    tx: watch::Sender<Outcome<V>>,
    pending: Arc<DashMap<K, watch::Receiver<Outcome<V>>>>,
}

/// Held by callers waiting on another caller's request.
pub struct LedgerWaiter<V = ()> {
    rx: watch::Receiver<Outcome<V>>,
}

impl<K: Eq + Hash + Clone, V> FetchLedger<K, V> {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Register interest in `key`.
    pub fn enter(&self, key: K) -> LedgerEntry<K, V> {
        match self.pending.entry(key.clone()) {
            Entry::Occupied(existing) => LedgerEntry::Follower(LedgerWaiter {
                rx: existing.get().clone(),
            }),
            Entry::Vacant(slot) => {
                let (tx, rx) = watch::channel(None);
                slot.insert(rx);
                LedgerEntry::Leader(LedgerGuard {
                    key,
                    tx,
                    pending: Arc::clone(&self.pending),
                })
            }
        }
    }

    /// Check whether a request for `key` is outstanding.
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check whether nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<K: Eq + Hash + Clone, V> Default for FetchLedger<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> fmt::Debug for FetchLedger<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchLedger")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl<K: Eq + Hash, V> LedgerGuard<K, V> {
    /// Publish the outcome to every follower.
    pub fn settle(&self, outcome: Result<V, ClientError>) {
        self.tx.send_replace(Some(outcome));
    }
}

impl<K: Eq + Hash, V> Drop for LedgerGuard<K, V> {
    fn drop(&mut self) {
        self.pending.remove(&self.key);
        tracing::trace!(
            "Ledger entry released ({} waiting)",
            self.tx.receiver_count()
        );
    }
}

impl<V: Clone> LedgerWaiter<V> {
    /// Wait for the leader's outcome.
    ///
    /// Returns [`ClientError::Abandoned`] if the leader went away without
    /// settling; the caller may enter the ledger again and take over.
    pub async fn wait(mut self) -> Result<V, ClientError> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(Err(ClientError::Abandoned)),
            Err(_) => Err(ClientError::Abandoned),
        }
    }
}
