//! Seen tracking for the feed.
//!
//! [`SeenTracker`] drives the pure [`SeenWatermark`] state machine and
//! performs the I/O its actions ask for: the debounce timer, the
//! `feed/mark_seen` commit, and the unread-count refresh that follows a
//! successful commit.

use async_trait::async_trait;
use feedsync_core::{SeenAction, SeenState, SeenWatermark};
use feedsync_types::{Entity, EntityId, FeedItem, Request, Verb};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::debounce::Debouncer;
use crate::error::ClientError;
use crate::transport::{fetch_payload, Transport};

/// Hook invoked after every successful commit.
///
/// Failures are logged by the tracker and never reach the commit's caller.
#[async_trait]
pub trait UnreadRefresh: Send + Sync {
    /// Re-pull the aggregate unread count.
    async fn refresh_unread(&self) -> Result<(), ClientError>;
}

/// Watermark plus its debounce timer and commit path.
pub struct SeenTracker<T> {
    inner: Arc<SeenInner<T>>,
}

struct SeenInner<T> {
    transport: Arc<T>,
    watermark: Mutex<SeenWatermark>,
    debouncer: Arc<Debouncer>,
    unread: Option<Arc<dyn UnreadRefresh>>,
    timeout: Duration,
}

/// A commit requested by the state machine.
#[derive(Debug, Clone, Copy)]
struct PendingCommit {
    up_to: EntityId,
    refresh: bool,
}

impl<T> Clone for SeenTracker<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> SeenTracker<T> {
    /// Create a tracker starting at a zero watermark.
    pub fn new(
        transport: Arc<T>,
        unread: Option<Arc<dyn UnreadRefresh>>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SeenInner {
                transport,
                watermark: Mutex::new(SeenWatermark::new()),
                debouncer: Debouncer::new(),
                unread,
                timeout,
            }),
        }
    }

    /// Record items the user has been exposed to.
    ///
    /// If the watermark rose while idle, the commit runs in the background
    /// and its task handle is returned.
    pub fn add_items<I>(&self, ids: I) -> Option<JoinHandle<()>>
    where
        I: IntoIterator<Item = EntityId>,
    {
        let actions = self.inner.lock().add_items(ids);
        let pending = self.inner.dispatch(actions)?;
        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move {
            if let Err(e) = inner.commit(pending).await {
                tracing::warn!("Background mark-seen failed: {}", e);
            }
        }))
    }

    /// Snapshot the watermark for a "new since last visit" divider and
    /// stop auto-committing.
    pub fn snapshot_before_visit(&self) {
        self.inner.lock().snapshot_before_visit();
    }

    /// (Re)arm the delayed commit.
    pub fn start_delayed_seen(&self, delay: Duration) {
        let actions = self.inner.lock().start_delayed(delay);
        self.inner.dispatch(actions);
    }

    /// Commit the watermark now and leave deferred mode.
    ///
    /// A zero watermark is never committed.
    pub async fn mark_all_seen(&self) -> Result<(), ClientError> {
        let actions = self.inner.lock().mark_all_seen();
        match self.inner.dispatch(actions) {
            Some(pending) => self.inner.commit(pending).await,
            None => Ok(()),
        }
    }

    /// Leave deferred mode without committing.
    pub fn cancel_delayed_seen(&self) {
        let actions = self.inner.lock().cancel_delayed();
        self.inner.dispatch(actions);
    }

    /// Forget the watermark and cancel any timer.
    pub fn reset(&self) {
        let actions = self.inner.lock().reset();
        self.inner.dispatch(actions);
    }

    /// Highest id seen so far.
    pub fn max_seen(&self) -> EntityId {
        self.inner.lock().max_seen()
    }

    /// Current commit mode.
    pub fn state(&self) -> SeenState {
        self.inner.lock().state()
    }

    /// Watermark recorded at the start of the current visit.
    pub fn seen_before_visit(&self) -> Option<EntityId> {
        self.inner.lock().seen_before_visit()
    }

    /// Check whether an item sits below the "new since last visit" divider.
    pub fn is_new_since_visit(&self, id: EntityId) -> bool {
        self.inner.lock().is_new_since_visit(id)
    }

    /// Check whether the delayed commit is pending.
    pub fn is_timer_armed(&self) -> bool {
        self.inner.debouncer.is_armed()
    }
}

impl<T: Transport> SeenInner<T> {
    fn lock(&self) -> MutexGuard<'_, SeenWatermark> {
        self.watermark.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply timer actions and return the commit, if any was requested.
    fn dispatch(self: &Arc<Self>, actions: Vec<SeenAction>) -> Option<PendingCommit> {
        let mut pending: Option<PendingCommit> = None;
        for action in actions {
            match action {
                SeenAction::CancelTimer => {
                    self.debouncer.cancel();
                }
                SeenAction::ArmTimer { delay } => {
                    let weak: Weak<Self> = Arc::downgrade(self);
                    self.debouncer.arm(delay, move || async move {
                        if let Some(inner) = weak.upgrade() {
                            inner.timer_fired().await;
                        }
                    });
                }
                SeenAction::Commit { up_to } => {
                    pending = Some(PendingCommit {
                        up_to,
                        refresh: false,
                    });
                }
                SeenAction::RefreshUnread => {
                    if let Some(commit) = pending.as_mut() {
                        commit.refresh = true;
                    }
                }
            }
        }
        pending
    }

    async fn timer_fired(self: Arc<Self>) {
        let actions = self.lock().timer_fired();
        if let Some(pending) = self.dispatch(actions) {
            if let Err(e) = self.commit(pending).await {
                tracing::warn!("Delayed mark-seen failed: {}", e);
            }
        }
    }

    async fn commit(&self, pending: PendingCommit) -> Result<(), ClientError> {
        let request = Request::new(FeedItem::RESOURCE, Verb::MarkSeen)
            .with_params(json!({ "up_to": pending.up_to }));
        fetch_payload(&*self.transport, request, self.timeout).await?;
        tracing::debug!("Marked seen up to {}", pending.up_to);

        if pending.refresh {
            if let Some(unread) = &self.unread {
                if let Err(e) = unread.refresh_unread().await {
                    tracing::warn!("Unread refresh after mark-seen failed: {}", e);
                }
            }
        }
        Ok(())
    }
}
