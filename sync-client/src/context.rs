//! The synchronization context.
//!
//! One [`SyncContext`] is created at app start and owns every store,
//! tracker and flag. Consumers receive it by reference instead of reaching
//! for module-level state, and [`SyncContext::reset`] returns everything to
//! a blank state at logout.

use feedsync_types::{FeedItem, Group};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::debounce::ScrollWarning;
use crate::feed::FeedStore;
use crate::prefs::{Preferences, PrefsError};
use crate::seen::{SeenTracker, UnreadRefresh};
use crate::store::ResourceStore;
use crate::transport::{LivenessProbe, Transport};
use crate::unread::UnreadCount;

/// Owner of all client-side synchronization state.
pub struct SyncContext<T> {
    config: ClientConfig,
    groups: ResourceStore<Group, T>,
    feed: FeedStore<T>,
    unread: Arc<UnreadCount<T>>,
    connectivity: ConnectivityMonitor<T>,
    scroll_warning: ScrollWarning,
    dragging: AtomicBool,
    prefs: Preferences,
}

impl<T: Transport + LivenessProbe> SyncContext<T> {
    /// Build every component from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured preferences file is unreadable.
    pub fn new(config: ClientConfig, transport: Arc<T>) -> Result<Self, PrefsError> {
        let prefs = match &config.prefs.path {
            Some(path) => Preferences::load(path)?,
            None => Preferences::in_memory(),
        };
        let timeout = config.api.request_timeout();

        let unread = Arc::new(UnreadCount::new(Arc::clone(&transport), timeout));
        let hook: Arc<dyn UnreadRefresh> = unread.clone();
        let feed = FeedStore::new(
            ResourceStore::with_timeout(Arc::clone(&transport), timeout),
            SeenTracker::new(Arc::clone(&transport), Some(hook), timeout),
        );
        let groups = ResourceStore::with_timeout(Arc::clone(&transport), timeout);
        let connectivity = ConnectivityMonitor::new(transport, &config.connectivity);

        tracing::debug!("Sync context created for {}", config.api.base_url);

        Ok(Self {
            config,
            groups,
            feed,
            unread,
            connectivity,
            scroll_warning: ScrollWarning::new(),
            dragging: AtomicBool::new(false),
            prefs,
        })
    }

    /// Start background work (liveness polling).
    pub fn start(&self) {
        self.connectivity.start_online_check();
    }

    /// Stop background work. Pending seen commits are dropped.
    pub fn shutdown(&self) {
        self.connectivity.stop_online_check();
        self.feed.seen().cancel_delayed_seen();
        self.scroll_warning.hide();
    }

    /// A feed view opened: keep the divider and commit after the debounce.
    pub fn begin_feed_visit(&self) {
        let seen = self.feed.seen();
        seen.snapshot_before_visit();
        seen.start_delayed_seen(self.config.seen.commit_delay());
    }

    /// The feed view closed before the debounce fired: commit nothing.
    pub fn end_feed_visit(&self) {
        self.feed.seen().cancel_delayed_seen();
    }

    /// Clear every cache, index, watermark, counter and timer.
    pub async fn reset(&self) {
        self.feed.reset().await;
        self.groups.reset().await;
        self.unread.reset();
        self.scroll_warning.hide();
        self.dragging.store(false, Ordering::SeqCst);
        tracing::info!("Sync context reset");
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Group store.
    pub fn groups(&self) -> &ResourceStore<Group, T> {
        &self.groups
    }

    /// Feed store and its seen tracker.
    pub fn feed(&self) -> &FeedStore<T> {
        &self.feed
    }

    /// Feed item store.
    pub fn feed_items(&self) -> &ResourceStore<FeedItem, T> {
        self.feed.items()
    }

    /// Unread counter.
    pub fn unread(&self) -> &UnreadCount<T> {
        &self.unread
    }

    /// Connectivity monitor.
    pub fn connectivity(&self) -> &ConnectivityMonitor<T> {
        &self.connectivity
    }

    /// "Scrolling too fast" flag.
    pub fn scroll_warning(&self) -> &ScrollWarning {
        &self.scroll_warning
    }

    /// Preferences.
    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    /// Record whether a drag gesture is in progress.
    pub fn set_dragging(&self, dragging: bool) {
        self.dragging.store(dragging, Ordering::SeqCst);
    }

    /// Check whether a drag gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.dragging.load(Ordering::SeqCst)
    }
}
