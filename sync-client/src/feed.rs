//! Feed store: feed items plus seen tracking.

use feedsync_types::{EntityId, FeedItem};
use std::sync::Arc;

use crate::error::ClientError;
use crate::seen::SeenTracker;
use crate::store::ResourceStore;
use crate::transport::Transport;

/// Cached feed items and the seen watermark they drive.
pub struct FeedStore<T> {
    items: ResourceStore<FeedItem, T>,
    seen: SeenTracker<T>,
}

impl<T: Transport> FeedStore<T> {
    /// Combine an item store with a seen tracker.
    pub fn new(items: ResourceStore<FeedItem, T>, seen: SeenTracker<T>) -> Self {
        Self { items, seen }
    }

    /// Fetch the feed listing and record every item as seen.
    ///
    /// Items are cached before the watermark moves, so a commit never
    /// acknowledges something the cache does not hold.
    pub async fn load(&self) -> Result<Vec<Arc<FeedItem>>, ClientError> {
        let items = self.items.fetch_list().await?;
        self.seen.add_items(items.iter().map(|item| item.id));
        Ok(items)
    }

    /// Fetch a single item.
    pub async fn fetch_item(
        &self,
        id: EntityId,
        force_refresh: bool,
    ) -> Result<Option<Arc<FeedItem>>, ClientError> {
        self.items.fetch_by_id(id, force_refresh).await
    }

    /// An item followed by its cached replies, in reply order.
    ///
    /// Replies missing from the cache are skipped.
    pub fn thread(&self, id: EntityId) -> Option<Vec<Arc<FeedItem>>> {
        let root = self.items.get(id)?;
        let mut thread = vec![Arc::clone(&root)];
        thread.extend(
            root.reply_ids()
                .into_iter()
                .filter_map(|reply| self.items.get(reply)),
        );
        Some(thread)
    }

    /// The item store.
    pub fn items(&self) -> &ResourceStore<FeedItem, T> {
        &self.items
    }

    /// The seen tracker.
    pub fn seen(&self) -> &SeenTracker<T> {
        &self.seen
    }

    /// Drop cached items and forget the watermark.
    pub async fn reset(&self) {
        self.seen.reset();
        self.items.reset().await;
    }
}
