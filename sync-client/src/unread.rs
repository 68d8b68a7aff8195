//! Aggregate unread count.

use async_trait::async_trait;
use feedsync_core::{ClampedCounter, CounterUpdate};
use feedsync_types::{Request, Verb};
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use crate::error::ClientError;
use crate::seen::UnreadRefresh;
use crate::transport::{fetch_payload, Transport};

/// Resource queried for the count.
pub const UNREAD_RESOURCE: &str = "notifications";

#[derive(Debug, Deserialize)]
struct CountBody {
    count: i64,
}

/// Server-backed unread counter that never goes negative.
pub struct UnreadCount<T> {
    transport: Arc<T>,
    counter: Mutex<ClampedCounter>,
    value: watch::Sender<u64>,
    timeout: Duration,
}

impl<T: Transport> UnreadCount<T> {
    /// Create a counter at zero.
    pub fn new(transport: Arc<T>, timeout: Duration) -> Self {
        Self {
            transport,
            counter: Mutex::new(ClampedCounter::new()),
            value: watch::Sender::new(0),
            timeout,
        }
    }

    /// Re-pull the count from the server.
    ///
    /// A not-applicable answer leaves the count unchanged.
    pub async fn refresh(&self) -> Result<u64, ClientError> {
        let request = Request::new(UNREAD_RESOURCE, Verb::Count);
        let Some(payload) = fetch_payload(&*self.transport, request, self.timeout).await? else {
            return Ok(self.value());
        };

        let body: CountBody = serde_json::from_value(payload)?;
        let update = self.lock().set(body.count);
        Ok(self.publish(update, "server count"))
    }

    /// Locally subtract `n` read items, clamping at zero.
    pub fn acknowledge(&self, n: u64) -> u64 {
        let delta = i64::try_from(n).map_or(i64::MIN, |n| -n);
        let update = self.lock().apply(delta);
        self.publish(update, "local acknowledge")
    }

    /// Current count.
    pub fn value(&self) -> u64 {
        *self.value.borrow()
    }

    /// Subscribe to count changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.value.subscribe()
    }

    /// Back to zero.
    pub fn reset(&self) {
        self.lock().reset();
        self.value.send_replace(0);
    }

    fn publish(&self, update: CounterUpdate, source: &str) -> u64 {
        if let Some(raw) = update.clamped_from {
            tracing::warn!("Unread count went negative ({}) via {}; clamped to 0", raw, source);
        }
        self.value.send_replace(update.value);
        update.value
    }

    fn lock(&self) -> MutexGuard<'_, ClampedCounter> {
        self.counter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<T: Transport> UnreadRefresh for UnreadCount<T> {
    async fn refresh_unread(&self) -> Result<(), ClientError> {
        self.refresh().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeout::DEFAULT_TIMEOUT;
    use crate::transport::MockTransport;
    use serde_json::json;

    fn setup() -> (MockTransport, UnreadCount<MockTransport>) {
        let transport = MockTransport::new();
        let unread = UnreadCount::new(Arc::new(transport.clone()), DEFAULT_TIMEOUT);
        (transport, unread)
    }

    #[tokio::test]
    async fn refresh_reads_server_count() {
        let (transport, unread) = setup();
        transport.queue_json(UNREAD_RESOURCE, Verb::Count, json!({"count": 12}));
        let rx = unread.subscribe();

        assert_eq!(unread.refresh().await, Ok(12));
        assert_eq!(*rx.borrow(), 12);
    }

    #[tokio::test]
    async fn negative_server_count_is_clamped() {
        let (transport, unread) = setup();
        transport.queue_json(UNREAD_RESOURCE, Verb::Count, json!({"count": -3}));

        assert_eq!(unread.refresh().await, Ok(0));
    }

    #[tokio::test]
    async fn not_applicable_keeps_value() {
        let (transport, unread) = setup();
        transport.queue_json(UNREAD_RESOURCE, Verb::Count, json!({"count": 4}));
        transport.queue_json(UNREAD_RESOURCE, Verb::Count, json!({"ret": 1}));

        unread.refresh().await.unwrap();
        assert_eq!(unread.refresh().await, Ok(4));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let (transport, unread) = setup();
        transport.queue_json(UNREAD_RESOURCE, Verb::Count, json!({"total": 4}));

        let result = unread.refresh().await;
        assert!(matches!(result, Err(ClientError::Decode(_))));
        assert_eq!(unread.value(), 0);
    }

    #[tokio::test]
    async fn acknowledge_clamps_at_zero() {
        let (transport, unread) = setup();
        transport.queue_json(UNREAD_RESOURCE, Verb::Count, json!({"count": 2}));
        unread.refresh().await.unwrap();

        assert_eq!(unread.acknowledge(1), 1);
        assert_eq!(unread.acknowledge(5), 0);
        assert_eq!(unread.acknowledge(u64::MAX), 0);
        assert_eq!(unread.value(), 0);
    }

    #[tokio::test]
    async fn hook_propagates_errors_to_tracker() {
        let (_transport, unread) = setup();
        // Empty queue: the hook reports the failure, the tracker decides.
        assert!(unread.refresh_unread().await.is_err());
    }

    #[tokio::test]
    async fn reset_zeroes() {
        let (transport, unread) = setup();
        transport.queue_json(UNREAD_RESOURCE, Verb::Count, json!({"count": 9}));
        unread.refresh().await.unwrap();

        unread.reset();
        assert_eq!(unread.value(), 0);
    }
}
