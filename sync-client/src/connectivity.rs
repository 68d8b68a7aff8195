//! Best-effort network reachability.
//!
//! The monitor polls the liveness endpoint in a self-chaining loop: the
//! next check is scheduled only after the previous one settles, so a slow
//! check stretches the cadence instead of overlapping with the next one.
//! The `online` flag is written only by the monitor itself.

use feedsync_core::{Reachability, Transition};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::config::ConnectivityConfig;
use crate::timeout::{with_timeout, Timed};
use crate::transport::LivenessProbe;

const EVENT_CAPACITY: usize = 16;

/// Polls the liveness endpoint and publishes the online flag.
pub struct ConnectivityMonitor<P> {
    inner: Arc<MonitorInner<P>>,
}

struct MonitorInner<P> {
    probe: Arc<P>,
    reachability: Mutex<Reachability>,
    online: watch::Sender<bool>,
    visible: AtomicBool,
    events: broadcast::Sender<Transition>,
    poller: Mutex<Option<JoinHandle<()>>>,
    poll_interval: Duration,
    check_timeout: Duration,
}

impl<P> Clone for ConnectivityMonitor<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: LivenessProbe> ConnectivityMonitor<P> {
    /// Create a stopped monitor.
    pub fn new(probe: Arc<P>, config: &ConnectivityConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(MonitorInner {
                probe,
                reachability: Mutex::new(Reachability::new(config.assume_online)),
                online: watch::Sender::new(config.assume_online),
                visible: AtomicBool::new(true),
                events,
                poller: Mutex::new(None),
                poll_interval: config.poll_interval(),
                check_timeout: config.check_timeout(),
            }),
        }
    }

    /// Start the polling loop. Idempotent.
    ///
    /// Returns `false` if a loop was already running.
    pub fn start_online_check(&self) -> bool {
        let mut poller = lock(&self.inner.poller);
        if poller.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let weak: Weak<MonitorInner<P>> = Arc::downgrade(&self.inner);
        let interval = self.inner.poll_interval;
        *poller = Some(tokio::spawn(async move {
            // Stops once the monitor is gone.
            while let Some(inner) = weak.upgrade() {
                inner.check_once().await;
                drop(inner);
                tokio::time::sleep(interval).await;
            }
        }));

        tracing::info!(
            "Online check started (interval: {}ms)",
            interval.as_millis()
        );
        true
    }

    /// Stop the polling loop. Returns whether one was running.
    pub fn stop_online_check(&self) -> bool {
        match lock(&self.inner.poller).take() {
            Some(handle) => {
                handle.abort();
                tracing::info!("Online check stopped");
                true
            }
            None => false,
        }
    }

    /// Check whether the polling loop is running.
    pub fn is_polling(&self) -> bool {
        lock(&self.inner.poller)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Host visibility. Checks are skipped while hidden.
    pub fn set_visible(&self, visible: bool) {
        self.inner.visible.store(visible, Ordering::SeqCst);
    }

    /// Current online flag.
    pub fn is_online(&self) -> bool {
        *self.inner.online.borrow()
    }

    /// Subscribe to the online flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.online.subscribe()
    }

    /// Subscribe to transitions.
    pub fn events(&self) -> broadcast::Receiver<Transition> {
        self.inner.events.subscribe()
    }

    /// Run a single check now and return the resulting flag.
    pub async fn check_now(&self) -> bool {
        self.inner.check_once().await
    }

    /// Resolve once the flag is `true`.
    ///
    /// Starts the polling loop if nothing is driving the flag yet. Dropping
    /// the future leaves no timers behind.
    pub async fn wait_for_online(&self) {
        if self.is_online() {
            return;
        }
        self.start_online_check();

        let mut rx = self.inner.online.subscribe();
        // The sender lives as long as `self`, so this only ends by matching.
        let _ = rx.wait_for(|online| *online).await;
    }
}

impl<P: LivenessProbe> MonitorInner<P> {
    async fn check_once(&self) -> bool {
        if !self.visible.load(Ordering::SeqCst) {
            tracing::trace!("Online check skipped (hidden)");
            return *self.online.borrow();
        }

        let probe = &self.probe;
        let online = match with_timeout(self.check_timeout, |cancel| probe.check(cancel)).await {
            Ok(response) if response.is_success() => response.is_online(),
            Ok(response) => {
                tracing::debug!("Online check returned HTTP {}", response.status);
                false
            }
            Err(Timed::TimedOut) => {
                tracing::debug!(
                    "Online check timed out after {}ms",
                    self.check_timeout.as_millis()
                );
                false
            }
            Err(Timed::Failed(e)) => {
                tracing::debug!("Online check failed: {}", e);
                false
            }
        };

        self.record(online);
        online
    }

    fn record(&self, online: bool) {
        let transition = lock(&self.reachability).observe(online);
        self.online.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });

        if let Some(transition) = transition {
            match transition {
                Transition::CameOnline => tracing::info!("Connection restored"),
                Transition::WentOffline => tracing::warn!("Connection lost"),
            }
            // No subscribers is fine.
            let _ = self.events.send(transition);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportError};
    use feedsync_types::LivenessResponse;

    fn config(assume_online: bool) -> ConnectivityConfig {
        ConnectivityConfig {
            assume_online,
            ..ConnectivityConfig::default()
        }
    }

    fn monitor(probe: &MockTransport, assume_online: bool) -> ConnectivityMonitor<MockTransport> {
        ConnectivityMonitor::new(Arc::new(probe.clone()), &config(assume_online))
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    // ===========================================
    // Single Check Tests
    // ===========================================

    #[tokio::test]
    async fn success_uses_body_flag() {
        let probe = MockTransport::new();
        probe.queue_liveness(Ok(LivenessResponse::ok(false)));
        probe.queue_liveness(Ok(LivenessResponse::ok(true)));
        let monitor = monitor(&probe, true);

        assert!(!monitor.check_now().await);
        assert!(monitor.check_now().await);
    }

    #[tokio::test]
    async fn non_success_status_is_offline() {
        let probe = MockTransport::new();
        probe.queue_liveness(Ok(LivenessResponse::status(503)));
        let monitor = monitor(&probe, true);

        assert!(!monitor.check_now().await);
        assert!(!monitor.is_online());
    }

    #[tokio::test]
    async fn transport_error_is_offline() {
        let probe = MockTransport::new();
        probe.queue_liveness(Err(TransportError::ConnectionFailed("dns".into())));
        let monitor = monitor(&probe, true);

        assert!(!monitor.check_now().await);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_check_times_out_offline() {
        let probe = MockTransport::new();
        probe.set_liveness_default(LivenessResponse::ok(true));
        probe.set_delay(Duration::from_secs(30));
        let monitor = monitor(&probe, true);

        assert!(!monitor.check_now().await);
    }

    #[tokio::test]
    async fn hidden_host_skips_check() {
        let probe = MockTransport::new();
        let monitor = monitor(&probe, true);
        monitor.set_visible(false);

        assert!(monitor.check_now().await);
        assert_eq!(probe.liveness_checks(), 0);
    }

    #[tokio::test]
    async fn transitions_are_broadcast_once() {
        let probe = MockTransport::new();
        probe.queue_liveness(Ok(LivenessResponse::status(500)));
        probe.queue_liveness(Ok(LivenessResponse::status(500)));
        probe.queue_liveness(Ok(LivenessResponse::ok(true)));
        probe.queue_liveness(Ok(LivenessResponse::ok(true)));
        let monitor = monitor(&probe, true);
        let mut events = monitor.events();

        for _ in 0..4 {
            monitor.check_now().await;
        }

        assert_eq!(events.try_recv().unwrap(), Transition::WentOffline);
        assert_eq!(events.try_recv().unwrap(), Transition::CameOnline);
        assert!(events.try_recv().is_err());
    }

    // ===========================================
    // Polling Loop Tests
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn loop_checks_immediately_then_every_interval() {
        let probe = MockTransport::new();
        probe.set_liveness_default(LivenessResponse::ok(true));
        let monitor = monitor(&probe, true);

        assert!(monitor.start_online_check());
        advance(10).await;
        assert_eq!(probe.liveness_checks(), 1);

        advance(3000).await;
        assert_eq!(probe.liveness_checks(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let probe = MockTransport::new();
        probe.set_liveness_default(LivenessResponse::ok(true));
        let monitor = monitor(&probe, true);

        assert!(monitor.start_online_check());
        assert!(!monitor.start_online_check());

        advance(3500).await;
        assert_eq!(probe.liveness_checks(), 4);
        assert_eq!(probe.max_concurrent_checks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_checks_never_overlap() {
        let probe = MockTransport::new();
        probe.set_liveness_default(LivenessResponse::ok(true));
        probe.set_delay(Duration::from_millis(2500));
        let monitor = monitor(&probe, true);

        monitor.start_online_check();
        advance(4000).await;

        // Checks start at 0ms and 3500ms.
        assert_eq!(probe.liveness_checks(), 2);
        assert_eq!(probe.max_concurrent_checks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_then_restart() {
        let probe = MockTransport::new();
        probe.set_liveness_default(LivenessResponse::ok(true));
        let monitor = monitor(&probe, true);

        monitor.start_online_check();
        advance(10).await;
        assert!(monitor.stop_online_check());
        assert!(!monitor.is_polling());

        advance(5000).await;
        assert_eq!(probe.liveness_checks(), 1);

        assert!(monitor.start_online_check());
        advance(10).await;
        assert_eq!(probe.liveness_checks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_loop_keeps_rescheduling() {
        let probe = MockTransport::new();
        probe.set_liveness_default(LivenessResponse::ok(true));
        let monitor = monitor(&probe, true);
        monitor.set_visible(false);

        monitor.start_online_check();
        advance(2500).await;
        assert_eq!(probe.liveness_checks(), 0);

        monitor.set_visible(true);
        advance(1000).await;
        assert_eq!(probe.liveness_checks(), 1);
    }

    // ===========================================
    // wait_for_online Tests
    // ===========================================

    #[tokio::test]
    async fn wait_returns_immediately_when_online() {
        let probe = MockTransport::new();
        let monitor = monitor(&probe, true);

        monitor.wait_for_online().await;
        assert!(!monitor.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_resolves_on_recovery() {
        let probe = MockTransport::new();
        probe.queue_liveness(Ok(LivenessResponse::status(502)));
        probe.queue_liveness(Ok(LivenessResponse::status(502)));
        probe.set_liveness_default(LivenessResponse::ok(true));
        let monitor = monitor(&probe, false);

        let started = tokio::time::Instant::now();
        monitor.wait_for_online().await;

        assert!(monitor.is_online());
        assert_eq!(probe.liveness_checks(), 3);
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }
}
