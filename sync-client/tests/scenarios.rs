//! End-to-end scenarios across stores, the seen tracker and the
//! connectivity monitor, driven through the mock transport.

use feedsync_client::{
    ClientConfig, ConnectivityConfig, ConnectivityMonitor, EntityId, FeedItem, MockTransport,
    ResourceStore, SeenState, SyncContext, Transition, TransportError, DEFAULT_TIMEOUT,
};
use feedsync_types::{ApiResult, LivenessResponse, Verb};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn mark_seen_calls(transport: &MockTransport) -> Vec<serde_json::Value> {
    transport
        .requests()
        .into_iter()
        .filter(|r| r.resource == "feed" && r.verb == Verb::MarkSeen)
        .map(|r| r.params)
        .collect()
}

fn context(transport: &MockTransport) -> SyncContext<MockTransport> {
    SyncContext::new(ClientConfig::default(), Arc::new(transport.clone())).unwrap()
}

// ===========================================
// Scenario A: concurrent fetches coalesce
// ===========================================

#[tokio::test]
async fn three_concurrent_fetches_share_one_call() {
    let transport = MockTransport::new();
    transport.set_delay(Duration::from_millis(20));
    transport.queue_json("feed", Verb::Get, json!({"id": 42, "body": "hello"}));
    let store: Arc<ResourceStore<FeedItem, MockTransport>> =
        Arc::new(ResourceStore::new(Arc::new(transport.clone())));

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.fetch_by_id(EntityId::new(42), false).await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap().unwrap());
    }

    assert_eq!(transport.calls_for("feed", Verb::Get), 1);
    assert!(Arc::ptr_eq(&results[0], &results[1]));
    assert!(Arc::ptr_eq(&results[1], &results[2]));
    assert!(!store.is_fetching(EntityId::new(42)));
}

#[tokio::test]
async fn failed_fetch_can_be_retried() {
    let transport = MockTransport::new();
    transport.queue_error("feed", Verb::Get, TransportError::Status { status: 503 });
    transport.queue_json("feed", Verb::Get, json!({"id": 42}));
    let store: ResourceStore<FeedItem, _> = ResourceStore::new(Arc::new(transport.clone()));

    assert!(store.fetch_by_id(EntityId::new(42), false).await.is_err());
    assert!(store.get(EntityId::new(42)).is_none());

    let retried = store.fetch_by_id(EntityId::new(42), false).await.unwrap();
    assert_eq!(retried.unwrap().id, EntityId::new(42));
    assert_eq!(transport.calls_for("feed", Verb::Get), 2);
}

// ===========================================
// Scenario B: watermark monotonicity, single commit
// ===========================================

#[tokio::test]
async fn out_of_order_batches_commit_once() {
    let transport = MockTransport::new();
    transport.set_default("feed", Verb::MarkSeen, ApiResult::Ok(json!({})));
    transport.set_default("notifications", Verb::Count, ApiResult::Ok(json!({"count": 0})));
    let ctx = context(&transport);
    let seen = ctx.feed().seen();

    let commit = seen.add_items([EntityId::new(5), EntityId::new(3)]);
    let none = seen.add_items([EntityId::new(4)]);
    commit.expect("first batch raises the watermark").await.unwrap();

    assert!(none.is_none());
    assert_eq!(seen.max_seen(), EntityId::new(5));
    assert_eq!(mark_seen_calls(&transport), vec![json!({"up_to": 5})]);
    assert_eq!(transport.calls_for("notifications", Verb::Count), 1);
}

#[tokio::test(start_paused = true)]
async fn deferred_visit_holds_commit_until_debounce() {
    let transport = MockTransport::new();
    transport.set_default("feed", Verb::MarkSeen, ApiResult::Ok(json!({})));
    transport.set_default("notifications", Verb::Count, ApiResult::Ok(json!({"count": 0})));
    let ctx = context(&transport);
    let seen = ctx.feed().seen();

    seen.add_items([EntityId::new(10)]).unwrap().await.unwrap();
    seen.snapshot_before_visit();
    seen.add_items([EntityId::new(11)]);
    assert_eq!(seen.state(), SeenState::AwaitingCommit);
    assert_eq!(mark_seen_calls(&transport).len(), 1);

    seen.start_delayed_seen(Duration::from_millis(1000));
    tokio::time::sleep(Duration::from_millis(400)).await;
    seen.start_delayed_seen(Duration::from_millis(1000));

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(mark_seen_calls(&transport).len(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        mark_seen_calls(&transport),
        vec![json!({"up_to": 10}), json!({"up_to": 11})]
    );
    assert_eq!(seen.state(), SeenState::Idle);
}

// ===========================================
// Scenario C: offline to online, one transition
// ===========================================

#[tokio::test(start_paused = true)]
async fn recovery_is_reported_once() {
    let probe = MockTransport::new();
    probe.queue_liveness(Ok(LivenessResponse::status(500)));
    probe.set_liveness_default(LivenessResponse::ok(true));
    let config = ConnectivityConfig {
        assume_online: false,
        ..ConnectivityConfig::default()
    };
    let monitor = ConnectivityMonitor::new(Arc::new(probe.clone()), &config);
    let mut events = monitor.events();
    let mut online = monitor.subscribe();

    monitor.start_online_check();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!monitor.is_online());

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(monitor.is_online());
    assert!(online.has_changed().unwrap());
    assert!(*online.borrow_and_update());

    // Steady state: more polls, no more transitions.
    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert_eq!(events.try_recv().unwrap(), Transition::CameOnline);
    assert!(events.try_recv().is_err());
    assert!(probe.liveness_checks() >= 5);
}

#[tokio::test(start_paused = true)]
async fn waiters_resume_when_connection_returns() {
    let probe = MockTransport::new();
    probe.queue_liveness(Err(TransportError::ConnectionFailed("unreachable".into())));
    probe.queue_liveness(Ok(LivenessResponse::status(503)));
    probe.set_liveness_default(LivenessResponse::ok(true));
    let config = ConnectivityConfig {
        assume_online: false,
        ..ConnectivityConfig::default()
    };
    let monitor = ConnectivityMonitor::new(Arc::new(probe.clone()), &config);

    let waiter = tokio::spawn({
        let monitor = monitor.clone();
        async move { monitor.wait_for_online().await }
    });
    let second = tokio::spawn({
        let monitor = monitor.clone();
        async move { monitor.wait_for_online().await }
    });

    waiter.await.unwrap();
    second.await.unwrap();
    assert!(monitor.is_online());
    assert_eq!(probe.max_concurrent_checks(), 1);
}

// ===========================================
// Timeout discrimination through a store
// ===========================================

#[tokio::test(start_paused = true)]
async fn store_reports_timeout_distinctly() {
    let transport = MockTransport::new();
    transport.set_delay(DEFAULT_TIMEOUT + Duration::from_secs(1));
    transport.queue_json("feed", Verb::Get, json!({"id": 1}));
    let store: ResourceStore<FeedItem, _> = ResourceStore::new(Arc::new(transport.clone()));

    let result = store.fetch_by_id(EntityId::new(1), false).await;

    assert_eq!(result, Err(feedsync_client::ClientError::Timeout));
}

// ===========================================
// Logout
// ===========================================

#[tokio::test]
async fn logout_clears_all_state() {
    let transport = MockTransport::new();
    transport.set_default("feed", Verb::MarkSeen, ApiResult::Ok(json!({})));
    transport.set_default("notifications", Verb::Count, ApiResult::Ok(json!({"count": 3})));
    transport.queue_json("feed", Verb::List, json!([{"id": 7}, {"id": 8}]));
    let ctx = context(&transport);

    ctx.feed().load().await.unwrap();
    let mut unread = ctx.unread().subscribe();
    unread.wait_for(|count| *count == 3).await.unwrap();
    ctx.reset().await;

    assert!(ctx.feed_items().get(EntityId::new(7)).is_none());
    assert_eq!(ctx.feed().seen().max_seen(), EntityId::zero());
    assert_eq!(ctx.unread().value(), 0);
}
