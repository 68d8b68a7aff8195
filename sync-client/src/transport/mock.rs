//! Mock transport for testing.
//!
//! Allows queueing responses per resource/verb and capturing sent requests
//! for verification. Implements both [`Transport`] and [`LivenessProbe`].

use super::{LivenessProbe, Transport, TransportError};
use crate::cancel::CancelSignal;
use async_trait::async_trait;
use feedsync_types::{ApiResult, LivenessResponse, Request, Verb};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Route = (String, Verb);

/// Mock transport for testing.
///
/// Responses are served in FIFO order per `(resource, verb)` route. When a
/// route's queue is empty the route default is used, if any, otherwise the
/// call fails with [`TransportError::ConnectionClosed`].
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    queues: HashMap<Route, VecDeque<Result<ApiResult, TransportError>>>,
    defaults: HashMap<Route, ApiResult>,
    requests: Vec<Request>,
    fail_next_call: Option<String>,
    liveness_queue: VecDeque<Result<LivenessResponse, TransportError>>,
    liveness_default: Option<LivenessResponse>,
    liveness_checks: usize,
    checks_in_flight: usize,
    max_concurrent_checks: usize,
    delay: Duration,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the next call on the given route.
    pub fn queue_response(&self, resource: &str, verb: Verb, result: ApiResult) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .queues
            .entry((resource.to_string(), verb))
            .or_default()
            .push_back(Ok(result));
    }

    /// Queue a raw JSON body; sentinels are classified as the server would.
    pub fn queue_json(&self, resource: &str, verb: Verb, body: Value) {
        self.queue_response(resource, verb, ApiResult::from_value(body));
    }

    /// Queue a transport error for the next call on the given route.
    pub fn queue_error(&self, resource: &str, verb: Verb, error: TransportError) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .queues
            .entry((resource.to_string(), verb))
            .or_default()
            .push_back(Err(error));
    }

    /// Result served whenever the route's queue is empty.
    pub fn set_default(&self, resource: &str, verb: Verb, result: ApiResult) {
        let mut inner = self.inner.lock().unwrap();
        inner.defaults.insert((resource.to_string(), verb), result);
    }

    /// Cause the next call (any route) to fail with the given error.
    pub fn fail_next_call(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_call = Some(error.to_string());
    }

    /// Queue the outcome of the next liveness check.
    pub fn queue_liveness(&self, result: Result<LivenessResponse, TransportError>) {
        let mut inner = self.inner.lock().unwrap();
        inner.liveness_queue.push_back(result);
    }

    /// Liveness response served when the liveness queue is empty.
    pub fn set_liveness_default(&self, response: LivenessResponse) {
        let mut inner = self.inner.lock().unwrap();
        inner.liveness_default = Some(response);
    }

    /// Simulated latency applied to every call and check.
    pub fn set_delay(&self, delay: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.delay = delay;
    }

    /// All requests that were sent, in order.
    pub fn requests(&self) -> Vec<Request> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// Total number of calls.
    pub fn call_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.requests.len()
    }

    /// Number of calls on the given route.
    pub fn calls_for(&self, resource: &str, verb: Verb) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .requests
            .iter()
            .filter(|r| r.resource == resource && r.verb == verb)
            .count()
    }

    /// Number of liveness checks started.
    pub fn liveness_checks(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.liveness_checks
    }

    /// Highest number of liveness checks that were in flight at once.
    pub fn max_concurrent_checks(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.max_concurrent_checks
    }

    /// Clear all state (queues, defaults, captured requests).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }

    fn delay(&self) -> Duration {
        self.inner.lock().unwrap().delay
    }

    async fn simulate_latency(&self, cancel: &CancelSignal) -> Result<(), TransportError> {
        let delay = self.delay();
        if delay.is_zero() {
            // Let concurrent callers interleave even without latency.
            tokio::task::yield_now().await;
            return if cancel.is_cancelled() {
                Err(TransportError::Cancelled)
            } else {
                Ok(())
            };
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
        }
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(
        &self,
        request: Request,
        cancel: CancelSignal,
    ) -> Result<ApiResult, TransportError> {
        let outcome = {
            let mut inner = self.inner.lock().unwrap();
            let route = (request.resource.clone(), request.verb);
            inner.requests.push(request);

            // Check for forced failure
            if let Some(error) = inner.fail_next_call.take() {
                Err(TransportError::ConnectionFailed(error))
            } else {
                match inner.queues.get_mut(&route).and_then(VecDeque::pop_front) {
                    Some(result) => result,
                    None => inner
                        .defaults
                        .get(&route)
                        .cloned()
                        .ok_or(TransportError::ConnectionClosed),
                }
            }
        };

        self.simulate_latency(&cancel).await?;
        outcome
    }
}

#[async_trait]
impl LivenessProbe for MockTransport {
    async fn check(&self, cancel: CancelSignal) -> Result<LivenessResponse, TransportError> {
        let outcome = {
            let mut inner = self.inner.lock().unwrap();
            inner.liveness_checks += 1;
            inner.checks_in_flight += 1;
            inner.max_concurrent_checks = inner.max_concurrent_checks.max(inner.checks_in_flight);
            match inner.liveness_queue.pop_front() {
                Some(result) => result,
                None => inner
                    .liveness_default
                    .ok_or(TransportError::ConnectionClosed),
            }
        };

        let latency = self.simulate_latency(&cancel).await;
        self.inner.lock().unwrap().checks_in_flight -= 1;
        latency?;
        outcome
    }
}
