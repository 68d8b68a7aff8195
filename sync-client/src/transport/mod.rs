//! Transport abstraction for feedsync.
//!
//! This module provides the boundary between the synchronization layer
//! and the remote API (HTTP, mock for testing).
//!
//! # Design
//!
//! Two async traits cover the two remote surfaces:
//! - [`Transport::call`] performs one request/response exchange keyed by
//!   resource and verb
//! - [`LivenessProbe::check`] hits the lightweight `/online` endpoint
//!
//! Both accept a [`CancelSignal`]. Implementations must abandon the
//! in-flight request once the signal fires.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.queue_json("groups", Verb::Get, json!({"id": 1, "name": "g"}));
//! let result = transport
//!     .call(Request::new("groups", Verb::Get), CancelSignal::never())
//!     .await?;
//! ```

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use async_trait::async_trait;
use feedsync_types::{ApiResult, LivenessResponse, Request};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cancel::CancelSignal;
use crate::error::ClientError;
use crate::timeout::with_timeout;

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection failed (DNS, refused, reset).
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Server answered with a non-success status.
    #[error("unexpected HTTP status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Response body could not be decoded.
    #[error("invalid response body: {0}")]
    InvalidBody(String),

    /// No response available (mock queue exhausted, stream closed).
    #[error("connection closed")]
    ConnectionClosed,

    /// The request was abandoned because its cancel signal fired.
    #[error("request cancelled")]
    Cancelled,
}

/// Remote API transport.
///
/// Implementations handle the underlying mechanism (HTTP, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Perform one remote call.
    ///
    /// Sentinel responses are returned as [`ApiResult`] variants, not errors.
    async fn call(&self, request: Request, cancel: CancelSignal)
        -> Result<ApiResult, TransportError>;
}

/// Liveness endpoint used to infer network reachability.
#[async_trait]
pub trait LivenessProbe: Send + Sync + 'static {
    /// Perform one `GET /online` check.
    ///
    /// Any HTTP status is returned as a response; only failures to get a
    /// response at all are errors.
    async fn check(&self, cancel: CancelSignal) -> Result<LivenessResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(
        &self,
        request: Request,
        cancel: CancelSignal,
    ) -> Result<ApiResult, TransportError> {
        (**self).call(request, cancel).await
    }
}

#[async_trait]
impl<P: LivenessProbe + ?Sized> LivenessProbe for Arc<P> {
    async fn check(&self, cancel: CancelSignal) -> Result<LivenessResponse, TransportError> {
        (**self).check(cancel).await
    }
}

/// Perform a call under a deadline and unwrap its payload.
///
/// `Ok(None)` is the not-applicable sentinel; failure sentinels become
/// [`ClientError::Api`].
pub(crate) async fn fetch_payload<T: Transport + ?Sized>(
    transport: &T,
    request: Request,
    timeout: Duration,
) -> Result<Option<Value>, ClientError> {
    match with_timeout(timeout, |cancel| transport.call(request, cancel)).await? {
        ApiResult::Ok(value) => Ok(Some(value)),
        ApiResult::NotApplicable => Ok(None),
        ApiResult::Failure { code, reason } => Err(ClientError::Api { code, reason }),
    }
}
