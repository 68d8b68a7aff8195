//! HTTP transport over reqwest.
//!
//! Calls map to `POST {base_url}/{resource}/{verb}` with the JSON params as
//! body. The liveness probe is `GET {base_url}/online`.

use super::{LivenessProbe, Transport, TransportError};
use crate::cancel::CancelSignal;
use async_trait::async_trait;
use feedsync_types::{ApiResult, LivenessResponse, OnlineStatus, Request};
use serde_json::Value;

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TransportError::InvalidBody(e.to_string())
        } else {
            TransportError::ConnectionFailed(e.to_string())
        }
    }
}

/// Transport speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a transport with a preconfigured client.
    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the URL for a call.
    pub fn call_url(&self, request: &Request) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            request.resource,
            request.verb.as_str()
        )
    }

    /// Build the URL for the liveness endpoint.
    pub fn online_url(&self) -> String {
        format!("{}/online", self.base_url)
    }

    async fn send_call(&self, request: &Request) -> Result<ApiResult, TransportError> {
        let url = self.call_url(request);
        tracing::debug!("POST {}", url);

        let response = self.http.post(&url).json(&request.params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await?;
        Ok(ApiResult::from_value(body))
    }

    async fn send_check(&self) -> Result<LivenessResponse, TransportError> {
        let response = self.http.get(self.online_url()).send().await?;
        let status = response.status().as_u16();
        // An unparseable body is still a response; it just isn't "online".
        let body = response.json::<OnlineStatus>().await.ok();
        Ok(LivenessResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        request: Request,
        cancel: CancelSignal,
    ) -> Result<ApiResult, TransportError> {
        tokio::select! {
            result = self.send_call(&request) => result,
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
        }
    }
}

#[async_trait]
impl LivenessProbe for HttpTransport {
    async fn check(&self, cancel: CancelSignal) -> Result<LivenessResponse, TransportError> {
        tokio::select! {
            result = self.send_check() => result,
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
        }
    }
}
