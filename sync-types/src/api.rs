//! Request and result types for the remote API.
//!
//! The remote API answers either with a domain payload or with a small
//! sentinel object `{ "ret": <code> }`. Sentinels are decoded into an
//! explicit [`ApiResult`] so callers pattern-match instead of comparing
//! magic numbers.

use serde::{Deserialize, Serialize};
use serde_json::Value;


/// Sentinel code meaning "this operation intentionally produced no data".
pub const RET_NOT_APPLICABLE: i64 = 1;

/// Operation requested on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    /// Fetch a single entity by id.
    Get,
    /// Fetch the full listing.
    List,
    /// Fetch an aggregate count.
    Count,
    /// Acknowledge everything up to a watermark as seen.
    MarkSeen,
}

impl Verb {
    /// Wire name of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::List => "list",
            Self::Count => "count",
            Self::MarkSeen => "mark_seen",
        }
    }
}

/// A single remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Resource kind (e.g. "groups", "feed").
    pub resource: String,
    /// Operation.
    pub verb: Verb,
    /// JSON parameters.
    pub params: Value,
}

impl Request {
    /// Create a request with no parameters.
    pub fn new(resource: &str, verb: Verb) -> Self {
        Self {
            resource: resource.to_string(),
            verb,
            params: Value::Null,
        }
    }

    /// Attach parameters.
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }
}

/// Decoded outcome of a remote call that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult {
    /// Domain payload.
    Ok(Value),
    /// Well-known "nothing to return" condition; not an error.
    NotApplicable,
    /// Server-reported failure.
    Failure {
        /// Sentinel code.
        code: i64,
        /// Optional human-readable reason.
        reason: Option<String>,
    },
}

impl ApiResult {
    /// Classify a raw JSON response body.
    pub fn from_value(value: Value) -> Self {
        let code = value
            .as_object()
            .and_then(|obj| obj.get("ret"))
            .and_then(Value::as_i64);

        match code {
            None | Some(0) => Self::Ok(value),
            Some(RET_NOT_APPLICABLE) => Self::NotApplicable,
            Some(code) => Self::Failure {
                code,
                reason: value
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(String::from),
            },
        }
    }
}

/// Body of the liveness endpoint (`GET /online`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineStatus {
    /// Server's own view of reachability.
    pub online: bool,
}

/// Raw liveness response: HTTP status plus the parsed body, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed body (absent when the body was not valid JSON).
    pub body: Option<OnlineStatus>,
}

impl LivenessResponse {
    /// A 200 response reporting `online`.
    pub fn ok(online: bool) -> Self {
        Self {
            status: 200,
            body: Some(OnlineStatus { online }),
        }
    }

    /// A response with the given status and no body.
    pub fn status(status: u16) -> Self {
        Self { status, body: None }
    }

    /// Check for an HTTP-success (2xx) status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Reachability implied by this response.
    pub fn is_online(&self) -> bool {
        self.is_success() && self.body.map(|b| b.online).unwrap_or(false)
    }
}
