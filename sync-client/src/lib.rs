//! # sync-client
//!
//! Client-side data synchronization layer for feedsync.
//!
//! This crate sits between a UI and the remote API. It owns cached copies
//! of server entities, coalesces concurrent fetches, debounces "mark as
//! seen" acknowledgements and tracks network reachability.
//!
//! ## Features
//!
//! - **Request Coalescing**: concurrent fetches of one id share one request
//! - **Reactive Cache**: every write is visible to existing subscribers
//! - **Seen Tracking**: monotonic watermark with a deferred "divider" mode
//! - **Connectivity**: self-chaining liveness polling and `wait_for_online`
//! - **Transport Abstraction**: pluggable transport layer (HTTP, mock)
//! - **Pure State Machines**: uses sync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use feedsync_client::{ClientConfig, HttpTransport, SyncContext};
//! use std::sync::Arc;
//!
//! let config = ClientConfig::from_file("feedsync.toml".as_ref())?;
//! let transport = Arc::new(HttpTransport::new(&config.api.base_url));
//! let ctx = SyncContext::new(config, transport)?;
//! ctx.start();
//!
//! // Fetch a group by slug, sharing the request with concurrent callers
//! let group = ctx.groups().fetch_by_id(EntityRef::alias("rust"), false).await?;
//!
//! // Load the feed; new items are marked seen automatically
//! let items = ctx.feed().load().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod cancel;
pub mod config;
pub mod connectivity;
pub mod context;
pub mod debounce;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod prefs;
pub mod seen;
pub mod store;
pub mod timeout;
pub mod transport;
pub mod unread;

pub use cache::EntityCache;
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use config::{ApiConfig, ClientConfig, ConfigError, ConnectivityConfig, PrefsConfig, SeenConfig};
pub use connectivity::ConnectivityMonitor;
pub use context::SyncContext;
pub use debounce::{Debouncer, ScrollWarning};
pub use error::ClientError;
pub use feed::FeedStore;
pub use ledger::{FetchLedger, LedgerEntry, LedgerGuard, LedgerWaiter};
pub use prefs::{Preferences, PrefsError};
pub use seen::{SeenTracker, UnreadRefresh};
pub use store::ResourceStore;
pub use timeout::{with_timeout, Timed, DEFAULT_TIMEOUT};
pub use transport::{HttpTransport, LivenessProbe, MockTransport, Transport, TransportError};
pub use unread::{UnreadCount, UNREAD_RESOURCE};

pub use feedsync_core::{SeenState, Transition};
pub use feedsync_types::{Entity, EntityId, EntityRef, FeedItem, Group};
