//! # sync-types
//!
//! Entity and wire types for the feedsync client synchronization layer.
//!
//! This crate provides the foundational types used across all feedsync crates:
//! - [`EntityId`], [`EntityRef`] - Identity types
//! - [`Entity`], [`Reply`], [`Group`], [`FeedItem`] - Cached records
//! - [`Request`], [`Verb`], [`ApiResult`] - Remote API calls and results
//! - [`SyncError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod api;
mod entity;
mod error;
mod ids;

pub use api::{ApiResult, LivenessResponse, OnlineStatus, Request, Verb, RET_NOT_APPLICABLE};
pub use entity::{Entity, FeedItem, Group, Reply};
pub use error::SyncError;
pub use ids::{normalize_alias, EntityId, EntityRef};
