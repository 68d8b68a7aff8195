//! # sync-core
//!
//! Pure logic for feedsync (no I/O, instant tests).
//!
//! This crate implements the state machines and algorithms of the client
//! synchronization layer without any network or timer I/O, enabling fast
//! unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (remote calls, timers) is performed by `sync-client`,
//! which interprets the actions produced by these state machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alias;
pub mod counter;
pub mod normalize;
pub mod reachability;
pub mod watermark;

pub use alias::NameIndex;
pub use counter::{ClampedCounter, CounterUpdate};
pub use normalize::{normalize, Normalized};
pub use reachability::{Reachability, Transition};
pub use watermark::{SeenAction, SeenState, SeenWatermark};
