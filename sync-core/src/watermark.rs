//! Seen-watermark state machine for feedsync.
//!
//! This module tracks the highest feed item id the user has been exposed
//! to and decides when that watermark must be acknowledged to the server.
//!
//! Like the rest of this crate it performs no I/O: every operation mutates
//! the state and returns a list of [`SeenAction`]s. The client layer owns the
//! debounce timer and the network calls and interprets the actions.
//!
//! ```text
//!            snapshot_before_visit()
//!    Idle ─────────────────────────────► AwaitingCommit
//!     ▲                                       │
//!     └── mark_all_seen() / cancel_delayed() / timer_fired()
//! ```

use feedsync_types::EntityId;
use std::time::Duration;

/// Commit mode of the watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeenState {
    /// New items are acknowledged as soon as they raise the watermark.
    Idle,
    /// A view is showing a "new since last visit" divider; nothing is
    /// acknowledged until an explicit commit or the debounce fires.
    AwaitingCommit,
}

/// Instructions for the client layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeenAction {
    /// Cancel the pending debounce timer, if any.
    CancelTimer,
    /// Arm the debounce timer; on expiry call [`SeenWatermark::timer_fired`].
    ArmTimer {
        /// Delay before the timer fires.
        delay: Duration,
    },
    /// Acknowledge everything up to this id to the server.
    Commit {
        /// Watermark to acknowledge.
        up_to: EntityId,
    },
    /// Re-pull the aggregate unread count.
    RefreshUnread,
}

/// Monotonic seen watermark with deferred-commit support.
#[derive(Debug, Clone)]
pub struct SeenWatermark {
    /// Highest id seen so far. Never decreases.
    max_seen: EntityId,
    /// Current commit mode.
    state: SeenState,
    /// Watermark recorded when the current visit started.
    seen_before_visit: Option<EntityId>,
}

impl SeenWatermark {
    /// Create a new watermark at zero.
    pub fn new() -> Self {
        Self {
            max_seen: EntityId::zero(),
            state: SeenState::Idle,
            seen_before_visit: None,
        }
    }

    /// Create a watermark resuming from a known value.
    pub fn with_watermark(max_seen: EntityId) -> Self {
        Self {
            max_seen,
            ..Self::new()
        }
    }

    /// Highest id seen so far.
    pub fn max_seen(&self) -> EntityId {
        self.max_seen
    }

    /// Current commit mode.
    pub fn state(&self) -> SeenState {
        self.state
    }

    /// Watermark snapshot taken at the start of the current visit.
    pub fn seen_before_visit(&self) -> Option<EntityId> {
        self.seen_before_visit
    }

    /// Check whether an item belongs below the "new since last visit" divider.
    pub fn is_new_since_visit(&self, id: EntityId) -> bool {
        match self.seen_before_visit {
            Some(before) => id > before,
            None => false,
        }
    }

    /// Record a batch of item ids the user has been exposed to.
    ///
    /// Raises the watermark to the maximum id in the batch. If it was raised
    /// while idle, the new watermark is committed immediately.
    pub fn add_items<I>(&mut self, ids: I) -> Vec<SeenAction>
    where
        I: IntoIterator<Item = EntityId>,
    {
        let mut raised = false;
        for id in ids {
            if id > self.max_seen {
                self.max_seen = id;
                raised = true;
            }
        }

        if raised && self.state == SeenState::Idle {
            self.commit_actions()
        } else {
            Vec::new()
        }
    }

    /// Record the current watermark and defer commits until told otherwise.
    pub fn snapshot_before_visit(&mut self) {
        self.seen_before_visit = Some(self.max_seen);
        self.state = SeenState::AwaitingCommit;
    }

    /// (Re)arm the debounce timer. Any pending timer is replaced.
    pub fn start_delayed(&mut self, delay: Duration) -> Vec<SeenAction> {
        vec![SeenAction::CancelTimer, SeenAction::ArmTimer { delay }]
    }

    /// The debounce timer expired.
    pub fn timer_fired(&mut self) -> Vec<SeenAction> {
        self.mark_all_seen()
    }

    /// Leave deferred mode and commit the watermark if it is positive.
    pub fn mark_all_seen(&mut self) -> Vec<SeenAction> {
        self.state = SeenState::Idle;
        self.seen_before_visit = None;

        let mut actions = vec![SeenAction::CancelTimer];
        if self.max_seen.is_positive() {
            actions.extend(self.commit_actions());
        }
        actions
    }

    /// Leave deferred mode without committing anything.
    pub fn cancel_delayed(&mut self) -> Vec<SeenAction> {
        self.state = SeenState::Idle;
        self.seen_before_visit = None;
        vec![SeenAction::CancelTimer]
    }

    /// Forget everything (e.g. on logout).
    pub fn reset(&mut self) -> Vec<SeenAction> {
        *self = Self::new();
        vec![SeenAction::CancelTimer]
    }

    fn commit_actions(&self) -> Vec<SeenAction> {
        vec![
            SeenAction::Commit {
                up_to: self.max_seen,
            },
            SeenAction::RefreshUnread,
        ]
    }
}

impl Default for SeenWatermark {
    fn default() -> Self {
        Self::new()
    }
}
