//! Non-negative counters.
//!
//! Aggregate counts (unread items, pending invitations) are adjusted
//! locally between server refreshes. A local adjustment that would drive a
//! count below zero indicates a bookkeeping bug; the counter clamps to zero
//! and reports the anomaly instead of carrying a negative value forward.

/// Result of a counter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterUpdate {
    /// Value after the update (never negative).
    pub value: u64,
    /// The out-of-range value that was clamped, if any.
    pub clamped_from: Option<i64>,
}

impl CounterUpdate {
    /// Check whether the update had to be clamped.
    pub fn was_clamped(&self) -> bool {
        self.clamped_from.is_some()
    }
}

/// A counter that never goes below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClampedCounter {
    value: u64,
}

impl ClampedCounter {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Replace the value, e.g. with a server-reported count.
    pub fn set(&mut self, raw: i64) -> CounterUpdate {
        if raw < 0 {
            self.value = 0;
            CounterUpdate {
                value: 0,
                clamped_from: Some(raw),
            }
        } else {
            self.value = raw as u64;
            CounterUpdate {
                value: self.value,
                clamped_from: None,
            }
        }
    }

    /// Adjust the value by a signed delta.
    pub fn apply(&mut self, delta: i64) -> CounterUpdate {
        let current = i64::try_from(self.value).unwrap_or(i64::MAX);
        self.set(current.saturating_add(delta))
    }

    /// Reset to zero.
    pub fn reset(&mut self) {
        self.value = 0;
    }
}
