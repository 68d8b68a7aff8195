//! Reachability flag with transition detection.
//!
//! The connectivity monitor feeds every liveness outcome into
//! [`Reachability::observe`]. Only actual changes are reported, so the
//! caller logs once per transition rather than once per poll.

/// A change of the online flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Offline → online.
    CameOnline,
    /// Online → offline.
    WentOffline,
}

/// Best-effort online/offline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reachability {
    online: bool,
}

impl Reachability {
    /// Create a new state with the given initial assumption.
    pub fn new(online: bool) -> Self {
        Self { online }
    }

    /// Current flag.
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Record the outcome of a liveness check.
    ///
    /// Returns the transition if the flag changed.
    pub fn observe(&mut self, online: bool) -> Option<Transition> {
        if online == self.online {
            return None;
        }
        self.online = online;
        Some(if online {
            Transition::CameOnline
        } else {
            Transition::WentOffline
        })
    }
}

impl Default for Reachability {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_online() {
        assert!(Reachability::default().is_online());
    }

    #[test]
    fn steady_state_reports_nothing() {
        let mut r = Reachability::new(true);
        assert_eq!(r.observe(true), None);
        assert_eq!(r.observe(true), None);

        let mut r = Reachability::new(false);
        assert_eq!(r.observe(false), None);
    }

    #[test]
    fn flapping_reports_each_change_once() {
        let mut r = Reachability::new(true);
        assert_eq!(r.observe(false), Some(Transition::WentOffline));
        assert_eq!(r.observe(false), None);
        assert_eq!(r.observe(true), Some(Transition::CameOnline));
        assert_eq!(r.observe(true), None);
        assert!(r.is_online());
    }
}
