//! Cancel-and-replace single-shot timers.
//!
//! A [`Debouncer`] owns at most one live timer. Arming it aborts the previous
//! timer first, so repeated triggers coalesce into one firing timed from the
//! last trigger.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Single-slot debounce timer.
#[derive(Debug, Default)]
pub struct Debouncer {
    state: Mutex<DebounceState>,
}

#[derive(Debug, Default)]
struct DebounceState {
    /// Bumped on every arm/cancel so stale timers never fire.
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Create an idle debouncer.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// (Re)arm the timer. Any pending timer is aborted first.
    ///
    /// The slot is cleared before `on_fire` runs, so the callback may arm
    /// or cancel this debouncer without aborting itself.
    pub fn arm<F, Fut>(self: &Arc<Self>, delay: Duration, on_fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.lock();
        if let Some(previous) = state.handle.take() {
            previous.abort();
        }
        state.generation += 1;

        let generation = state.generation;
        let this: Weak<Self> = Arc::downgrade(self);
        state.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let fired = this
                .upgrade()
                .map(|debouncer| debouncer.disarm_fired(generation))
                .unwrap_or(false);
            if fired {
                on_fire().await;
            }
        }));
    }

    /// Abort the pending timer. Returns whether one was armed.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        state.generation += 1;
        match state.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Check whether a timer is pending.
    pub fn is_armed(&self) -> bool {
        self.lock().handle.is_some()
    }

    fn disarm_fired(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        state.handle = None;
        true
    }

    fn lock(&self) -> MutexGuard<'_, DebounceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = state.handle.take() {
            handle.abort();
        }
    }
}

/// Transient "scrolling too fast" flag.
///
/// [`show`](ScrollWarning::show) raises the flag and schedules it to clear;
/// showing again before it clears restarts the countdown.
#[derive(Debug)]
pub struct ScrollWarning {
    visible: Arc<watch::Sender<bool>>,
    debouncer: Arc<Debouncer>,
}

impl ScrollWarning {
    /// Create a hidden warning.
    pub fn new() -> Self {
        Self {
            visible: Arc::new(watch::Sender::new(false)),
            debouncer: Debouncer::new(),
        }
    }

    /// Raise the flag for `ttl`.
    pub fn show(&self, ttl: Duration) {
        self.visible.send_replace(true);
        let visible = Arc::clone(&self.visible);
        self.debouncer.arm(ttl, move || async move {
            visible.send_replace(false);
        });
    }

    /// Clear the flag now.
    pub fn hide(&self) {
        self.debouncer.cancel();
        self.visible.send_replace(false);
    }

    /// Current flag.
    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    /// Subscribe to flag changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }
}

impl Default for ScrollWarning {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bump(count: &Arc<AtomicUsize>) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
        let count = Arc::clone(count);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let count = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new();

        debouncer.arm(Duration::from_millis(100), bump(&count));
        assert!(debouncer.is_armed());

        advance(50).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        advance(100).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_pending_timer() {
        let count = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new();

        debouncer.arm(Duration::from_millis(1000), bump(&count));
        advance(500).await;
        debouncer.arm(Duration::from_millis(1000), bump(&count));

        // First deadline passes without firing.
        advance(700).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Second deadline (1500ms) fires exactly once.
        advance(400).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        advance(5000).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let count = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new();

        debouncer.arm(Duration::from_millis(100), bump(&count));
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        advance(500).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_debouncer_aborts_timer() {
        let count = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new();

        debouncer.arm(Duration::from_millis(100), bump(&count));
        drop(debouncer);

        advance(500).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn scroll_warning_clears_after_ttl() {
        let warning = ScrollWarning::new();
        assert!(!warning.is_visible());

        warning.show(Duration::from_millis(300));
        assert!(warning.is_visible());

        advance(200).await;
        warning.show(Duration::from_millis(300));

        advance(200).await;
        assert!(warning.is_visible(), "second show restarts the countdown");

        advance(200).await;
        assert!(!warning.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn scroll_warning_hide_is_immediate() {
        let warning = ScrollWarning::new();
        let rx = warning.subscribe();

        warning.show(Duration::from_secs(10));
        warning.hide();

        assert!(!*rx.borrow());
        advance(20_000).await;
        assert!(!warning.is_visible());
    }
}
