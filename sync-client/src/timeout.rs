//! Deadline wrapper for remote calls.
//!
//! [`with_timeout`] races the call against a timer. If the timer wins, the
//! call's [`CancelSignal`] fires and the outcome is [`Timed::TimedOut`],
//! whatever the call does afterwards.

use std::future::Future;
use std::time::Duration;

use crate::cancel::{cancel_pair, CancelSignal};

/// Default deadline for remote calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(7000);

/// Failure outcome of a timed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timed<E> {
    /// The deadline elapsed first; the call was cancelled.
    TimedOut,
    /// The call failed on its own before the deadline.
    Failed(E),
}

impl<E> Timed<E> {
    /// Check for the timeout outcome.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// Run `call` with a deadline.
///
/// `call` receives the cancel signal to pass down to the transport. When
/// the call settles first, the timer is dropped with it.
pub async fn with_timeout<F, Fut, T, E>(timeout: Duration, call: F) -> Result<T, Timed<E>>
where
    F: FnOnce(CancelSignal) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let (handle, signal) = cancel_pair();
    let fut = call(signal);

    tokio::select! {
        biased;
        result = fut => result.map_err(Timed::Failed),
        _ = tokio::time::sleep(timeout) => {
            handle.cancel();
            Err(Timed::TimedOut)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn resolve_after(delay: Duration, value: u32) -> Result<u32, String> {
        tokio::time::sleep(delay).await;
        Ok(value)
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let result =
            with_timeout(Duration::from_millis(50), |_| resolve_after(Duration::from_millis(200), 7))
                .await;
        assert_eq!(result, Err(Timed::TimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_call_returns_value() {
        let result =
            with_timeout(Duration::from_millis(50), |_| resolve_after(Duration::from_millis(10), 7))
                .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn errors_pass_through_unchanged() {
        let result: Result<u32, Timed<String>> =
            with_timeout(DEFAULT_TIMEOUT, |_| async { Err("reset by peer".to_string()) }).await;
        assert_eq!(result, Err(Timed::Failed("reset by peer".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn late_failure_still_reports_timeout() {
        // The call notices cancellation and fails, but the deadline already won.
        let result: Result<u32, Timed<&str>> = with_timeout(Duration::from_millis(50), |signal| async move {
            signal.cancelled().await;
            Err("aborted")
        })
        .await;
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_cancel_signal() {
        let (tx, rx) = tokio::sync::oneshot::channel();

        let result: Result<(), Timed<()>> = with_timeout(Duration::from_millis(50), |signal| {
            let _ = tx.send(signal);
            std::future::pending()
        })
        .await;
        assert_eq!(result, Err(Timed::TimedOut));

        let signal = rx.await.unwrap();
        assert!(signal.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn settled_call_never_cancels() {
        let (tx, rx) = tokio::sync::oneshot::channel();

        let result: Result<u32, Timed<()>> = with_timeout(Duration::from_millis(50), |signal| {
            let _ = tx.send(signal);
            async { Ok(1) }
        })
        .await;
        assert_eq!(result, Ok(1));

        tokio::time::sleep(Duration::from_millis(200)).await;
        let signal = rx.await.unwrap();
        assert!(!signal.is_cancelled());
    }
}
