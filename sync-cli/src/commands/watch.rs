//! Poll the liveness endpoint and print transitions.

use anyhow::Result;
use feedsync_client::{LivenessProbe, SyncContext, Transition, Transport};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Run the watch command until Ctrl-C or until `limit` elapses.
///
/// Returns the transitions observed.
pub async fn run<T: Transport + LivenessProbe>(
    ctx: &SyncContext<T>,
    limit: Option<Duration>,
) -> Result<Vec<Transition>> {
    let monitor = ctx.connectivity();
    let mut events = monitor.events();
    let mut seen = Vec::new();

    println!(
        "Watching {} (currently {})",
        ctx.config().api.base_url,
        if monitor.is_online() { "online" } else { "offline" }
    );
    ctx.start();

    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(transition) => {
                    match transition {
                        Transition::CameOnline => println!("  ONLINE"),
                        Transition::WentOffline => println!("  OFFLINE"),
                    }
                    seen.push(transition);
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("Missed {} connectivity events", n);
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    ctx.shutdown();
    Ok(seen)
}
