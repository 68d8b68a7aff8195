//! Run a single liveness check.

use anyhow::Result;
use feedsync_client::{LivenessProbe, SyncContext, Transport};

/// Run the probe command. Returns the observed online flag.
pub async fn run<T: Transport + LivenessProbe>(ctx: &SyncContext<T>) -> Result<bool> {
    println!("Probing {}...", ctx.config().api.base_url);

    let online = ctx.connectivity().check_now().await;
    if online {
        println!("  Status: ONLINE");
    } else {
        println!("  Status: OFFLINE");
    }

    Ok(online)
}
