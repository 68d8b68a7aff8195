//! Load the feed the way a feed view does.

use anyhow::{Context, Result};
use feedsync_client::{LivenessProbe, SyncContext, Transport};

/// Summary of one feed visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedVisit {
    /// Items loaded.
    pub items: usize,
    /// Items newer than the watermark at the start of the visit.
    pub new_items: usize,
    /// Unread count after the visit.
    pub unread: u64,
}

/// Run the feed command.
///
/// Items newer than the previous watermark are listed below a divider.
/// Nothing is acknowledged unless `mark_seen` is set.
pub async fn run<T: Transport + LivenessProbe>(
    ctx: &SyncContext<T>,
    mark_seen: bool,
) -> Result<FeedVisit> {
    let seen = ctx.feed().seen();
    seen.snapshot_before_visit();

    let items = match ctx.feed().load().await {
        Ok(items) => items,
        Err(e) => {
            seen.cancel_delayed_seen();
            return Err(e).context("Failed to load feed");
        }
    };

    let mut new_items = 0;
    let mut divider_shown = false;
    for item in &items {
        if seen.is_new_since_visit(item.id) {
            if !divider_shown {
                println!("  ---- new ----");
                divider_shown = true;
            }
            new_items += 1;
        }
        println!("  [{}] {}: {}", item.id, item.author, item.body);
    }

    if mark_seen {
        seen.mark_all_seen()
            .await
            .context("Failed to mark feed as seen")?;
        println!("Marked seen up to {}", seen.max_seen());
    } else {
        seen.cancel_delayed_seen();
        ctx.unread()
            .refresh()
            .await
            .context("Failed to refresh unread count")?;
    }

    let unread = ctx.unread().value();
    println!("Unread: {}", unread);

    Ok(FeedVisit {
        items: items.len(),
        new_items,
        unread,
    })
}
