//! List every entity of a kind.

use anyhow::{Context, Result};
use feedsync_client::{LivenessProbe, SyncContext, Transport};

use super::Kind;

/// Run the list command. Returns the number of entities printed.
pub async fn run<T: Transport + LivenessProbe>(
    ctx: &SyncContext<T>,
    kind: Kind,
) -> Result<usize> {
    let count = match kind {
        Kind::Group => {
            let groups = ctx
                .groups()
                .fetch_list()
                .await
                .context("Failed to list groups")?;
            for group in &groups {
                match &group.slug {
                    Some(slug) => println!("  [{}] {} ({})", group.id, group.name, slug),
                    None => println!("  [{}] {}", group.id, group.name),
                }
            }
            groups.len()
        }
        Kind::Feed => {
            let items = ctx
                .feed_items()
                .fetch_list()
                .await
                .context("Failed to list feed")?;
            for item in &items {
                println!("  [{}] {}: {}", item.id, item.author, preview(&item.body));
            }
            items.len()
        }
    };

    if count == 0 {
        println!("Nothing to list.");
    }
    Ok(count)
}

/// First line of `body`, shortened to 60 characters.
fn preview(body: &str) -> String {
    let line = body.lines().next().unwrap_or_default();
    if line.chars().count() > 60 {
        let short: String = line.chars().take(57).collect();
        format!("{}...", short)
    } else {
        line.to_string()
    }
}
