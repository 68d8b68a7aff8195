//! Fetch a single entity by id or alias.

use anyhow::{Context, Result};
use feedsync_client::{Entity, EntityRef, LivenessProbe, ResourceStore, SyncContext, Transport};
use serde_json::Value;

use super::Kind;

/// Run the fetch command. Returns the printed entity, if found.
pub async fn run<T: Transport + LivenessProbe>(
    ctx: &SyncContext<T>,
    kind: Kind,
    reference: &str,
    refresh: bool,
) -> Result<Option<Value>> {
    let reference: EntityRef = reference
        .parse()
        .with_context(|| format!("Invalid reference {:?}", reference))?;

    let found = match kind {
        Kind::Group => fetch_one(ctx.groups(), reference, refresh).await?,
        Kind::Feed => fetch_one(ctx.feed_items(), reference, refresh).await?,
    };

    match &found {
        Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
        None => println!("Not found."),
    }
    Ok(found)
}

async fn fetch_one<E: Entity, T: Transport>(
    store: &ResourceStore<E, T>,
    reference: EntityRef,
    refresh: bool,
) -> Result<Option<Value>> {
    let entity = store
        .fetch_by_id(reference.clone(), refresh)
        .await
        .with_context(|| format!("Failed to fetch {} {}", E::RESOURCE, reference))?;

    entity
        .map(|e| serde_json::to_value(&*e))
        .transpose()
        .context("Failed to render entity")
}
