//! Read or write a persisted preference.

use anyhow::{Context, Result};
use feedsync_client::{LivenessProbe, SyncContext, Transport};
use serde_json::Value;

/// Run the pref command.
///
/// With a value, stores it (parsed as JSON, falling back to a string).
/// Without one, prints the current value.
pub fn run<T: Transport + LivenessProbe>(
    ctx: &SyncContext<T>,
    key: &str,
    value: Option<&str>,
) -> Result<Option<Value>> {
    let prefs = ctx.prefs();

    if let Some(raw) = value {
        let parsed =
            serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        prefs
            .set(key, &parsed)
            .with_context(|| format!("Failed to store preference {:?}", key))?;
        println!("{} = {}", key, parsed);
        return Ok(Some(parsed));
    }

    let current = prefs.get::<Value>(key);
    match &current {
        Some(v) => println!("{} = {}", key, v),
        None => println!("{} is not set", key),
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_client::{ClientConfig, MockTransport};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn values_persist_between_contexts() {
        let dir = tempdir().unwrap();
        let mut config = ClientConfig::default();
        config.prefs.path = Some(dir.path().join("prefs.json"));
        let transport = Arc::new(MockTransport::new());

        let ctx = SyncContext::new(config.clone(), Arc::clone(&transport)).unwrap();
        run(&ctx, "compact", Some("true")).unwrap();
        run(&ctx, "nick", Some("ada")).unwrap();

        let reopened = SyncContext::new(config, transport).unwrap();
        assert_eq!(run(&reopened, "compact", None).unwrap(), Some(json!(true)));
        assert_eq!(run(&reopened, "nick", None).unwrap(), Some(json!("ada")));
        assert_eq!(run(&reopened, "missing", None).unwrap(), None);
    }
}
