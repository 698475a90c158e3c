//! Persistence of the wizard's loader content under one versioned key.

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;
use tracing::debug;

use crate::core::types::LoaderContent;
use crate::io::store::{KeyValueStore, validate_key};

/// Storage key for the loader snapshot. Bump the suffix on breaking changes.
pub const SNAPSHOT_KEY: &str = "sql-data-loader-content.v1";

const SNAPSHOT_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/loader_content.v1.schema.json"
));

/// Load/save bridge between the wizard and a durable store.
pub struct SnapshotStore {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl SnapshotStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            key: SNAPSHOT_KEY.to_string(),
        }
    }

    pub fn with_key(store: impl KeyValueStore + 'static, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self {
            store: Box::new(store),
            key,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored content, validating it against the snapshot schema.
    pub fn load(&self) -> Result<Option<LoaderContent>> {
        let Some(raw) = self.store.get(&self.key)? else {
            debug!(key = %self.key, "no snapshot stored");
            return Ok(None);
        };
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("parse snapshot '{}'", self.key))?;
        validate_snapshot(&value).with_context(|| format!("validate snapshot '{}'", self.key))?;
        let content: LoaderContent = serde_json::from_value(value)
            .with_context(|| format!("deserialize snapshot '{}'", self.key))?;
        debug!(key = %self.key, submitted = content.is_submitted(), "snapshot loaded");
        Ok(Some(content))
    }

    /// Persist `content`, or clear the slot when `None`.
    pub fn save(&self, content: Option<&LoaderContent>) -> Result<()> {
        match content {
            Some(content) => {
                debug!(key = %self.key, task_id = ?content.id, "saving snapshot");
                let mut buf = serde_json::to_string_pretty(content).context("serialize snapshot")?;
                buf.push('\n');
                self.store.set(&self.key, &buf)
            }
            None => {
                debug!(key = %self.key, "clearing snapshot");
                self.store.remove(&self.key)
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.save(None)
    }
}

fn validate_snapshot(value: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(SNAPSHOT_SCHEMA).context("parse snapshot schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(value) {
        let messages = compiled
            .iter_errors(value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "snapshot schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::QueryContext;
    use crate::io::store::{FileStore, MemoryStore};

    fn sample() -> LoaderContent {
        LoaderContent::new("REPLACE INTO \"t\" OVERWRITE ALL SELECT 1")
            .with_query_context(QueryContext::new().with_max_num_tasks(3))
    }

    #[test]
    fn save_twice_then_load_returns_value() {
        let snapshots = SnapshotStore::new(MemoryStore::new());
        let content = sample();
        snapshots.save(Some(&content)).expect("save");
        snapshots.save(Some(&content)).expect("save again");
        assert_eq!(snapshots.load().expect("load"), Some(content));
    }

    #[test]
    fn query_context_values_are_opaque() {
        let snapshots = SnapshotStore::new(MemoryStore::new());
        let context: QueryContext = [("maxNumTasks", serde_json::json!(0))].into_iter().collect();
        let content = sample().with_query_context(context);
        snapshots.save(Some(&content)).expect("save");
        assert_eq!(snapshots.load().expect("load"), Some(content));
    }

    #[test]
    fn save_none_clears_slot() {
        let snapshots = SnapshotStore::new(MemoryStore::new());
        snapshots.save(Some(&sample())).expect("save");
        snapshots.save(None).expect("clear");
        assert_eq!(snapshots.load().expect("load"), None);
    }

    #[test]
    fn snapshot_format_is_stable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(temp.path());
        let snapshots = SnapshotStore::new(store.clone());
        snapshots
            .save(Some(&LoaderContent::new("SELECT 1").with_id("query-7")))
            .expect("save");

        let raw = store.get(SNAPSHOT_KEY).expect("get").expect("stored");
        assert_eq!(raw, "{\n  \"queryString\": \"SELECT 1\",\n  \"id\": \"query-7\"\n}\n");
    }

    #[test]
    fn corrupt_snapshot_is_rejected() {
        let store = MemoryStore::new();
        store
            .set(SNAPSHOT_KEY, "{\"queryString\": 5}")
            .expect("set");
        let err = SnapshotStore::new(store).load().expect_err("invalid");
        assert!(format!("{err:#}").contains("schema validation failed"));
    }

    #[test]
    fn custom_keys_are_validated() {
        assert!(SnapshotStore::with_key(MemoryStore::new(), "a/b").is_err());
        let snapshots = SnapshotStore::with_key(MemoryStore::new(), "loader.v2").expect("key");
        assert_eq!(snapshots.key(), "loader.v2");
    }
}
