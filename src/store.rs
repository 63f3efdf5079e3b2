use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// Prefix shared by every key this crate persists, so nothing else living in
/// the same backing store can collide with us.
pub const NAMESPACE: &str = "meditation";

/// One slice of persisted session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    CurrentUser,
    UsersTable,
    Favorites,
    Reminders,
    CompletionMap,
    Settings,
}

impl StoreKey {
    pub const ALL: [StoreKey; 6] = [
        StoreKey::CurrentUser,
        StoreKey::UsersTable,
        StoreKey::Favorites,
        StoreKey::Reminders,
        StoreKey::CompletionMap,
        StoreKey::Settings,
    ];

    /// Fully namespaced key as written to the backing store.
    pub fn name(self) -> &'static str {
        match self {
            StoreKey::CurrentUser => "meditation.current-user",
            StoreKey::UsersTable => "meditation.users-table",
            StoreKey::Favorites => "meditation.favorites",
            StoreKey::Reminders => "meditation.reminders",
            StoreKey::CompletionMap => "meditation.completion-map",
            StoreKey::Settings => "meditation.settings",
        }
    }
}

/// Durable, asynchronous key-value storage with string payloads.
///
/// Values are JSON documents produced by [`write_json`]; the trait itself is
/// agnostic about content. One `SessionManager` owns the keys under
/// [`NAMESPACE`] and issues operations sequentially, so implementations need
/// no cross-key coordination.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn put(&self, key: &str, value: String) -> anyhow::Result<()>;
}

/// File-backed store: one JSON document per key under a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates, if needed) the data directory.
    pub async fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create data dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read key {key}")),
        }
    }

    async fn put(&self, key: &str, value: String) -> anyhow::Result<()> {
        tokio::fs::write(self.path_for(key), value)
            .await
            .with_context(|| format!("write key {key}"))
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let entries = self.entries.lock().expect("store mutex poisoned");
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Reads and deserializes a slice, degrading to `fallback` when the key is
/// absent, unparseable, or the read fails. Never raises to the caller; a
/// bad read is logged and the in-memory default takes over.
pub async fn read_json<T: DeserializeOwned>(store: &dyn KvStore, key: StoreKey, fallback: T) -> T {
    let raw = match store.get(key.name()).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return fallback,
        Err(e) => {
            warn!(key = key.name(), error = %e, "store read failed, using fallback");
            return fallback;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key = key.name(), error = %e, "stored value unparseable, using fallback");
            fallback
        }
    }
}

/// Serializes and overwrites a slice. Unlike reads, the error is returned so
/// the caller can record that this change may not survive a restart.
pub async fn write_json<T: Serialize>(
    store: &dyn KvStore,
    key: StoreKey,
    value: &T,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value).with_context(|| format!("serialize {}", key.name()))?;
    store.put(key.name(), raw).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_and_distinct() {
        let mut seen = std::collections::BTreeSet::new();
        for key in StoreKey::ALL {
            assert!(key.name().starts_with(NAMESPACE));
            assert!(seen.insert(key.name()));
        }
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert!(store.get("meditation.favorites").await.unwrap().is_none());
        store
            .put("meditation.favorites", r#"["1","2"]"#.into())
            .await
            .unwrap();
        let got = store.get("meditation.favorites").await.unwrap();
        assert_eq!(got.as_deref(), Some(r#"["1","2"]"#));
    }

    #[tokio::test]
    async fn read_json_falls_back_on_missing_and_garbage() {
        let store = MemoryStore::new();
        let empty: Vec<String> = read_json(&store, StoreKey::Favorites, Vec::new()).await;
        assert!(empty.is_empty());

        store
            .put(StoreKey::Favorites.name(), "not json at all".into())
            .await
            .unwrap();
        let fallback: Vec<String> =
            read_json(&store, StoreKey::Favorites, vec!["keep".to_string()]).await;
        assert_eq!(fallback, vec!["keep".to_string()]);
    }

    #[tokio::test]
    async fn write_then_read_json_preserves_value() {
        let store = MemoryStore::new();
        let favorites = vec!["3".to_string(), "1".to_string()];
        write_json(&store, StoreKey::Favorites, &favorites)
            .await
            .expect("write should succeed");
        let got: Vec<String> = read_json(&store, StoreKey::Favorites, Vec::new()).await;
        assert_eq!(got, favorites);
    }

    #[tokio::test]
    async fn file_store_round_trips_and_reports_missing() {
        let dir = std::env::temp_dir().join(format!("stillmind-test-{}", uuid::Uuid::new_v4()));
        let store = FileStore::open(&dir).await.expect("open store");

        assert!(store.get("meditation.settings").await.unwrap().is_none());
        store
            .put("meditation.settings", r#"{"dark-mode":true}"#.into())
            .await
            .unwrap();
        let got = store.get("meditation.settings").await.unwrap();
        assert_eq!(got.as_deref(), Some(r#"{"dark-mode":true}"#));

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
