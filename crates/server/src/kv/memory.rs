//! In-memory key-value backend for local development and tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

/// A process-local key-value map with the same surface as the REST
/// backend. Cheaply cloneable; clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryKvStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    pub(super) async fn put(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
    }

    pub(super) async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    pub(super) async fn list_keys(&self, prefix: &str) -> Vec<String> {
        self.entries
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }
}
