use crate::domain::ports::SessionStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory session slot.
///
/// Nothing survives the process. Used by tests and as the fallback when no
/// durable store is available.
#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySessionStore {
    /// Creates a new, empty in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}
