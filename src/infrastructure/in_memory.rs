use crate::domain::ports::Stash;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory stash.
///
/// Uses `Arc<RwLock<HashMap<String, String>>>`; clones share the same map, which
/// is how tests simulate two tabs of one browser or a page reload.
#[derive(Default, Clone)]
pub struct InMemoryStash {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStash {
    /// Creates a new, empty in-memory stash.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Stash for InMemoryStash {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}
