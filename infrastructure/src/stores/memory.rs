use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use toolgate_application::{MemoryEntry, MemoryStore, StoreError};

/// Per-agent key-value memory. Keys are kept ordered so listings are
/// stable.
#[derive(Debug, Default)]
pub struct InMemoryMemoryStore {
    agents: RwLock<HashMap<String, BTreeMap<String, MemoryEntry>>>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn get(&self, agent_id: &str, key: &str) -> Result<Option<MemoryEntry>, StoreError> {
        Ok(self
            .agents
            .read()
            .await
            .get(agent_id)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn set(&self, agent_id: &str, key: &str, value: &str) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::Backend("key must not be empty".into()));
        }
        let entry = MemoryEntry {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: Utc::now(),
        };
        self.agents
            .write()
            .await
            .entry(agent_id.to_string())
            .or_default()
            .insert(key.to_string(), entry);
        tracing::trace!(agent = %agent_id, key = %key, "Memory entry stored");
        Ok(())
    }

    async fn delete(&self, agent_id: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .agents
            .write()
            .await
            .get_mut(agent_id)
            .is_some_and(|entries| entries.remove(key).is_some()))
    }

    async fn list(&self, agent_id: &str) -> Result<Vec<MemoryEntry>, StoreError> {
        Ok(self
            .agents
            .read()
            .await
            .get(agent_id)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn search(&self, agent_id: &str, query: &str) -> Result<Vec<MemoryEntry>, StoreError> {
        let needle = query.to_lowercase();
        Ok(self
            .list(agent_id)
            .await?
            .into_iter()
            .filter(|e| {
                e.key.to_lowercase().contains(&needle) || e.value.to_lowercase().contains(&needle)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overwrite_updates_timestamp() {
        let store = InMemoryMemoryStore::new();
        store.set("a", "k", "v1").await.unwrap();
        let first = store.get("a", "k").await.unwrap().unwrap();
        store.set("a", "k", "v2").await.unwrap();
        let second = store.get("a", "k").await.unwrap().unwrap();

        assert_eq!(second.value, "v2");
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(store.list("a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_sorted_and_search_case_insensitive() {
        let store = InMemoryMemoryStore::new();
        store.set("a", "zeta", "last").await.unwrap();
        store.set("a", "alpha", "First Note").await.unwrap();
        store.set("b", "alpha", "other agent").await.unwrap();

        let keys: Vec<String> = store.list("a").await.unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);

        let hits = store.search("a", "FIRST").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "alpha");
        assert!(store.search("a", "other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_unknown_agent() {
        let store = InMemoryMemoryStore::new();
        assert!(!store.delete("nobody", "k").await.unwrap());
        store.set("a", "k", "v").await.unwrap();
        assert!(store.delete("a", "k").await.unwrap());
        assert!(store.get("a", "k").await.unwrap().is_none());
        assert!(store.set("a", "", "v").await.is_err());
    }
}
