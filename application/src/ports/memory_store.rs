//! Per-agent key/value memory port used by the `memory` tool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Failure of a backing store (shared by memory and credential stores)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Memory scoped by agent id. Agents never see each other's entries.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn get(&self, agent_id: &str, key: &str) -> Result<Option<MemoryEntry>, StoreError>;

    /// Insert or overwrite.
    async fn set(&self, agent_id: &str, key: &str, value: &str) -> Result<(), StoreError>;

    /// Returns whether the key existed.
    async fn delete(&self, agent_id: &str, key: &str) -> Result<bool, StoreError>;

    /// All entries for the agent, ordered by key.
    async fn list(&self, agent_id: &str) -> Result<Vec<MemoryEntry>, StoreError>;

    /// Case-insensitive substring match on key or value, ordered by key.
    async fn search(&self, agent_id: &str, query: &str) -> Result<Vec<MemoryEntry>, StoreError>;
}
