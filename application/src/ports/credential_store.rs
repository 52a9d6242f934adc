//! Credential store port used by the `credential` tool.
//!
//! Values are secrets: adapters must never log them, and `list` only
//! returns names.

use async_trait::async_trait;

use super::memory_store::StoreError;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, name: &str, value: &str) -> Result<(), StoreError>;
    async fn delete(&self, name: &str) -> Result<bool, StoreError>;
    /// Credential names, sorted.
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}
