use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use toolgate_application::{CredentialStore, StoreError};

/// Plain in-memory credential store. Values are never logged and are
/// redacted from `Debug`.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    secrets: RwLock<BTreeMap<String, String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCredentialStore")
            .field("secrets", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.secrets.read().await.get(name).cloned())
    }

    async fn set(&self, name: &str, value: &str) -> Result<(), StoreError> {
        if name.is_empty() {
            return Err(StoreError::Backend("credential name must not be empty".into()));
        }
        self.secrets
            .write()
            .await
            .insert(name.to_string(), value.to_string());
        tracing::debug!(credential = %name, "Credential stored");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.secrets.write().await.remove(name).is_some())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.secrets.read().await.keys().cloned().collect())
    }
}
