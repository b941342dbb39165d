use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{MirrorBackend, MirrorError};

/// Process-local mirror; contents are lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMirror {
    store: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MirrorBackend for InMemoryMirror {
    async fn get(&self, key: &str) -> Result<Option<String>, MirrorError> {
        Ok(self.store.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), MirrorError> {
        self.store
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), MirrorError> {
        self.store.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, MirrorError> {
        Ok(self.store.read().await.contains_key(key))
    }
}
