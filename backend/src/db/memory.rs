use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

use super::{DocumentStore, StoreError};

/// Process-local store, used by tests and `STORAGE_BACKEND=memory`.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.documents.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, key: &str) -> Result<Value, StoreError> {
        Ok(self
            .documents
            .read()
            .get(key)
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn save(&self, key: &str, document: &Value) -> Result<(), StoreError> {
        self.documents
            .write()
            .insert(key.to_string(), document.clone());
        Ok(())
    }
}
