//! In-memory backend for tests and ephemeral runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{mint_key, ObjectStore, StorageError};

/// Keeps all objects in a process-local map. Contents vanish on drop.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object under a caller-chosen key (test setup helper).
    pub async fn put_with_key(&self, key: &str, bytes: &[u8]) {
        self.objects
            .write()
            .await
            .insert(key.to_string(), bytes.to_vec());
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, bytes: &[u8]) -> Result<String, StorageError> {
        let key = mint_key();
        self.objects
            .write()
            .await
            .insert(key.clone(), bytes.to_vec());
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_and_not_found() {
        let store = MemoryObjectStore::new();
        let key = store.put(b"bytes").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), b"bytes");

        store.delete(&key).await.unwrap();
        assert!(matches!(
            store.get(&key).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(store.is_empty().await);
    }
}
