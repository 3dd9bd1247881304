//! In-memory implementation of the KeyStore trait.
//!
//! For tests and single-process deployments. Everything is lost on drop.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::store::{KeySlot, KeyStore};

/// In-memory key store. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryKeyStore {
    slots: RwLock<HashMap<KeySlot, Vec<u8>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn get(&self, slot: KeySlot) -> Result<Option<Vec<u8>>> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        Ok(slots.get(&slot).cloned())
    }

    async fn put(&self, slot: KeySlot, bytes: &[u8]) -> Result<()> {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.insert(slot, bytes.to_vec());
        Ok(())
    }

    async fn remove(&self, slot: KeySlot) -> Result<()> {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.remove(&slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = MemoryKeyStore::new();
        assert!(store.is_empty().await.unwrap());
        assert_eq!(store.get(KeySlot::VerifyingKey).await.unwrap(), None);

        store.put(KeySlot::VerifyingKey, b"vk").await.unwrap();
        assert_eq!(
            store.get(KeySlot::VerifyingKey).await.unwrap(),
            Some(b"vk".to_vec())
        );
        assert!(!store.is_empty().await.unwrap());

        store.remove(KeySlot::VerifyingKey).await.unwrap();
        store.remove(KeySlot::VerifyingKey).await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let store = MemoryKeyStore::new();
        store.put(KeySlot::MasterSecret, b"one").await.unwrap();
        store.put(KeySlot::MasterSecret, b"two").await.unwrap();
        assert_eq!(
            store.get(KeySlot::MasterSecret).await.unwrap(),
            Some(b"two".to_vec())
        );
    }
}
