//! In-memory [`ConfigStore`] backed by a `DashMap`
//!
//! Each entry is guarded by its shard lock, so version check and write in
//! `compare_and_swap` happen atomically.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{ConfigKey, ConfigStore, StoredBlob};
use crate::core::error::StoreError;

#[derive(Default)]
pub struct MemoryConfigStore {
    entries: DashMap<ConfigKey, StoredBlob>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self, key: &ConfigKey) -> Result<StoredBlob, StoreError> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn create(&self, key: &ConfigKey, blob: String) -> Result<u64, StoreError> {
        match self.entries.entry(*key) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(key.to_string())),
            Entry::Vacant(vacant) => {
                vacant.insert(StoredBlob { blob, version: 0 });
                Ok(0)
            }
        }
    }

    async fn compare_and_swap(
        &self,
        key: &ConfigKey,
        expected: u64,
        blob: String,
    ) -> Result<u64, StoreError> {
        let mut entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        if entry.version != expected {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected,
            });
        }
        entry.version += 1;
        entry.blob = blob;
        Ok(entry.version)
    }

    async fn delete(&self, key: &ConfigKey) -> Result<(), StoreError> {
        self.entries
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}
