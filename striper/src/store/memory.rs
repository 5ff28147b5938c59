//! In-memory record store.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use tracing::trace;

use super::{ChunkStore, StoreError};

/// `RwLock<HashMap>`-backed store for tests and memory-only use.
///
/// Keys are owned `(base, index)` pairs; a `put` is visible to the next `get`
/// as soon as the write lock drops.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<(String, u64), Bytes>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ChunkStore for MemoryStore {
    async fn put(&self, base: &str, index: u64, record: Bytes) -> Result<(), StoreError> {
        trace!(base, index, size = record.len(), "storing record in memory");
        let mut records = self.records.write().expect("lock poisoned");
        records.insert((base.to_owned(), index), record);
        Ok(())
    }

    async fn get(&self, base: &str, index: u64) -> Result<Option<Bytes>, StoreError> {
        let records = self.records.read().expect("lock poisoned");
        Ok(records.get(&(base.to_owned(), index)).cloned())
    }

    async fn delete(&self, base: &str, index: u64) -> Result<bool, StoreError> {
        let mut records = self.records.write().expect("lock poisoned");
        Ok(records.remove(&(base.to_owned(), index)).is_some())
    }
}
