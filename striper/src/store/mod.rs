//! Record persistence keyed by `(base key, index)`.
//!
//! The store is the seam between the chunking pipeline and the medium the
//! records live on. Implementations must make a `put` for a key immediately
//! visible to a subsequent `get` from any caller; there is no
//! eventual-consistency window to paper over.
//!
//! Absence is a first-class outcome: `get` returns `Ok(None)` for a key that
//! was never written, never an error. The reassembler leans on this as its
//! end-of-sequence sentinel.

use bytes::Bytes;

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// Errors from a chunk store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The base key cannot be mapped onto the backend's key scheme.
    #[error("invalid base key {key:?}: {reason}")]
    InvalidKey {
        /// The offending base key.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// An I/O error occurred while accessing the medium.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence contract for sealed block records.
///
/// All implementations are `Send + Sync` so one store can serve concurrent
/// fetches. Records travel as [`Bytes`] to stay zero-copy through the
/// pipeline.
#[async_trait::async_trait]
pub trait ChunkStore: Send + Sync {
    /// Persist a record under `(base, index)`, overwriting any previous one.
    async fn put(&self, base: &str, index: u64, record: Bytes) -> Result<(), StoreError>;

    /// Retrieve the record under `(base, index)`, or `None` if absent.
    async fn get(&self, base: &str, index: u64) -> Result<Option<Bytes>, StoreError>;

    /// Remove the record under `(base, index)`.
    ///
    /// Returns whether a record existed. Deleting an absent key is not an
    /// error.
    async fn delete(&self, base: &str, index: u64) -> Result<bool, StoreError>;
}
