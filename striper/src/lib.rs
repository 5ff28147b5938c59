//! A crate for striping byte streams across logical storage nodes.
//!
//! A source stream is sliced into fixed-size blocks (the last one may be
//! short), each block is sealed into a record carrying a BLAKE3 digest of its
//! payload, assigned round-robin to one of a fixed ordered set of node
//! labels, and persisted individually through a pluggable [`ChunkStore`]
//! keyed by `(base key, index)`. Reconstruction fetches records concurrently,
//! verifies each digest, and rebuilds the destination stream in strict index
//! order.
//!
//! Two **strong hypotheses** shape the design:
//! - nodes are placement labels only, never endpoints: retrieval is keyed by
//!   `(base key, index)` alone, so swapping the node list between a
//!   distribute and a later reconstruct changes bookkeeping and logs, never
//!   which bytes are fetched;
//! - a `put` is immediately visible to a subsequent `get` — the reference
//!   media are a local filesystem and process memory, so there is no
//!   eventual-consistency window to design around.
//!
//! The write path is strictly sequential; the read path overlaps store
//! latency with a bounded window of in-flight fetches feeding a reorder
//! buffer, and a single coordinating loop is the only writer of the
//! destination. The first missing index ends a sequence: this is the
//! documented truncation contract, not an error, and callers needing
//! completeness should compare the returned block count with their own
//! expectations. Checksum failures abort by default; skipping corrupt blocks
//! is an explicit opt-in ([`IntegrityPolicy::SkipCorrupt`]).
//!
//! # Example
//! ```
//! # tokio_test::block_on(async {
//! use striper::{Config, MemoryStore, Pipeline};
//!
//! let config = Config {
//!     block_size: 8,
//!     ..Config::default()
//! };
//! let pipeline = Pipeline::new(MemoryStore::new(), config).unwrap();
//!
//! let blocks = pipeline.distribute(&b"stream of bytes"[..], "demo").await.unwrap();
//! assert_eq!(blocks, 2);
//!
//! let mut out = Vec::new();
//! pipeline.reconstruct("demo", &mut out).await.unwrap();
//! assert_eq!(out, b"stream of bytes");
//! # })
//! ```

pub mod checksum;
pub mod chunk;
mod config;
mod distribute;
mod error;
pub mod placement;
pub mod store;

mod reassemble;

pub use config::{Config, IntegrityPolicy, BLOCK_SIZE_ENV, DEFAULT_BLOCK_SIZE, DEFAULT_FLUSH_FACTOR};
pub use distribute::Distributor;
pub use error::Error;
pub use placement::{Node, NodeSet};
pub use reassemble::Reassembler;
pub use store::{ChunkStore, FsStore, MemoryStore, StoreError};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

/// The two-entry-point facade over a validated configuration and a store.
///
/// Owns its store and configuration outright; nothing in the crate reads
/// ambient process state apart from the optional block-size environment
/// override applied in [`Config::from_env`].
#[derive(Debug)]
pub struct Pipeline<S> {
    store: S,
    config: Config,
    nodes: NodeSet,
}

impl<S: ChunkStore> Pipeline<S> {
    /// Validate `config` and build a pipeline over `store`.
    ///
    /// Fails with [`Error::Config`] before any operation can start if the
    /// node list is empty or any size/window tunable is zero.
    pub fn new(store: S, config: Config) -> Result<Self, Error> {
        config.validate()?;
        let nodes = NodeSet::new(config.nodes.clone())
            .ok_or(Error::Config("node list must not be empty"))?;
        Ok(Self { store, config, nodes })
    }

    /// The store this pipeline persists to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The validated configuration in effect.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Slice `source` into blocks and persist them under `base`.
    ///
    /// Returns the number of blocks persisted. See [`Distributor::run`].
    pub async fn distribute<R>(&self, source: R, base: &str) -> Result<u64, Error>
    where
        R: AsyncRead + Unpin,
    {
        self.distribute_with_cancel(source, base, &CancellationToken::new())
            .await
    }

    /// [`Pipeline::distribute`] with cooperative cancellation.
    pub async fn distribute_with_cancel<R>(
        &self,
        source: R,
        base: &str,
        cancel: &CancellationToken,
    ) -> Result<u64, Error>
    where
        R: AsyncRead + Unpin,
    {
        Distributor::new(&self.store, &self.config, &self.nodes)
            .run(source, base, cancel)
            .await
    }

    /// Rebuild the stream stored under `base` into `dest`.
    ///
    /// Returns the number of blocks written. See [`Reassembler::run`].
    pub async fn reconstruct<W>(&self, base: &str, dest: &mut W) -> Result<u64, Error>
    where
        W: AsyncWrite + Unpin,
    {
        self.reconstruct_with_cancel(base, dest, &CancellationToken::new())
            .await
    }

    /// [`Pipeline::reconstruct`] with cooperative cancellation.
    pub async fn reconstruct_with_cancel<W>(
        &self,
        base: &str,
        dest: &mut W,
        cancel: &CancellationToken,
    ) -> Result<u64, Error>
    where
        W: AsyncWrite + Unpin,
    {
        Reassembler::new(&self.store, &self.config, &self.nodes)
            .run(base, dest, cancel)
            .await
    }

    /// Remove the records stored under `base`, in index order, until the
    /// first gap. Returns the number of records removed.
    pub async fn purge(&self, base: &str) -> Result<u64, Error> {
        let mut index = 0u64;
        loop {
            let removed = self
                .store
                .delete(base, index)
                .await
                .map_err(|source| Error::Store { index, source })?;
            if !removed {
                return Ok(index);
            }
            index += 1;
        }
    }
}
