//! Write path: slice a source stream into blocks and persist them.
//!
//! The distributor is strictly sequential. Blocks are created, checksummed
//! and persisted in increasing index order because placement and persistence
//! are defined per index; concurrency lives entirely on the read path.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::checksum;
use crate::chunk::Block;
use crate::config::Config;
use crate::error::Error;
use crate::placement::NodeSet;
use crate::store::ChunkStore;

/// Sequential chunking pipeline over a [`ChunkStore`].
///
/// Reads the source in bounded increments into an accumulation buffer,
/// flushes full blocks whenever the buffer crosses the configured threshold,
/// and flushes the short remainder only once the source is exhausted. Any
/// buffering strategy would do; block boundaries depend on the block size
/// alone, never on how reads happened to arrive.
pub struct Distributor<'a, S> {
    store: &'a S,
    config: &'a Config,
    nodes: &'a NodeSet,
}

impl<'a, S: ChunkStore> Distributor<'a, S> {
    pub(crate) fn new(store: &'a S, config: &'a Config, nodes: &'a NodeSet) -> Self {
        Self { store, config, nodes }
    }

    /// Consume `source` and persist its blocks under `base`.
    ///
    /// Returns the number of blocks persisted; an empty source persists none
    /// and succeeds. On error, already-persisted blocks are left in place so
    /// a later run can resume by index. Re-running with the same base key
    /// overwrites existing indices.
    pub async fn run<R>(
        &self,
        mut source: R,
        base: &str,
        cancel: &CancellationToken,
    ) -> Result<u64, Error>
    where
        R: AsyncRead + Unpin,
    {
        let block_size = self.config.block_size;
        let threshold = self.config.flush_threshold();

        let mut acc = BytesMut::with_capacity(block_size);
        let mut next_index = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Canceled { index: next_index });
            }

            acc.reserve(block_size);
            let n = source
                .read_buf(&mut acc)
                .await
                .map_err(|source| Error::SourceRead { index: next_index, source })?;
            let exhausted = n == 0;

            if acc.len() >= threshold || exhausted {
                next_index = self.flush(&mut acc, base, next_index, exhausted).await?;
            }
            if exhausted {
                break;
            }
        }

        debug!(base, blocks = next_index, "distribute complete");
        Ok(next_index)
    }

    /// Re-slice the accumulation buffer into blocks and persist them.
    ///
    /// Keeps any sub-block remainder in the buffer unless the source is
    /// exhausted; only the final block of a stream may be short.
    async fn flush(
        &self,
        acc: &mut BytesMut,
        base: &str,
        mut index: u64,
        exhausted: bool,
    ) -> Result<u64, Error> {
        while acc.len() >= self.config.block_size {
            let payload = acc.split_to(self.config.block_size).freeze();
            self.persist(base, Block::new(index, payload)).await?;
            index += 1;
        }

        if exhausted && !acc.is_empty() {
            let payload = acc.split().freeze();
            self.persist(base, Block::new(index, payload)).await?;
            index += 1;
        }

        Ok(index)
    }

    async fn persist(&self, base: &str, block: Block) -> Result<(), Error> {
        let index = block.index;
        let size = block.payload.len();
        let (digest, record) = block.seal();
        let node = self.nodes.assign(index);

        debug!(
            base,
            index,
            size,
            node = %node,
            digest = %checksum::short_hex(&digest),
            "storing block"
        );

        self.store
            .put(base, index, record)
            .await
            .map_err(|source| Error::Store { index, source })
    }
}
