//! Read path: concurrent record fetch with strictly ordered output.
//!
//! One coordinating loop owns the whole operation. It keeps a bounded window
//! of in-flight `get` futures, parks out-of-order completions in an
//! index-addressable reorder buffer, and is itself the only writer of the
//! destination: payloads leave the buffer strictly in index order, no matter
//! in which order fetches complete.
//!
//! The first `NotFound` observed for an index ends the sequence. The loop
//! stops issuing new fetches, keeps draining results for earlier indices,
//! and finishes once everything below the gap has been written. Results for
//! indices beyond the gap are discarded. A missing record in the middle of
//! an otherwise complete sequence therefore truncates the output at that
//! point; callers that require completeness must check the returned block
//! count against their own expectations.

use std::collections::BTreeMap;

use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::chunk::open_record;
use crate::config::{Config, IntegrityPolicy};
use crate::error::Error;
use crate::placement::NodeSet;
use crate::store::ChunkStore;

/// Concurrent, order-preserving reconstruction over a [`ChunkStore`].
pub struct Reassembler<'a, S> {
    store: &'a S,
    config: &'a Config,
    nodes: &'a NodeSet,
}

impl<'a, S: ChunkStore> Reassembler<'a, S> {
    pub(crate) fn new(store: &'a S, config: &'a Config, nodes: &'a NodeSet) -> Self {
        Self { store, config, nodes }
    }

    /// Rebuild the stream stored under `base` into `dest`.
    ///
    /// Returns the number of blocks written. A missing record at index 0
    /// yields an empty destination and `Ok(0)`.
    ///
    /// Fetches run concurrently up to the configured window, but destination
    /// bytes appear in strictly increasing index order. Verification happens
    /// as each record is released to the writer, so under the default strict
    /// policy the reported index is always the first corrupt one.
    ///
    /// Cancellation is cooperative: in-flight fetches are plain futures
    /// inside this task, so dropping the window on cancel both stops new
    /// work and abandons pending fetches without leaking anything.
    pub async fn run<W>(
        &self,
        base: &str,
        dest: &mut W,
        cancel: &CancellationToken,
    ) -> Result<u64, Error>
    where
        W: AsyncWrite + Unpin,
    {
        let mut in_flight = FuturesUnordered::new();
        let mut ready: BTreeMap<u64, Bytes> = BTreeMap::new();
        let mut next_fetch: u64 = 0;
        let mut next_release: u64 = 0;
        let mut written: u64 = 0;
        // First index confirmed absent; nothing at or beyond it is released.
        let mut end: Option<u64> = None;

        loop {
            while end.is_none() && in_flight.len() < self.config.fetch_window {
                let store = self.store;
                let index = next_fetch;
                trace!(
                    base,
                    index,
                    node = %self.nodes.assign(index),
                    "fetching record"
                );
                in_flight.push(async move { (index, store.get(base, index).await) });
                next_fetch += 1;
            }

            while let Some(record) = ready.remove(&next_release) {
                match open_record(record) {
                    Ok(payload) => {
                        dest.write_all(&payload).await.map_err(|source| Error::DestWrite {
                            index: next_release,
                            source,
                        })?;
                        written += 1;
                    }
                    Err(source) => match self.config.integrity {
                        IntegrityPolicy::Strict => {
                            return Err(Error::Integrity { index: next_release, source });
                        }
                        IntegrityPolicy::SkipCorrupt => {
                            warn!(base, index = next_release, %source, "skipping corrupt block");
                        }
                    },
                }
                next_release += 1;
            }

            if let Some(gap) = end {
                if next_release >= gap {
                    break;
                }
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Err(Error::Canceled { index: next_release });
                }
                completed = in_flight.next() => match completed {
                    Some((index, Ok(Some(record)))) => {
                        ready.insert(index, record);
                    }
                    Some((index, Ok(None))) => {
                        debug!(base, index, "no record, end of sequence");
                        end = Some(end.map_or(index, |gap| gap.min(index)));
                        // Anything already fetched past the gap is dead weight.
                        ready.split_off(&index);
                    }
                    Some((index, Err(source))) => {
                        return Err(Error::Store { index, source });
                    }
                    None => break,
                },
            }
        }

        dest.flush()
            .await
            .map_err(|source| Error::DestWrite { index: next_release, source })?;

        debug!(base, blocks = written, "reconstruct complete");
        Ok(written)
    }
}
