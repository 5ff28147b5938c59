//! Crate-level error taxonomy.

use crate::chunk::IntegrityError;
use crate::store::StoreError;

/// Failure of a distribute, reconstruct or purge operation.
///
/// Operational variants name the block index being processed when the failure
/// occurred, so callers can tell configuration mistakes from stream I/O, store
/// access and integrity violations without parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration is invalid; the operation never started.
    #[error("invalid configuration: {0}")]
    Config(&'static str),

    /// Reading from the source stream failed.
    #[error("source read failed at block {index}: {source}")]
    SourceRead {
        /// Index of the block being accumulated.
        index: u64,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing to the destination stream failed.
    #[error("destination write failed at block {index}: {source}")]
    DestWrite {
        /// Index of the block being written.
        index: u64,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The chunk store failed on access.
    #[error("store access failed at block {index}: {source}")]
    Store {
        /// Index of the block being stored or fetched.
        index: u64,
        /// Underlying store error.
        source: StoreError,
    },

    /// A retrieved record failed integrity verification.
    #[error("integrity check failed at block {index}: {source}")]
    Integrity {
        /// Index of the offending block.
        index: u64,
        /// What was wrong with the record.
        source: IntegrityError,
    },

    /// The operation was canceled cooperatively.
    #[error("operation canceled at block {index}")]
    Canceled {
        /// Next index that would have been processed.
        index: u64,
    },
}

impl Error {
    /// The block index responsible for an operational failure, if any.
    pub fn index(&self) -> Option<u64> {
        match self {
            Error::Config(_) => None,
            Error::SourceRead { index, .. }
            | Error::DestWrite { index, .. }
            | Error::Store { index, .. }
            | Error::Integrity { index, .. }
            | Error::Canceled { index } => Some(*index),
        }
    }
}
