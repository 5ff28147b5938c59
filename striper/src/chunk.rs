//! Block data model and record codec.
//!
//! A [`Block`] is one fixed-size (except possibly the last) slice of a source
//! stream, identified by its 0-based index. Its persisted form is a *record*:
//! the payload digest followed by the raw payload bytes. Records are keyed by
//! `(base key, index)` in whatever store holds them; the layout itself knows
//! nothing about keys.

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::{self, Digest, DIGEST_LEN};

/// One unit of a source stream, ready to be sealed into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// 0-based, contiguous position within the source stream.
    pub index: u64,
    /// Payload bytes; shorter than the configured block size only for the
    /// final block of a stream.
    pub payload: Bytes,
}

impl Block {
    /// Create a block from an index and payload.
    pub fn new(index: u64, payload: Bytes) -> Self {
        Self { index, payload }
    }

    /// Seal this block into its record form: `digest ++ payload`.
    pub fn seal(&self) -> (Digest, Bytes) {
        let digest = checksum::compute(&self.payload);
        let mut record = BytesMut::with_capacity(DIGEST_LEN + self.payload.len());
        record.put_slice(&digest);
        record.put_slice(&self.payload);
        (digest, record.freeze())
    }
}

/// Why a retrieved record failed integrity checking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    /// The record is shorter than the digest prefix, so it cannot even
    /// contain a payload.
    #[error("record of {len} bytes is shorter than the {DIGEST_LEN}-byte digest prefix")]
    Truncated {
        /// Total record length found.
        len: usize,
    },

    /// The payload digest does not match the stored digest prefix.
    #[error("digest mismatch: stored {}.., computed {}..", checksum::short_hex(stored), checksum::short_hex(computed))]
    Mismatch {
        /// Digest prefix read from the record.
        stored: Digest,
        /// Digest recomputed over the payload portion.
        computed: Digest,
    },
}

/// Split a record into digest and payload and verify the payload against it.
///
/// Returns the payload on success. A record shorter than the digest prefix is
/// malformed and reported the same way as a mismatch, through
/// [`IntegrityError`].
pub fn open_record(record: Bytes) -> Result<Bytes, IntegrityError> {
    if record.len() < DIGEST_LEN {
        return Err(IntegrityError::Truncated { len: record.len() });
    }

    let mut payload = record;
    let prefix = payload.split_to(DIGEST_LEN);
    let stored = Digest::try_from(prefix.as_ref()).expect("prefix length checked above");

    if !checksum::verify(&payload, &stored) {
        return Err(IntegrityError::Mismatch {
            stored,
            computed: checksum::compute(&payload),
        });
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let block = Block::new(0, Bytes::from_static(b"roundtrip payload"));
        let (_, record) = block.seal();

        let payload = open_record(record).unwrap();
        assert_eq!(payload, block.payload);
    }

    #[test]
    fn test_record_layout_is_digest_then_payload() {
        let block = Block::new(3, Bytes::from_static(b"layout"));
        let (digest, record) = block.seal();

        assert_eq!(record.len(), DIGEST_LEN + block.payload.len());
        assert_eq!(&record[..DIGEST_LEN], digest.as_slice());
        assert_eq!(&record[DIGEST_LEN..], block.payload.as_ref());
    }

    #[test]
    fn test_open_rejects_flipped_payload_byte() {
        let block = Block::new(0, Bytes::from_static(b"about to be corrupted"));
        let (_, record) = block.seal();

        let mut corrupted = record.to_vec();
        *corrupted.last_mut().unwrap() ^= 0x01;

        let err = open_record(Bytes::from(corrupted)).unwrap_err();
        assert!(matches!(err, IntegrityError::Mismatch { .. }));
    }

    #[test]
    fn test_open_rejects_short_record() {
        let record = Bytes::from_static(&[0u8; DIGEST_LEN - 1]);
        let err = open_record(record).unwrap_err();
        assert_eq!(err, IntegrityError::Truncated { len: DIGEST_LEN - 1 });
    }

    #[test]
    fn test_digest_only_record_is_an_empty_block() {
        // An empty payload still seals to a valid record of exactly one digest.
        let block = Block::new(0, Bytes::new());
        let (_, record) = block.seal();
        assert_eq!(record.len(), DIGEST_LEN);

        let payload = open_record(record).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_identical_payloads_seal_identically() {
        let (d1, r1) = Block::new(1, Bytes::from_static(b"same")).seal();
        let (d2, r2) = Block::new(9, Bytes::from_static(b"same")).seal();
        // The index is bookkeeping, not part of the record.
        assert_eq!(d1, d2);
        assert_eq!(r1, r2);
    }
}
