//! Block integrity digests.
//!
//! Every persisted block carries a fixed-size BLAKE3 digest of its payload.
//! Computing and comparing digests is all this module does; what to do about
//! a mismatch is a policy decision left to the read path.

/// Length in bytes of a block digest.
pub const DIGEST_LEN: usize = blake3::OUT_LEN;

/// A fixed-size integrity digest over a block payload.
pub type Digest = [u8; DIGEST_LEN];

/// Compute the digest of a payload.
///
/// Deterministic: identical payloads always produce identical digests.
#[inline]
pub fn compute(payload: &[u8]) -> Digest {
    *blake3::hash(payload).as_bytes()
}

/// Recompute the payload digest and compare it to an expected one.
///
/// The comparison goes through [`blake3::Hash`] equality, which does not
/// short-circuit on the first differing byte. Integrity is the concern here,
/// not secrecy; a mismatch is an ordinary boolean outcome.
#[inline]
pub fn verify(payload: &[u8], expected: &Digest) -> bool {
    blake3::hash(payload) == blake3::Hash::from_bytes(*expected)
}

/// Render the leading bytes of a digest for log output.
pub(crate) fn short_hex(digest: &Digest) -> String {
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_is_deterministic() {
        let a = compute(b"some block payload");
        let b = compute(b"some block payload");
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_payloads_distinct_digests() {
        assert_ne!(compute(b"payload one"), compute(b"payload two"));
    }

    #[test]
    fn test_verify_accepts_matching_digest() {
        let payload = b"verify me";
        let digest = compute(payload);
        assert!(verify(payload, &digest));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let digest = compute(b"original payload");
        assert!(!verify(b"original paylOad", &digest));
    }

    #[test]
    fn test_empty_payload_has_a_digest() {
        let digest = compute(b"");
        assert!(verify(b"", &digest));
    }

    #[test]
    fn test_short_hex_is_16_chars() {
        assert_eq!(short_hex(&compute(b"x")).len(), 16);
    }
}
