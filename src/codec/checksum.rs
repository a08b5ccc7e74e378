//! Record fingerprints
//!
//! A fingerprint is the CRC32 (IEEE polynomial) of a record's serialized
//! element, rendered as eight lowercase hex digits. It is an opaque tag:
//! nothing verifies it on read and it is not used for deduplication.

use crc32fast::Hasher;

/// Computes the CRC32 of `data`.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Fingerprint of a serialized element as stored in a record's `hash` field.
pub fn fingerprint(serialized: &str) -> String {
    format!("{:08x}", compute_checksum(serialized.as_bytes()))
}
