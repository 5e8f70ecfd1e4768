//! Content digests for sequence deduplication

use sha2::{Digest, Sha256};

/// SHA-256 of an in-memory buffer, lowercase hex
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}
