//! Content hashing for sealed thoughts

use sha2::{Digest, Sha256};

/// Compute SHA256 hash of data as lowercase hex
pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Seal hash of a thought: SHA256 over the raw UTF-8 bytes, untrimmed
pub fn seal_hash(content: &str) -> String {
    compute_sha256(content.as_bytes())
}
