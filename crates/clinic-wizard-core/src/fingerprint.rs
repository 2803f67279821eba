//! Content fingerprints for drafts.
//!
//! Used to tell whether a wizard's draft changed since it was opened, so a
//! front-end can ask "discard changes?" before closing.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a value's JSON form.
///
/// Struct fields serialize in declaration order, so equal drafts always
/// produce equal fingerprints.
pub fn fingerprint<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    Ok(hash_bytes(&bytes))
}

/// Hex-encoded SHA-256 of raw bytes.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
