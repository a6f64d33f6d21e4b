//! Content hashing for cache keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Compute SHA256 hash of a serializable value.
///
/// The value is serialized to JSON before hashing, ensuring deterministic output.
/// Returns a 64-character lowercase hexadecimal string.
pub fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Key of a coordinate tuple: element names in cube order, case-folded.
pub fn coordinate_key(names: &[&str]) -> Result<String, serde_json::Error> {
    let folded: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    compute_hash(&folded)
}
