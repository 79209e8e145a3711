//! Content hashing for exported history.
//!
//! Each exported version carries a SHA256 of its serialized JSON, so a
//! consumer can tell whether a row changed between two exports without
//! comparing every field.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Compute a SHA256 hash of a serializable value.
///
/// The value is serialized to JSON first; struct fields serialize in
/// declaration order, so the hash is deterministic.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn content_hash<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Check if content has changed since a previous export.
///
/// Returns `true` if there is no stored hash or it differs.
#[must_use]
pub fn has_changed(current_hash: &str, stored_hash: Option<&str>) -> bool {
    stored_hash.is_none_or(|h| h != current_hash)
}
