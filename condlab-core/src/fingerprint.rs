//! Tree fingerprinting: a stable content hash of a normalized tree.
//!
//! The tree is normalized, converted to a `serde_json::Value` (object keys
//! sorted) and hashed with BLAKE3. Two trees that normalize to the same
//! value share a fingerprint regardless of the key order they were stored in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algebra::normalize;
use crate::model::IndicatorConditions;

/// BLAKE3 hex digest of a normalized tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeFingerprint(pub String);

impl TreeFingerprint {
    /// First `n` hex characters, for compact display.
    pub fn short(&self, n: usize) -> &str {
        &self.0[..n.min(self.0.len())]
    }
}

impl fmt::Display for TreeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical JSON text of the normalized tree.
pub fn canonical_json(conditions: &IndicatorConditions) -> String {
    let normalized = normalize(conditions);
    // Value's map is ordered, so keys come out sorted
    serde_json::to_value(&normalized)
        .map(|value| value.to_string())
        .unwrap_or_default()
}

pub fn tree_fingerprint(conditions: &IndicatorConditions) -> TreeFingerprint {
    let hash = blake3::hash(canonical_json(conditions).as_bytes());
    TreeFingerprint(hash.to_hex().to_string())
}
