//! Content hashing of the world state for the per-tick audit log.

use contracts::WorldState;
use sha2::{Digest, Sha256};

/// Hex SHA-256 of the canonical JSON serialization of the state. Struct field
/// order and `BTreeMap` key order make the serialization deterministic.
pub fn content_hash(state: &WorldState) -> String {
    let serialized = serde_json::to_vec(state).unwrap_or_default();
    let digest = Sha256::digest(&serialized);
    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
