//! SHA-256 helpers over canonical JSON bytes.
//!
//! Deterministic: same canonical structure ⇒ same lowercase 64-hex digest
//! across OS/arch, independent of `HashMap` iteration order.

use crate::canonical_json::to_canonical_json_bytes;
use crate::IoError;
use sha2::{Digest, Sha256};

/// Lowercase 64-hex SHA-256 of raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 of a value's canonical JSON representation.
pub fn sha256_canonical<T: serde::Serialize>(value: &T) -> Result<String, IoError> {
    let json = serde_json::to_value(value).map_err(|e| IoError::Json { pointer: String::new(), msg: e.to_string() })?;
    Ok(sha256_hex(&to_canonical_json_bytes(&json)))
}

/// True iff `s` is lowercase 64-hex.
pub fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_is_stable_and_well_shaped() {
        let h = sha256_hex(b"hello");
        assert!(is_hex64(&h));
        assert_eq!(h, sha256_hex(b"hello"));
    }

    #[test]
    fn canonical_hash_ignores_key_order() {
        let a = serde_json::json!({"a": 1, "b": 2});
        let b = serde_json::json!({"b": 2, "a": 1});
        assert_eq!(sha256_canonical(&a).unwrap(), sha256_canonical(&b).unwrap());
    }
}
