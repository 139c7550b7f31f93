//! Deterministic SHA-256 bucketing.
//!
//! `bucket_for` is a pure function: each call constructs its own `Sha256`
//! hasher, so there is no shared digest state across threads or calls
//! ("no global mutable state" falls out of this for free).

use crate::rampup::BUCKET_SPACE;
use sha2::{Digest, Sha256};

/// `bucket = u32_be(sha256(salt ++ ":" ++ feature_id ++ ":" ++ stable_id)[0..4]) mod 10_000`
pub fn bucket_for(salt: &str, feature_id: &str, stable_id: &str) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(feature_id.as_bytes());
    hasher.update(b":");
    hasher.update(stable_id.as_bytes());
    let digest = hasher.finalize();
    let mut first4 = [0u8; 4];
    first4.copy_from_slice(&digest[0..4]);
    u32::from_be_bytes(first4) % BUCKET_SPACE
}
