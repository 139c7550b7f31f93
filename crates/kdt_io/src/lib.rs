//! Parse boundary: canonical JSON, the wire format, and the
//! `decode`/`apply_patch`/`encode` functions that turn wire JSON into
//! [`kdt_core::config::Configuration`] and back.
//!
//! Semantic decode errors (unknown feature, type mismatch, malformed JSON)
//! use `kdt_core::errors::ParseError` directly — it already carries the
//! right taxonomy and is shared with `kdt_registry`'s deferred-value
//! resolution, so there is no separate decode error type here. [`IoError`]
//! is reserved for the filesystem/hashing boundary: reading or atomically
//! writing a snapshot file.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod canonical_json;
pub mod hasher;
pub mod schema;
pub mod wire;

/// Errors from the filesystem/hashing boundary, as distinct from the
/// JSON-content errors in `kdt_core::errors::ParseError`.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("io/path error: {0}")]
    Path(String),

    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    #[error("hash error: {0}")]
    Hash(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

/// Read a file and hash it, failing loudly rather than returning an empty
/// digest if hashing were ever unavailable.
pub fn try_sha256_hex(bytes: &[u8]) -> Result<String, IoError> {
    Ok(hasher::sha256_hex(bytes))
}

/// Returns true if `s` looks like a URL (any `<scheme>://`). Used to reject
/// URL-shaped strings at the offline parse boundary (closed-world
/// posture: snapshots never trigger network fetches).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    s.trim().contains("://")
}

pub mod prelude {
    pub use crate::canonical_json;
    pub use crate::hasher;
    pub use crate::schema;
    pub use crate::wire;

    pub use crate::canonical_json::to_canonical_json_bytes;
    pub use crate::hasher::sha256_hex;
    pub use crate::schema::{FeatureSchema, FeatureSchemaBuilder, FeatureType};
    pub use crate::wire::{decode, encode, patch_from_wire, SnapshotLoadOptions};
    pub use crate::{looks_like_url_strict, try_sha256_hex, IoError, IoResult};
}
