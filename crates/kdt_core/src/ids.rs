//! `StableId` — the per-user/per-entity identity bucketing is keyed on.

use crate::errors::CoreError;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const MAX_LEN: usize = 256;

fn is_ascii_no_nul(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_LEN && s.bytes().all(|b| b != 0 && b < 0x80)
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.len() % 2 == 0 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Identity a targeting/bucketing decision is keyed on.
///
/// Two constructors exist because a `StableId` can come from either a
/// hex-normalized identity (`of`, e.g. a hashed user id) or an opaque token
/// identity (`of_opaque`, e.g. a device id or session token) — both are
/// valid `StableId`s, they just carry different shape guarantees.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StableId(String);

impl StableId {
    /// Construct from a non-empty, even-length hex identity. Case is folded
    /// to lowercase so `"AB12"` and `"ab12"` produce the same `StableId`.
    pub fn of(hex_id: &str) -> Result<Self, CoreError> {
        if is_hex(hex_id) {
            Ok(StableId(hex_id.to_lowercase()))
        } else {
            Err(CoreError::InvalidStableId)
        }
    }

    /// Construct from any non-empty ASCII token (no hex-shape requirement).
    pub fn of_opaque(token: &str) -> Result<Self, CoreError> {
        if is_ascii_no_nul(token) {
            Ok(StableId(token.to_string()))
        } else {
            Err(CoreError::InvalidStableId)
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StableId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StableId::of_opaque(s)
    }
}

impl TryFrom<&str> for StableId {
    type Error = CoreError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}
