//! Semantic `Version` and inclusive `VersionRange` used by version-targeting.

use crate::errors::CoreError;
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A `major.minor.patch` application version, compared lexicographically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version { major, minor, patch }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = CoreError;
    /// Missing trailing components default to `0`: `"1.2"` parses the same
    /// as `"1.2.0"`, and `"1"` the same as `"1.0.0"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let major = parts.next().and_then(|p| p.parse().ok());
        let minor = match parts.next() {
            Some(p) => p.parse().ok(),
            None => Some(0),
        };
        let patch = match parts.next() {
            Some(p) => p.parse().ok(),
            None => Some(0),
        };
        if parts.next().is_some() {
            return Err(CoreError::InvalidVersion);
        }
        match (major, minor, patch) {
            (Some(major), Some(minor), Some(patch)) => Ok(Version { major, minor, patch }),
            _ => Err(CoreError::InvalidVersion),
        }
    }
}

/// An inclusive `[min, max]` version interval; either bound may be absent,
/// meaning unbounded on that side (`VersionRange`).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VersionRange {
    pub min_inclusive: Option<Version>,
    pub max_inclusive: Option<Version>,
}

impl VersionRange {
    pub fn contains(&self, v: Version) -> bool {
        let above_min = match self.min_inclusive {
            Some(min) => v >= min,
            None => true,
        };
        let below_max = match self.max_inclusive {
            Some(max) => v <= max,
            None => true,
        };
        above_min && below_max
    }

    /// Specificity used by targeting precedence: a range with
    /// both bounds is more specific than one bound, which is more specific
    /// than unbounded.
    pub fn bound_count(&self) -> u8 {
        self.min_inclusive.is_some() as u8 + self.max_inclusive.is_some() as u8
    }
}

impl PartialOrd for VersionRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.bound_count().cmp(&other.bound_count()))
    }
}
