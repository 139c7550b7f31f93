//! `RampUp` — the fraction of the bucket space a rule admits.

use crate::errors::CoreError;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of discrete buckets the bucketing algorithm divides identities
/// into (`bucket = u32_be(digest[0..4]) mod 10_000`).
pub const BUCKET_SPACE: u32 = 10_000;

/// A rollout percentage in `[0.0, 100.0]`, resolved to two decimal digits of
/// bucket precision (one part in 10,000).
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct RampUp(f64);

impl RampUp {
    pub const FULL: RampUp = RampUp(100.0);
    pub const NONE: RampUp = RampUp(0.0);

    pub fn new(percent: f64) -> Result<Self, CoreError> {
        if percent.is_finite() && (0.0..=100.0).contains(&percent) {
            Ok(RampUp(percent))
        } else {
            Err(CoreError::InvalidRampUp)
        }
    }

    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// Threshold in the `[0, BUCKET_SPACE)` bucket space: a bucket is
    /// admitted when `bucket < threshold`.
    #[inline]
    pub fn bucket_threshold(&self) -> u32 {
        ((self.0 / 100.0) * BUCKET_SPACE as f64).floor() as u32
    }

    /// Whether a bucket index (as produced by [`crate::bucketing::bucket_for`])
    /// falls within this ramp-up's admitted fraction.
    #[inline]
    pub fn admits(&self, bucket: u32) -> bool {
        bucket < self.bucket_threshold()
    }
}

impl TryFrom<f64> for RampUp {
    type Error = CoreError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        RampUp::new(value)
    }
}

impl From<RampUp> for f64 {
    fn from(value: RampUp) -> Self {
        value.0
    }
}

impl fmt::Display for RampUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
