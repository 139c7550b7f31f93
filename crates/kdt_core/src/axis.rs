//! `AxisValue` — a caller-defined targeting dimension beyond locale/platform/version.

use crate::errors::CoreError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One opaque, caller-named targeting axis. `axis_id` is validated
/// (non-empty ASCII); `value` is an arbitrary JSON scalar supplied by
/// whichever extension predicate reads it.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisValue {
    pub axis_id: String,
    pub value: serde_json::Value,
}

impl AxisValue {
    pub fn new(axis_id: &str, value: serde_json::Value) -> Result<Self, CoreError> {
        if axis_id.is_empty() || !axis_id.is_ascii() {
            return Err(CoreError::InvalidAxisId);
        }
        Ok(AxisValue { axis_id: axis_id.to_string(), value })
    }
}
