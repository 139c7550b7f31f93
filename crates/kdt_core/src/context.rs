//! `Context` — the evaluation-time capabilities supplied by the caller.

use crate::axis::AxisValue;
use crate::ids::StableId;
use crate::locale::AppLocale;
use crate::platform::Platform;
use crate::version::Version;
use std::collections::BTreeMap;

/// What the caller knows about the entity being evaluated. Every field is
/// optional: targeting that needs a capability the context doesn't declare
/// treats the rule as non-matching rather than erroring.
#[derive(Clone, Debug, Default)]
pub struct Context {
    pub stable_id: Option<StableId>,
    pub locale: Option<AppLocale>,
    pub platform: Option<Platform>,
    pub app_version: Option<Version>,
    axis_values: BTreeMap<String, serde_json::Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stable_id(mut self, id: StableId) -> Self {
        self.stable_id = Some(id);
        self
    }

    pub fn with_locale(mut self, locale: AppLocale) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_app_version(mut self, version: Version) -> Self {
        self.app_version = Some(version);
        self
    }

    pub fn with_axis(mut self, axis: AxisValue) -> Self {
        self.axis_values.insert(axis.axis_id, axis.value);
        self
    }

    /// Read an axis value by id, if the caller declared it.
    pub fn axis(&self, axis_id: &str) -> Option<&serde_json::Value> {
        self.axis_values.get(axis_id)
    }

    pub fn has_axis(&self, axis_id: &str) -> bool {
        self.axis_values.contains_key(axis_id)
    }

    /// A deterministic, human-debuggable fingerprint of this context, used
    /// to identify a `ShadowMismatch` without echoing the full
    /// context back to the caller.
    pub fn fingerprint(&self) -> String {
        use std::fmt::Write as _;
        let mut out = String::new();
        let _ = write!(
            out,
            "stable_id={:?};locale={:?};platform={:?};app_version={:?}",
            self.stable_id.as_ref().map(StableId::as_str),
            self.locale.as_ref().map(AppLocale::as_str),
            self.platform,
            self.app_version,
        );
        for (axis_id, value) in &self.axis_values {
            let _ = write!(out, ";axis[{axis_id}]={value}");
        }
        out
    }
}
