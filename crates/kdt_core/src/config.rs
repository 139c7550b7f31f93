//! `Configuration` — the whole-namespace snapshot the registry swaps atomically.

use crate::errors::CoreError;
use crate::flag::FlagDefinition;
use std::collections::{BTreeMap, BTreeSet};

/// The closed set of concretely-typed values a feature can resolve to. A
/// single enum (rather than one `Configuration` per `T`) is what lets
/// `Configuration` hold a heterogeneous map of differently-typed features
/// behind one concrete type, the same way the wire format's `type` tag
/// picks a shape.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureValue {
    Bool(bool),
    Str(String),
    Int(i64),
    Double(f64),
    Enum(String),
    Object(serde_json::Value),
}

impl FeatureValue {
    pub const fn type_name(&self) -> &'static str {
        match self {
            FeatureValue::Bool(_) => "bool",
            FeatureValue::Str(_) => "string",
            FeatureValue::Int(_) => "int",
            FeatureValue::Double(_) => "double",
            FeatureValue::Enum(_) => "enum",
            FeatureValue::Object(_) => "object",
        }
    }
}

impl TryFrom<&FeatureValue> for bool {
    type Error = CoreError;
    fn try_from(v: &FeatureValue) -> Result<Self, Self::Error> {
        match v {
            FeatureValue::Bool(b) => Ok(*b),
            _ => Err(CoreError::EmptyFeatureId),
        }
    }
}

impl TryFrom<&FeatureValue> for String {
    type Error = CoreError;
    fn try_from(v: &FeatureValue) -> Result<Self, Self::Error> {
        match v {
            FeatureValue::Str(s) | FeatureValue::Enum(s) => Ok(s.clone()),
            _ => Err(CoreError::EmptyFeatureId),
        }
    }
}

impl TryFrom<&FeatureValue> for i64 {
    type Error = CoreError;
    fn try_from(v: &FeatureValue) -> Result<Self, Self::Error> {
        match v {
            FeatureValue::Int(i) => Ok(*i),
            _ => Err(CoreError::EmptyFeatureId),
        }
    }
}

impl TryFrom<&FeatureValue> for f64 {
    type Error = CoreError;
    fn try_from(v: &FeatureValue) -> Result<Self, Self::Error> {
        match v {
            FeatureValue::Double(d) => Ok(*d),
            _ => Err(CoreError::EmptyFeatureId),
        }
    }
}

/// Free-form namespace-level metadata carried alongside a [`Configuration`]'s
/// features — e.g. a snapshot version tag or generation timestamp. Entries
/// are opaque JSON values; `Configuration` itself never inspects them.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ConfigurationMetadata {
    entries: BTreeMap<String, serde_json::Value>,
}

impl ConfigurationMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<String, serde_json::Value>) -> Self {
        ConfigurationMetadata { entries }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The full set of live feature definitions for one namespace. The
/// registry publishes `Arc<Configuration>` snapshots; this type itself
/// carries no synchronization — that lives in `kdt_registry`.
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    features: BTreeMap<String, FlagDefinition<FeatureValue>>,
    metadata: Option<ConfigurationMetadata>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_features(features: BTreeMap<String, FlagDefinition<FeatureValue>>) -> Self {
        Configuration { features, metadata: None }
    }

    pub fn with_metadata(mut self, metadata: ConfigurationMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn metadata(&self) -> Option<&ConfigurationMetadata> {
        self.metadata.as_ref()
    }

    pub fn get(&self, feature_id: &str) -> Option<&FlagDefinition<FeatureValue>> {
        self.features.get(feature_id)
    }

    pub fn contains(&self, feature_id: &str) -> bool {
        self.features.contains_key(feature_id)
    }

    pub fn feature_ids(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Apply a patch, producing a new `Configuration`: the
    /// base map plus `patch.add`, minus `patch.remove`. Additions win over
    /// an existing key of the same name; removal wins over an addition of
    /// the same key within the same patch (an open question: left-then-
    /// right insertion order — `add` is applied, then `remove` is applied).
    pub fn apply_patch(&self, patch: &ConfigurationPatch) -> Configuration {
        let mut features = self.features.clone();
        for (id, def) in &patch.add {
            features.insert(id.clone(), def.clone());
        }
        for id in &patch.remove {
            features.remove(id);
        }
        Configuration { features, metadata: self.metadata.clone() }
    }
}

/// An incremental change to a [`Configuration`]. `add` entries are
/// inserted (overwriting any existing definition of the same id) before
/// `remove` entries are dropped, so a key present in both keeps the patch's
/// "remove wins" semantics.
#[derive(Clone, Debug, Default)]
pub struct ConfigurationPatch {
    pub add: BTreeMap<String, FlagDefinition<FeatureValue>>,
    pub remove: BTreeSet<String>,
}

impl ConfigurationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adding(mut self, def: FlagDefinition<FeatureValue>) -> Self {
        self.add.insert(def.feature_id.clone(), def);
        self
    }

    pub fn removing(mut self, feature_id: impl Into<String>) -> Self {
        self.remove.insert(feature_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(id: &str, default: bool) -> FlagDefinition<FeatureValue> {
        FlagDefinition::new(id, FeatureValue::Bool(default))
    }

    #[test]
    fn apply_patch_adds_and_removes() {
        let base = Configuration::from_features(BTreeMap::from([
            ("a".to_string(), flag("a", true)),
            ("b".to_string(), flag("b", false)),
        ]));
        let patch = ConfigurationPatch::new().adding(flag("c", true)).removing("b");
        let next = base.apply_patch(&patch);

        assert!(next.contains("a"));
        assert!(next.contains("c"));
        assert!(!next.contains("b"));
    }

    #[test]
    fn remove_wins_over_add_of_the_same_key_in_one_patch() {
        let base = Configuration::new();
        let patch = ConfigurationPatch::new().adding(flag("x", true)).removing("x");
        let next = base.apply_patch(&patch);
        assert!(!next.contains("x"));
    }

    #[test]
    fn typed_accessors_reject_mismatched_variants() {
        let v = FeatureValue::Int(1);
        assert!(bool::try_from(&v).is_err());
        assert_eq!(i64::try_from(&v).unwrap(), 1);
    }

    #[test]
    fn metadata_survives_apply_patch() {
        let base = Configuration::new().with_metadata(ConfigurationMetadata::new().with_entry("version", serde_json::json!(3)));
        let patch = ConfigurationPatch::new().adding(flag("a", true));
        let next = base.apply_patch(&patch);
        assert_eq!(next.metadata().and_then(|m| m.get("version")), Some(&serde_json::json!(3)));
    }
}
